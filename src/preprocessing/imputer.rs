//! Missing value imputation strategies

use crate::error::{BackorderError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with the most frequent value; ties go to the smallest value
    MostFrequent,
    /// Replace with a constant value
    Constant(f64),
    /// Replace with a constant string (categorical)
    ConstantString(String),
}

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: HashMap<String, ImputeValue>,
    is_fitted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    String(String),
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| BackorderError::FeatureNotFound(col_name.to_string()))?
                .as_materialized_series();

            let fill_value = self.compute_fill_value(series)?;
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BackorderError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            let series = df
                .column(col_name)
                .map_err(|_| BackorderError::FeatureNotFound(col_name.clone()))?
                .as_materialized_series();
            let filled = Self::fill_series(series, fill_value)?;
            result.with_column(filled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted fill value for a column
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values.get(column)
    }

    fn is_numeric_dtype(dtype: &DataType) -> bool {
        dtype.is_primitive_numeric()
    }

    fn compute_mode_string(series: &Series) -> Option<String> {
        let cast = series.cast(&DataType::String).ok()?;
        let ca = cast.str().ok()?;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for val in ca.into_iter().flatten() {
            *counts.entry(val).or_insert(0) += 1;
        }
        // BTreeMap iterates in ascending key order, so the first maximum wins ties
        counts
            .into_iter()
            .fold(None, |best: Option<(&str, usize)>, (k, c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((k, c)),
            })
            .map(|(k, _)| k.to_string())
    }

    fn compute_mode_numeric(series: &Series) -> Result<Option<f64>> {
        let cast = series.cast(&DataType::Float64)?;
        let values = crate::utils::sorted_finite(cast.f64()?.into_iter());
        let mut best: Option<(f64, usize)> = None;
        let mut i = 0;
        while i < values.len() {
            let mut j = i;
            while j < values.len() && values[j] == values[i] {
                j += 1;
            }
            if best.map_or(true, |(_, c)| j - i > c) {
                best = Some((values[i], j - i));
            }
            i = j;
        }
        Ok(best.map(|(v, _)| v))
    }

    fn compute_fill_value(&self, series: &Series) -> Result<ImputeValue> {
        let empty = || BackorderError::EmptyInput(format!("column '{}' has no values", series.name()));
        match &self.strategy {
            ImputeStrategy::Mean => {
                let values = crate::utils::sorted_finite(series.cast(&DataType::Float64)?.f64()?.into_iter());
                if values.is_empty() {
                    return Err(empty());
                }
                Ok(ImputeValue::Numeric(values.iter().sum::<f64>() / values.len() as f64))
            }
            ImputeStrategy::Median => {
                let values = crate::utils::sorted_finite(series.cast(&DataType::Float64)?.f64()?.into_iter());
                let median = crate::utils::percentile(&values, 50.0).ok_or_else(empty)?;
                Ok(ImputeValue::Numeric(median))
            }
            ImputeStrategy::MostFrequent => {
                if Self::is_numeric_dtype(series.dtype()) {
                    let mode = Self::compute_mode_numeric(series)?.ok_or_else(empty)?;
                    Ok(ImputeValue::Numeric(mode))
                } else {
                    let mode = Self::compute_mode_string(series).ok_or_else(empty)?;
                    Ok(ImputeValue::String(mode))
                }
            }
            ImputeStrategy::Constant(val) => Ok(ImputeValue::Numeric(*val)),
            ImputeStrategy::ConstantString(val) => Ok(ImputeValue::String(val.clone())),
        }
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(val) => {
                let cast = series.cast(&DataType::Float64)?;
                let filled: Float64Chunked = cast
                    .f64()?
                    .into_iter()
                    .map(|opt| Some(opt.filter(|v| !v.is_nan()).unwrap_or(*val)))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(val) => {
                let cast = series.cast(&DataType::String)?;
                let filled: StringChunked = cast
                    .str()?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str()).to_string()))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputer_creation() {
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(!imputer.is_fitted);
    }

    #[test]
    fn test_median_imputation() {
        let df = DataFrame::new(vec![Column::new(
            "a".into(),
            &[Some(1.0), None, Some(3.0), Some(10.0)],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(3.0));
        assert_eq!(col.null_count(), 0);
    }

    #[test]
    fn test_median_skips_nan() {
        let df = DataFrame::new(vec![Column::new(
            "a".into(),
            &[Some(1.0), Some(f64::NAN), Some(2.0), None, Some(f64::NAN)],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(1.5));
        assert_eq!(col.get(3), Some(1.5));
        assert!(col.into_iter().all(|v| v.is_some_and(f64::is_finite)));
    }

    #[test]
    fn test_most_frequent_string_tie_breaks_alphabetically() {
        let df = DataFrame::new(vec![Column::new(
            "risk".into(),
            &[Some("Yes"), Some("No"), None, Some("Yes"), Some("No")],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df, &["risk"]).unwrap();
        assert_eq!(result.column("risk").unwrap().str().unwrap().get(2), Some("No"));
    }

    #[test]
    fn test_all_null_column_is_an_error() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[None::<f64>, None])]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        assert!(matches!(
            imputer.fit(&df, &["a"]),
            Err(BackorderError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[1.0])]).unwrap();
        let imputer = Imputer::new(ImputeStrategy::Mean);
        assert!(matches!(imputer.transform(&df), Err(BackorderError::ModelNotFitted)));
    }
}
