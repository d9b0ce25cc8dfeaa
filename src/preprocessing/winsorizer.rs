//! Quartile-based outlier clipping

use crate::error::{BackorderError, Result};
use crate::utils::{percentile, sorted_finite};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Clipping interval learned from one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinsorBounds {
    pub lower: f64,
    pub upper: f64,
}

impl WinsorBounds {
    /// Bounds for already sorted, finite data.
    ///
    /// `lower = max(Q1 - 1.5 * IQR, p0)`, `upper = min(Q3 + 1.5 * IQR, p100)`
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let p0 = percentile(sorted, 0.0)?;
        let p100 = percentile(sorted, 100.0)?;
        let q1 = percentile(sorted, 25.0)?;
        let q3 = percentile(sorted, 75.0)?;
        let iqr = q3 - q1;

        Some(Self {
            lower: (q1 - 1.5 * iqr).max(p0),
            upper: (q3 + 1.5 * iqr).min(p100),
        })
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

/// Per-column winsorizer, fit on training data only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Winsorizer {
    bounds: HashMap<String, WinsorBounds>,
    is_fitted: bool,
}

impl Winsorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.bounds.clear();
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| BackorderError::FeatureNotFound(col_name.to_string()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;

            let sorted = sorted_finite(series.f64()?.into_iter());
            let bounds = WinsorBounds::from_sorted(&sorted).ok_or_else(|| {
                BackorderError::EmptyInput(format!(
                    "cannot winsorize column '{}' without values",
                    col_name
                ))
            })?;
            tracing::debug!(column = %col_name, lower = bounds.lower, upper = bounds.upper, "winsorizer bounds");
            self.bounds.insert(col_name.to_string(), bounds);
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BackorderError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, bounds) in &self.bounds {
            let series = df
                .column(col_name)
                .map_err(|_| BackorderError::FeatureNotFound(col_name.clone()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let clipped: Float64Chunked = series
                .f64()?
                .into_iter()
                .map(|opt| opt.map(|v| bounds.clip(v)))
                .collect();
            result.with_column(clipped.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn bounds(&self, column: &str) -> Option<&WinsorBounds> {
        self.bounds.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_match_iqr_rule() {
        // Q1 = 2, Q3 = 4, IQR = 2 -> [-1, 7] clamped to [1, 100] -> [1, 7]
        let sorted = [1.0, 2.0, 3.0, 4.0, 100.0];
        let bounds = WinsorBounds::from_sorted(&sorted).unwrap();
        assert_eq!(bounds.lower, 1.0);
        assert_eq!(bounds.upper, 7.0);
    }

    #[test]
    fn test_bounds_contain_interquartile_range() {
        let sorted: Vec<f64> = (0..50).map(|i| (i as f64).powi(2)).collect();
        let bounds = WinsorBounds::from_sorted(&sorted).unwrap();
        assert!(bounds.lower <= percentile(&sorted, 25.0).unwrap());
        assert!(bounds.upper >= percentile(&sorted, 75.0).unwrap());
        assert!(bounds.lower >= sorted[0]);
        assert!(bounds.upper <= sorted[49]);
    }

    #[test]
    fn test_transform_clips_outlier() {
        let df = df!("x" => &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        let mut winsorizer = Winsorizer::new();
        let out = winsorizer.fit_transform(&df, &["x"]).unwrap();
        assert_eq!(out.column("x").unwrap().f64().unwrap().get(4), Some(7.0));
    }

    #[test]
    fn test_empty_column_fails() {
        let df = df!("x" => &[None::<f64>, None]).unwrap();
        assert!(Winsorizer::new().fit(&df, &["x"]).is_err());
    }
}
