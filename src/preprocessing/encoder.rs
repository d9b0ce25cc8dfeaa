//! Categorical and target encoders

use crate::error::{BackorderError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// What to do with a category that was not seen during fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Fail the transform
    Error,
    /// Encode as all zeros
    Ignore,
}

/// One-hot encoder that drops the first (lexicographically smallest)
/// category of every column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
    // column -> sorted categories, first one included
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new(handle_unknown: HandleUnknown) -> Self {
        Self {
            handle_unknown,
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.categories.clear();
        for col_name in columns {
            let series = Self::string_column(df, col_name)?;
            let levels: BTreeSet<String> = series
                .str()?
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            if levels.is_empty() {
                return Err(BackorderError::EmptyInput(format!(
                    "categorical column '{}' has no values",
                    col_name
                )));
            }
            self.categories
                .push((col_name.to_string(), levels.into_iter().collect()));
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Number of output columns (one per category minus the dropped first level)
    pub fn n_output_features(&self) -> usize {
        self.categories
            .iter()
            .map(|(_, cats)| cats.len().saturating_sub(1))
            .sum()
    }

    /// Output column names, `<column>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(col, cats)| cats.iter().skip(1).map(move |c| format!("{}_{}", col, c)))
            .collect()
    }

    /// Encode into a dense matrix with `n_output_features` columns
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(BackorderError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut out = Array2::<f64>::zeros((n_rows, self.n_output_features()));
        let mut offset = 0;

        for (col_name, cats) in &self.categories {
            let series = Self::string_column(df, col_name)?;
            let index: HashMap<&str, usize> = cats
                .iter()
                .enumerate()
                .map(|(i, c)| (c.as_str(), i))
                .collect();

            for (row, value) in series.str()?.into_iter().enumerate() {
                let Some(value) = value else {
                    // missing values are imputed upstream; treat as unknown here
                    continue;
                };
                match index.get(value) {
                    Some(0) => {}
                    Some(&i) => out[[row, offset + i - 1]] = 1.0,
                    None => {
                        if self.handle_unknown == HandleUnknown::Error {
                            return Err(BackorderError::UnknownCategory {
                                column: col_name.clone(),
                                category: value.to_string(),
                            });
                        }
                    }
                }
            }
            offset += cats.len() - 1;
        }

        Ok(out)
    }

    fn string_column(df: &DataFrame, col_name: &str) -> Result<Series> {
        Ok(df
            .column(col_name)
            .map_err(|_| BackorderError::FeatureNotFound(col_name.to_string()))?
            .as_materialized_series()
            .cast(&DataType::String)?)
    }
}

/// Maps target labels to integers `0..n_classes` in sorted label order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<&mut Self> {
        let classes: BTreeSet<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        if classes.is_empty() {
            return Err(BackorderError::EmptyInput("no target labels to fit".to_string()));
        }
        self.classes = classes.into_iter().collect();
        Ok(self)
    }

    /// Fit on a target column; nulls are rejected
    pub fn fit_series(&mut self, series: &Series) -> Result<&mut Self> {
        let labels = Self::series_labels(series)?;
        self.fit(&labels)
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<i64>> {
        if !self.is_fitted() {
            return Err(BackorderError::ModelNotFitted);
        }
        labels
            .iter()
            .map(|l| {
                let l = l.as_ref();
                self.classes
                    .binary_search_by(|c| c.as_str().cmp(l))
                    .map(|i| i as i64)
                    .map_err(|_| BackorderError::UnseenLabel(l.to_string()))
            })
            .collect()
    }

    pub fn encode_series(&self, series: &Series) -> Result<Vec<i64>> {
        let labels = Self::series_labels(series)?;
        self.encode(&labels)
    }

    pub fn decode(&self, codes: &[i64]) -> Result<Vec<String>> {
        if !self.is_fitted() {
            return Err(BackorderError::ModelNotFitted);
        }
        codes
            .iter()
            .map(|&code| {
                usize::try_from(code)
                    .ok()
                    .and_then(|i| self.classes.get(i))
                    .cloned()
                    .ok_or_else(|| BackorderError::UnseenLabel(code.to_string()))
            })
            .collect()
    }

    fn series_labels(series: &Series) -> Result<Vec<String>> {
        let cast = series.cast(&DataType::String)?;
        cast.str()?
            .into_iter()
            .map(|v| {
                v.map(str::to_string).ok_or_else(|| {
                    BackorderError::DataError(format!("target column '{}' has nulls", series.name()))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onehot_drops_first_level() {
        let df = df!("color" => &["red", "green", "blue", "green"]).unwrap();
        let mut encoder = OneHotEncoder::new(HandleUnknown::Error);
        encoder.fit(&df, &["color"]).unwrap();

        // sorted: blue (dropped), green, red
        assert_eq!(encoder.feature_names(), vec!["color_green", "color_red"]);
        let out = encoder.transform(&df).unwrap();
        assert_eq!(out.shape(), &[4, 2]);
        assert_eq!(out.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(out.row(1).to_vec(), vec![1.0, 0.0]);
        assert_eq!(out.row(2).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_onehot_unknown_category() {
        let train = df!("c" => &["a", "b"]).unwrap();
        let test = df!("c" => &["z"]).unwrap();

        let mut strict = OneHotEncoder::new(HandleUnknown::Error);
        strict.fit(&train, &["c"]).unwrap();
        assert!(matches!(
            strict.transform(&test),
            Err(BackorderError::UnknownCategory { .. })
        ));

        let mut lenient = OneHotEncoder::new(HandleUnknown::Ignore);
        lenient.fit(&train, &["c"]).unwrap();
        assert_eq!(lenient.transform(&test).unwrap().row(0).to_vec(), vec![0.0]);
    }

    #[test]
    fn test_label_round_trip() {
        let labels = ["Yes", "No", "No", "Yes", "No"];
        let mut encoder = LabelEncoder::new();
        encoder.fit(&labels).unwrap();

        let codes = encoder.encode(&labels).unwrap();
        assert_eq!(codes, vec![1, 0, 0, 1, 0]);
        assert_eq!(encoder.decode(&codes).unwrap(), labels.to_vec());
    }

    #[test]
    fn test_label_unseen_rejected() {
        let mut encoder = LabelEncoder::new();
        encoder.fit(&["No", "Yes"]).unwrap();
        assert!(matches!(encoder.encode(&["Maybe"]), Err(BackorderError::UnseenLabel(_))));
        assert!(encoder.decode(&[2]).is_err());
        assert!(encoder.decode(&[-1]).is_err());
    }
}
