//! Feature scaling implementations

use crate::error::{BackorderError, Result};
use crate::utils::{percentile, sorted_finite};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Robust scaling using median and IQR
    Robust,
    /// No scaling
    None,
}

/// Parameters for a fitted scaler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64,
    pub scale: f64,
}

/// Feature scaler. Statistics use finite values only; nulls and NaN
/// come out as nulls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| BackorderError::FeatureNotFound(col_name.to_string()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;

            let params = self.compute_params(&series)?;
            self.params.insert(col_name.to_string(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data.
    /// Builds all replacement columns first, then applies them in a single pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BackorderError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let series = df
                    .column(col_name)
                    .map_err(|_| BackorderError::FeatureNotFound(col_name.clone()))?
                    .as_materialized_series();
                Self::scale_series(series, params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn params(&self, column: &str) -> Option<&ScalerParams> {
        self.params.get(column)
    }

    fn compute_params(&self, series: &Series) -> Result<ScalerParams> {
        let ca = series.f64()?;
        let empty = || BackorderError::EmptyInput(format!("column '{}' has no values", series.name()));

        let (center, scale) = match self.scaler_type {
            ScalerType::Standard => {
                let finite = sorted_finite(ca.into_iter());
                if finite.is_empty() {
                    return Err(empty());
                }
                let n = finite.len() as f64;
                let mean = finite.iter().sum::<f64>() / n;
                // population standard deviation
                let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                (mean, var.sqrt())
            }
            ScalerType::Robust => {
                let sorted = sorted_finite(ca.into_iter());
                let median = percentile(&sorted, 50.0).ok_or_else(empty)?;
                let q1 = percentile(&sorted, 25.0).ok_or_else(empty)?;
                let q3 = percentile(&sorted, 75.0).ok_or_else(empty)?;
                (median, q3 - q1)
            }
            ScalerType::None => (0.0, 1.0),
        };

        Ok(ScalerParams {
            center,
            scale: if scale == 0.0 || !scale.is_finite() { 1.0 } else { scale },
        })
    }

    fn scale_series(series: &Series, params: &ScalerParams) -> Result<Series> {
        let cast = series.cast(&DataType::Float64)?;
        let scaled: Float64Chunked = cast
            .f64()?
            .into_iter()
            .map(|opt| {
                opt.filter(|v| !v.is_nan())
                    .map(|v| (v - params.center) / params.scale)
            })
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }
}
