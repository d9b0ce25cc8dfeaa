//! Drift detection module
//!
//! Compares the distribution of a column in two datasets (train vs test)
//! and flags columns whose distributions differ significantly.

mod data_drift;

pub use data_drift::KolmogorovSmirnovTest;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Drift detection result for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    /// Test statistic
    pub statistic: f64,
    pub p_value: f64,
    /// Whether the p-value fell below the detector's alpha
    pub drift_detected: bool,
}

/// Trait for drift detectors
pub trait DriftDetector: Send + Sync {
    /// Detect drift between reference and current values; nulls are skipped
    fn detect(&self, reference: &[Option<f64>], current: &[Option<f64>]) -> Result<DriftResult>;

    /// Significance level used for detection
    fn alpha(&self) -> f64;
}
