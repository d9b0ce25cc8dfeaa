//! Class-imbalance resampling
//!
//! - SMOTE (Synthetic Minority Over-sampling Technique)
//! - Tomek link removal
//! - SMOTE followed by Tomek link cleaning

mod smote;
mod smote_tomek;
mod tomek;

pub use smote::SMOTE;
pub use smote_tomek::SmoteTomek;
pub use tomek::TomekLinks;

use crate::error::{BackorderError, Result};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Number of synthetic samples generated per class, in class order
    pub n_synthetic: Vec<usize>,
    /// Number of original samples removed
    pub n_removed: usize,
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Get class distribution, ordered by class label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class, ordered by class label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Majority count divided by minority count
pub fn imbalance_ratio(y: &Array1<i64>) -> f64 {
    let counts = class_counts(y);
    match (counts.values().max(), counts.values().min()) {
        (Some(&max), Some(&min)) if min > 0 => max as f64 / min as f64,
        _ => f64::INFINITY,
    }
}

fn check_inputs(x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(BackorderError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(BackorderError::EmptyInput("no samples to resample".to_string()));
    }
    Ok(())
}

/// Squared Euclidean distance between two rows
fn squared_distance(a: ndarray::ArrayView1<f64>, b: ndarray::ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_class_counts_sorted() {
        let y = array![1, 0, 1, 1];
        let counts = class_counts(&y);
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn test_imbalance_ratio() {
        assert_eq!(imbalance_ratio(&array![0, 0, 0, 1]), 3.0);
    }
}
