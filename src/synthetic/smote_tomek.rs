//! Combined over- and under-sampling

use super::{class_counts, ResampleResult, Sampler, TomekLinks, SMOTE};
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// SMOTE over-sampling followed by Tomek link cleaning.
///
/// Minority classes are grown synthetically, then majority samples sitting
/// on the class boundary are removed from the enlarged set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmoteTomek {
    smote: SMOTE,
    tomek: TomekLinks,
}

impl SmoteTomek {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.smote = self.smote.with_k_neighbors(k);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.smote = self.smote.with_seed(seed);
        self
    }
}

impl Sampler for SmoteTomek {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        // the majority class is fixed by the original distribution, not the balanced one
        self.smote.fit(x, y)?;
        self.tomek.fit(x, y)
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let oversampled = self.smote.resample(x, y)?;

        let cleaned = self.tomek.resample(&oversampled.x, &oversampled.y)?;

        info!(
            before = ?class_counts(y),
            after = ?class_counts(&cleaned.y),
            removed = cleaned.n_removed,
            "resampled training set"
        );

        Ok(ResampleResult {
            x: cleaned.x,
            y: cleaned.y,
            n_synthetic: oversampled.n_synthetic,
            n_removed: cleaned.n_removed,
        })
    }
}
