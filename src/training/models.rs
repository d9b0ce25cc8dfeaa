//! Prediction trait and classification metrics

use crate::error::{BackorderError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Anything that maps a feature matrix to encoded class labels
pub trait Predictor {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>>;
}

/// Label treated as the positive class by the binary metrics
pub const POSITIVE_LABEL: i64 = 1;

/// Binary classification metrics for one (model, dataset) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub f1_score: f64,
    pub precision_score: f64,
    pub recall_score: f64,
    pub balanced_accuracy: f64,
    pub roc_auc_score: f64,
}

impl ClassificationMetrics {
    /// Compute all metrics from encoded labels. Hard predictions double as
    /// the ranking score for ROC AUC.
    pub fn compute(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(BackorderError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(BackorderError::EmptyInput("no labels to score".to_string()));
        }

        let (tp, fp, _tn, fn_) = Self::confusion_counts(y_true, y_pred);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let scores: Vec<f64> = y_pred.iter().map(|&p| p as f64).collect();
        Ok(Self {
            f1_score: f1,
            precision_score: precision,
            recall_score: recall,
            balanced_accuracy: balanced_accuracy(y_true, y_pred),
            roc_auc_score: roc_auc(y_true, &scores)?,
        })
    }

    /// Predict with `model` and score against `y_true`
    pub fn evaluate<P: Predictor + ?Sized>(
        model: &P,
        x: &Array2<f64>,
        y_true: &Array1<i64>,
    ) -> Result<Self> {
        let y_pred = model.predict(x)?;
        Self::compute(y_true, &y_pred)
    }

    /// (tp, fp, tn, fn) with respect to [`POSITIVE_LABEL`]
    fn confusion_counts(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == POSITIVE_LABEL, p == POSITIVE_LABEL) {
                (true, true) => counts.0 += 1,
                (false, true) => counts.1 += 1,
                (false, false) => counts.2 += 1,
                (true, false) => counts.3 += 1,
            }
        }
        counts
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Mean per-class recall over the classes present in `y_true`
pub fn balanced_accuracy(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> f64 {
    let mut per_class: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        let entry = per_class.entry(t).or_insert((0, 0));
        entry.1 += 1;
        if t == p {
            entry.0 += 1;
        }
    }
    if per_class.is_empty() {
        return 0.0;
    }
    let sum: f64 = per_class.values().map(|&(hit, total)| ratio(hit, total)).sum();
    sum / per_class.len() as f64
}

/// Area under the ROC curve via the rank statistic; tied scores count half.
pub fn roc_auc(y_true: &Array1<i64>, scores: &[f64]) -> Result<f64> {
    let n_pos = y_true.iter().filter(|&&t| t == POSITIVE_LABEL).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(BackorderError::ComputationError(
            "ROC AUC is undefined when only one class is present in y_true".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    // average ranks (1-based) for tied groups
    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(t, _)| **t == POSITIVE_LABEL)
        .map(|(_, &r)| r)
        .sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![0, 1, 1, 0, 1];
        let m = ClassificationMetrics::compute(&y, &y).unwrap();
        assert_eq!(m.f1_score, 1.0);
        assert_eq!(m.balanced_accuracy, 1.0);
        assert_eq!(m.roc_auc_score, 1.0);
    }

    #[test]
    fn test_known_confusion_matrix() {
        // tp=2 fp=1 tn=3 fn=2
        let y_true = array![1, 1, 1, 1, 0, 0, 0, 0];
        let y_pred = array![1, 1, 0, 0, 1, 0, 0, 0];
        let m = ClassificationMetrics::compute(&y_true, &y_pred).unwrap();

        assert!((m.precision_score - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall_score - 0.5).abs() < 1e-12);
        assert!((m.f1_score - 4.0 / 7.0).abs() < 1e-12);
        assert!((m.balanced_accuracy - 0.625).abs() < 1e-12);
        // hard-label AUC equals balanced accuracy for binary predictions
        assert!((m.roc_auc_score - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions() {
        let y_true = array![1, 0, 0];
        let y_pred = array![0, 0, 0];
        let m = ClassificationMetrics::compute(&y_true, &y_pred).unwrap();
        assert_eq!(m.precision_score, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.balanced_accuracy, 0.5);
    }

    #[test]
    fn test_roc_auc_with_scores() {
        let y = array![0, 0, 1, 1];
        assert_eq!(roc_auc(&y, &[0.1, 0.4, 0.35, 0.8]).unwrap(), 0.75);
    }

    #[test]
    fn test_roc_auc_single_class_errors() {
        let y = array![1, 1];
        assert!(roc_auc(&y, &[0.2, 0.3]).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ClassificationMetrics::compute(&array![0, 1], &array![0]).is_err());
    }
}
