//! Model evaluation against the currently deployed model

use super::artifacts::{DataValidationArtifact, ModelEvaluationArtifact, ModelTrainerArtifact};
use crate::config::{write_yaml_file, ModelEvaluationConfig};
use crate::error::{BackorderError, Result};
use crate::registry::{ModelResolver, ObjectStore};
use crate::training::{BackorderModel, ClassificationMetrics};
use crate::utils::read_csv;
use ndarray::Array1;
use tracing::info;

/// Improvements within this distance of the threshold count as equal to it.
/// Scores like `0.75 - 0.70` do not land exactly on `0.05` in binary floats.
pub const ACCEPTANCE_TOLERANCE: f64 = 1e-9;

/// A candidate replaces the baseline only when it is strictly better by
/// more than `threshold`
pub fn is_model_accepted(candidate: f64, baseline: f64, threshold: f64) -> bool {
    (candidate - baseline) - threshold > ACCEPTANCE_TOLERANCE
}

pub struct ModelEvaluation<'a> {
    config: ModelEvaluationConfig,
    store: &'a dyn ObjectStore,
}

impl<'a> ModelEvaluation<'a> {
    pub fn new(config: ModelEvaluationConfig, store: &'a dyn ObjectStore) -> Self {
        Self { config, store }
    }

    pub fn initiate_model_evaluation(
        &self,
        validation: &DataValidationArtifact,
        trainer: &ModelTrainerArtifact,
    ) -> Result<ModelEvaluationArtifact> {
        let resolver = ModelResolver::new(self.store, self.config.registry_prefix.as_str());

        let artifact = match resolver.latest()? {
            None => {
                info!(prefix = resolver.prefix(), "no deployed model, accepting the trained one");
                ModelEvaluationArtifact {
                    is_model_accepted: true,
                    improved_accuracy: None,
                    best_model_path: None,
                    trained_model_path: trainer.trained_model_path.clone(),
                    trained_model_metrics: trainer.test_metrics,
                    best_model_metrics: None,
                }
            }
            Some(entry) => {
                let best = BackorderModel::from_bytes(&self.store.download(&entry.key)?)?;
                let trained = BackorderModel::load(&trainer.trained_model_path)?;

                let test = read_csv(&validation.valid_test_path)?;
                let target = test
                    .column(&self.config.target_column)
                    .map_err(|_| BackorderError::FeatureNotFound(self.config.target_column.clone()))?
                    .as_materialized_series()
                    .clone();
                let features = test.drop(&self.config.target_column)?;
                let y_true = Array1::from_vec(trained.label_encoder().encode_series(&target)?);

                let trained_metrics =
                    ClassificationMetrics::compute(&y_true, &trained.predict(&features)?)?;
                let best_metrics = ClassificationMetrics::compute(&y_true, &best.predict(&features)?)?;

                let improved = trained_metrics.balanced_accuracy - best_metrics.balanced_accuracy;
                let accepted = is_model_accepted(
                    trained_metrics.balanced_accuracy,
                    best_metrics.balanced_accuracy,
                    self.config.change_threshold,
                );
                info!(
                    best = %entry.key,
                    trained = trained_metrics.balanced_accuracy,
                    deployed = best_metrics.balanced_accuracy,
                    improved,
                    accepted,
                    "compared against deployed model"
                );

                ModelEvaluationArtifact {
                    is_model_accepted: accepted,
                    improved_accuracy: Some(improved),
                    best_model_path: Some(entry.key),
                    trained_model_path: trainer.trained_model_path.clone(),
                    trained_model_metrics: trained_metrics,
                    best_model_metrics: Some(best_metrics),
                }
            }
        };

        write_yaml_file(&self.config.report_path, &artifact)?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_is_strict() {
        assert!(is_model_accepted(0.80, 0.70, 0.02));
        assert!(!is_model_accepted(0.72, 0.70, 0.02));
        assert!(!is_model_accepted(0.70, 0.70, 0.0));
        assert!(!is_model_accepted(0.60, 0.70, 0.02));
    }

    #[test]
    fn test_improvement_equal_to_threshold_after_rounding_is_rejected() {
        // 0.75 - 0.70 evaluates to 0.05000000000000004
        assert!(0.75 - 0.70 > 0.05);
        assert!(!is_model_accepted(0.75, 0.70, 0.05));
        assert!(!is_model_accepted(0.35, 0.30, 0.05));
        assert!(!is_model_accepted(0.93, 0.91, 0.02));
        assert!(is_model_accepted(0.7501, 0.70, 0.05));
    }

    #[test]
    fn test_acceptance_monotonic_in_candidate() {
        let scores = [0.1, 0.3, 0.5, 0.7, 0.9];
        for pair in scores.windows(2) {
            if is_model_accepted(pair[0], 0.4, 0.05) {
                assert!(is_model_accepted(pair[1], 0.4, 0.05));
            }
        }
    }
}
