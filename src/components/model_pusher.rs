//! Publishing accepted models to the registry

use super::artifacts::{ModelEvaluationArtifact, ModelPusherArtifact};
use crate::config::ModelPusherConfig;
use crate::error::{BackorderError, Result};
use crate::registry::{ModelResolver, ObjectStore};
use chrono::Utc;
use tracing::{info, warn};

pub struct ModelPusher<'a> {
    config: ModelPusherConfig,
    store: &'a dyn ObjectStore,
}

impl<'a> ModelPusher<'a> {
    pub fn new(config: ModelPusherConfig, store: &'a dyn ObjectStore) -> Self {
        Self { config, store }
    }

    /// Upload the trained model under a fresh version
    pub fn initiate_model_pusher(
        &self,
        evaluation: &ModelEvaluationArtifact,
    ) -> Result<ModelPusherArtifact> {
        self.push_at(evaluation, Utc::now().timestamp().max(0) as u64)
    }

    /// Same as [`Self::initiate_model_pusher`] with an explicit clock reading
    pub fn push_at(&self, evaluation: &ModelEvaluationArtifact, now: u64) -> Result<ModelPusherArtifact> {
        if !evaluation.is_model_accepted {
            warn!(improved = ?evaluation.improved_accuracy, "model rejected");
            return Err(BackorderError::ModelRejected);
        }

        let resolver = ModelResolver::new(self.store, self.config.registry_prefix.as_str());
        let version = resolver.next_version(now)?;
        let model_key = resolver.model_key(version);
        self.store.upload(&evaluation.trained_model_path, &model_key)?;
        info!(key = %model_key, version, "model pushed");

        Ok(ModelPusherArtifact {
            registry_prefix: resolver.prefix().to_string(),
            model_key,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LocalObjectStore;
    use crate::training::ClassificationMetrics;
    use tempfile::tempdir;

    fn evaluation(path: std::path::PathBuf, accepted: bool) -> ModelEvaluationArtifact {
        let metrics = ClassificationMetrics {
            f1_score: 0.5,
            precision_score: 0.5,
            recall_score: 0.5,
            balanced_accuracy: 0.5,
            roc_auc_score: 0.5,
        };
        ModelEvaluationArtifact {
            is_model_accepted: accepted,
            improved_accuracy: None,
            best_model_path: None,
            trained_model_path: path,
            trained_model_metrics: metrics,
            best_model_metrics: None,
        }
    }

    #[test]
    fn test_push_versions_increase() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("model.bin");
        std::fs::write(&model, b"weights").unwrap();
        let store = LocalObjectStore::new(dir.path().join("store"));
        let pusher = ModelPusher::new(
            ModelPusherConfig {
                registry_prefix: "model-registry".to_string(),
            },
            &store,
        );

        let first = pusher.push_at(&evaluation(model.clone(), true), 100).unwrap();
        let second = pusher.push_at(&evaluation(model, true), 100).unwrap();
        assert_eq!(first.model_key, "model-registry/100/model.bin");
        assert_eq!(second.version, 101);
        assert_eq!(store.download(&second.model_key).unwrap(), b"weights");
    }

    #[test]
    fn test_rejected_model_is_not_pushed() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let pusher = ModelPusher::new(
            ModelPusherConfig {
                registry_prefix: "model-registry".to_string(),
            },
            &store,
        );
        let result = pusher.push_at(&evaluation(dir.path().join("model.bin"), false), 1);
        assert!(matches!(result, Err(BackorderError::ModelRejected)));
        assert!(!store.exists("model-registry").unwrap());
    }
}
