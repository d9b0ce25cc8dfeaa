//! Model training and the minimum-quality gate

use super::artifacts::{DataTransformationArtifact, ModelTrainerArtifact};
use super::data_transformation::split_features_and_label;
use crate::config::{ModelConfig, ModelTrainerConfig};
use crate::error::{BackorderError, Result};
use crate::preprocessing::{FeatureTransformer, LabelEncoder};
use crate::training::{BackorderModel, ClassificationMetrics, ModelFactory};
use crate::utils::{load_array, load_object};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct ModelTrainer {
    config: ModelTrainerConfig,
    model_config: ModelConfig,
    factory: ModelFactory,
}

impl ModelTrainer {
    /// Read the model selection from the configured `model.yaml`
    pub fn new(config: ModelTrainerConfig) -> Result<Self> {
        let model_config = ModelConfig::from_yaml_file(&config.model_config_path)?;
        Ok(Self::with_model_config(config, model_config))
    }

    pub fn with_model_config(config: ModelTrainerConfig, model_config: ModelConfig) -> Self {
        Self {
            config,
            model_config,
            factory: ModelFactory::default(),
        }
    }

    pub fn with_factory(mut self, factory: ModelFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn initiate_model_trainer(
        &self,
        transformation: &DataTransformationArtifact,
    ) -> Result<ModelTrainerArtifact> {
        let (x_train, y_train) =
            split_features_and_label(&load_array(&transformation.transformed_train_path)?)?;
        let (x_test, y_test) =
            split_features_and_label(&load_array(&transformation.transformed_test_path)?)?;

        let mut model = self.factory.create(&self.model_config.model)?;
        let start = Instant::now();
        model.fit(&x_train, &y_train)?;
        info!(
            model = model.name(),
            rows = x_train.nrows(),
            seconds = start.elapsed().as_secs_f64(),
            "model fitted"
        );
        if let Some(importances) = model.feature_importances() {
            debug!(importances = ?importances.to_vec(), "feature importances");
        }

        let train_metrics = ClassificationMetrics::evaluate(&model, &x_train, &y_train)?;
        let test_metrics = ClassificationMetrics::evaluate(&model, &x_test, &y_test)?;

        if test_metrics.balanced_accuracy < self.config.expected_score {
            warn!(
                score = test_metrics.balanced_accuracy,
                expected = self.config.expected_score,
                "no model met the expected score"
            );
            return Err(BackorderError::BelowExpectedScore {
                score: test_metrics.balanced_accuracy,
                expected: self.config.expected_score,
            });
        }
        info!(
            train = train_metrics.balanced_accuracy,
            test = test_metrics.balanced_accuracy,
            "balanced accuracy"
        );

        let preprocessor = FeatureTransformer::load(&transformation.preprocessor_path)?;
        let label_encoder: LabelEncoder = load_object(&transformation.label_encoder_path)?;
        let bundle = BackorderModel::new(preprocessor, model, label_encoder)?;
        bundle.save(&self.config.trained_model_path)?;

        Ok(ModelTrainerArtifact {
            trained_model_path: self.config.trained_model_path.clone(),
            train_metrics,
            test_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::data_transformation::join_features_and_label;
    use crate::config::{ModelSpec, Schema};
    use crate::utils::{save_array, save_object};
    use ndarray::{Array1, Array2};
    use polars::prelude::*;
    use std::path::Path;
    use tempfile::tempdir;

    /// Two separable blobs in a single feature, with fitted objects on disk
    fn transformation(root: &Path) -> DataTransformationArtifact {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| {
            if i % 2 == 0 {
                i as f64
            } else {
                100.0 + i as f64
            }
        });
        let y = Array1::from_shape_fn(40, |i| (i % 2) as i64);
        let artifact = DataTransformationArtifact {
            preprocessor_path: root.join("preprocessing.bin"),
            label_encoder_path: root.join("label_encoder.bin"),
            transformed_train_path: root.join("train.bin"),
            transformed_test_path: root.join("test.bin"),
        };
        let joined = join_features_and_label(&x, &y).unwrap();
        save_array(&artifact.transformed_train_path, &joined).unwrap();
        save_array(&artifact.transformed_test_path, &joined).unwrap();

        let columns = Schema {
            numerical: vec!["qty".into()],
            categorical: vec![],
            drop_columns: vec![],
        }
        .resolve("went_on_backorder")
        .unwrap();
        let mut preprocessor = FeatureTransformer::new(&columns);
        preprocessor.fit(&df!("qty" => &[1.0, 2.0, 3.0]).unwrap()).unwrap();
        preprocessor.save(&artifact.preprocessor_path).unwrap();

        let mut encoder = LabelEncoder::new();
        encoder.fit(&["No", "Yes"]).unwrap();
        save_object(&artifact.label_encoder_path, &encoder).unwrap();
        artifact
    }

    fn trainer(root: &Path, expected_score: f64) -> ModelTrainer {
        let config = ModelTrainerConfig {
            trained_model_path: root.join("trained/model.bin"),
            expected_score,
            model_config_path: root.join("model.yaml"),
        };
        ModelTrainer::with_model_config(
            config,
            ModelConfig {
                model: ModelSpec::new("tree", "DecisionTreeClassifier"),
            },
        )
    }

    #[test]
    fn test_trains_and_saves_bundle() {
        let dir = tempdir().unwrap();
        let artifact = trainer(dir.path(), 0.6)
            .initiate_model_trainer(&transformation(dir.path()))
            .unwrap();

        assert_eq!(artifact.test_metrics.balanced_accuracy, 1.0);
        let bundle = BackorderModel::load(&artifact.trained_model_path).unwrap();
        assert_eq!(bundle.model().name(), "DecisionTreeClassifier");
    }

    #[test]
    fn test_gate_rejects_below_expected() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let artifact = transformation(root);
        // every test row falls in the class-0 blob but half are labelled 1
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let y = Array1::from_vec(vec![1, 0, 1, 0]);
        save_array(
            &artifact.transformed_test_path,
            &join_features_and_label(&x, &y).unwrap(),
        )
        .unwrap();

        let result = trainer(root, 0.99).initiate_model_trainer(&artifact);
        assert!(matches!(
            result,
            Err(BackorderError::BelowExpectedScore { .. })
        ));
        assert!(!root.join("trained/model.bin").exists());
    }

    #[test]
    fn test_unknown_model_is_fatal() {
        let dir = tempdir().unwrap();
        let config = ModelTrainerConfig {
            trained_model_path: dir.path().join("model.bin"),
            expected_score: 0.0,
            model_config_path: dir.path().join("model.yaml"),
        };
        let trainer = ModelTrainer::with_model_config(
            config,
            ModelConfig {
                model: ModelSpec::new("boosting", "Magic"),
            },
        );
        assert!(matches!(
            trainer.initiate_model_trainer(&transformation(dir.path())),
            Err(BackorderError::UnknownModel(_))
        ));
    }
}
