//! Run-level and per-stage configuration

use super::*;
use crate::preprocessing::HandleUnknown;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User-overridable knobs, loadable from `pipeline.yaml`.
///
/// Every field defaults to the crate constants, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Root under which each run gets a timestamped artifact directory
    pub artifact_dir: PathBuf,
    pub schema_path: PathBuf,
    pub model_config_path: PathBuf,
    pub target_column: String,
    /// Directory the document source reads collections from
    pub source_dir: PathBuf,
    pub collection_name: String,
    /// Root directory of the object store holding the registry
    pub store_root: PathBuf,
    pub registry_prefix: String,
    pub split_ratio: f64,
    pub random_state: u64,
    pub smote_k_neighbors: usize,
    pub unknown_categories: HandleUnknown,
    pub drift_alpha: f64,
    pub expected_score: f64,
    pub change_threshold: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(ARTIFACT_DIR),
            schema_path: PathBuf::from(SCHEMA_FILE_PATH),
            model_config_path: PathBuf::from(MODEL_CONFIG_FILE_PATH),
            target_column: TARGET_COLUMN.to_string(),
            source_dir: PathBuf::from("data"),
            collection_name: DATA_INGESTION_COLLECTION_NAME.to_string(),
            store_root: PathBuf::from(SAVED_MODEL_DIR),
            registry_prefix: MODEL_PUSHER_S3_KEY.to_string(),
            split_ratio: DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO,
            random_state: 42,
            smote_k_neighbors: 5,
            unknown_categories: HandleUnknown::Error,
            drift_alpha: 0.05,
            expected_score: MODEL_TRAINER_EXPECTED_SCORE,
            change_threshold: MODEL_EVALUATION_CHANGED_THRESHOLD_SCORE,
        }
    }
}

impl PipelineSettings {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Self = read_yaml_file(path)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(BackorderError::ConfigError(format!(
                "split_ratio must be in (0, 1), got {}",
                self.split_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.expected_score) {
            return Err(BackorderError::ConfigError(format!(
                "expected_score must be in [0, 1], got {}",
                self.expected_score
            )));
        }
        if self.smote_k_neighbors == 0 {
            return Err(BackorderError::ConfigError(
                "smote_k_neighbors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One training run: the settings plus the timestamped artifact root
#[derive(Debug, Clone)]
pub struct TrainingPipelineConfig {
    pub settings: PipelineSettings,
    pub pipeline_name: String,
    pub timestamp: String,
    pub artifact_root: PathBuf,
}

impl TrainingPipelineConfig {
    pub fn new(settings: PipelineSettings) -> Self {
        let timestamp = Local::now().format("%m_%d_%Y_%H_%M_%S").to_string();
        Self::with_timestamp(settings, timestamp)
    }

    /// Reusing a timestamp points the run at an existing artifact directory,
    /// which lets ingestion reuse its train/test files.
    pub fn with_timestamp(settings: PipelineSettings, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        let artifact_root = settings.artifact_dir.join(&timestamp);
        Self {
            settings,
            pipeline_name: PIPELINE_NAME.to_string(),
            timestamp,
            artifact_root,
        }
    }

    fn stage_dir(&self, name: &str) -> PathBuf {
        self.artifact_root.join(name)
    }
}

#[derive(Debug, Clone)]
pub struct DataIngestionConfig {
    pub collection_name: String,
    pub feature_store_path: PathBuf,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub split_ratio: f64,
    pub random_state: u64,
}

impl DataIngestionConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.stage_dir(DATA_INGESTION_DIR_NAME);
        let ingested = dir.join(DATA_INGESTION_INGESTED_DIR);
        Self {
            collection_name: pipeline.settings.collection_name.clone(),
            feature_store_path: dir.join(DATA_INGESTION_FEATURE_STORE_DIR).join(FILE_NAME),
            train_path: ingested.join(TRAIN_FILE_NAME),
            test_path: ingested.join(TEST_FILE_NAME),
            split_ratio: pipeline.settings.split_ratio,
            random_state: pipeline.settings.random_state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataValidationConfig {
    pub schema_path: PathBuf,
    pub target_column: String,
    pub valid_train_path: PathBuf,
    pub valid_test_path: PathBuf,
    pub invalid_train_path: PathBuf,
    pub invalid_test_path: PathBuf,
    pub drift_report_path: PathBuf,
    pub drift_alpha: f64,
}

impl DataValidationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.stage_dir(DATA_VALIDATION_DIR_NAME);
        let valid = dir.join(DATA_VALIDATION_VALID_DIR);
        let invalid = dir.join(DATA_VALIDATION_INVALID_DIR);
        Self {
            schema_path: pipeline.settings.schema_path.clone(),
            target_column: pipeline.settings.target_column.clone(),
            valid_train_path: valid.join(TRAIN_FILE_NAME),
            valid_test_path: valid.join(TEST_FILE_NAME),
            invalid_train_path: invalid.join(TRAIN_FILE_NAME),
            invalid_test_path: invalid.join(TEST_FILE_NAME),
            drift_report_path: dir
                .join(DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(DATA_VALIDATION_DRIFT_REPORT_FILE_NAME),
            drift_alpha: pipeline.settings.drift_alpha,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataTransformationConfig {
    pub schema_path: PathBuf,
    pub target_column: String,
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
    pub preprocessor_path: PathBuf,
    pub label_encoder_path: PathBuf,
    pub unknown_categories: HandleUnknown,
    pub smote_k_neighbors: usize,
    pub random_state: u64,
}

impl DataTransformationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.stage_dir(DATA_TRANSFORMATION_DIR_NAME);
        let data = dir.join(DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR);
        let objects = dir.join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR);
        Self {
            schema_path: pipeline.settings.schema_path.clone(),
            target_column: pipeline.settings.target_column.clone(),
            transformed_train_path: data.join("train.bin"),
            transformed_test_path: data.join("test.bin"),
            preprocessor_path: objects.join(PREPROCESSING_OBJECT_FILE_NAME),
            label_encoder_path: objects.join(LABEL_ENCODER_OBJECT_FILE_NAME),
            unknown_categories: pipeline.settings.unknown_categories,
            smote_k_neighbors: pipeline.settings.smote_k_neighbors,
            random_state: pipeline.settings.random_state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelTrainerConfig {
    pub trained_model_path: PathBuf,
    pub expected_score: f64,
    pub model_config_path: PathBuf,
}

impl ModelTrainerConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        Self {
            trained_model_path: pipeline
                .stage_dir(MODEL_TRAINER_DIR_NAME)
                .join(MODEL_TRAINER_TRAINED_MODEL_DIR)
                .join(MODEL_FILE_NAME),
            expected_score: pipeline.settings.expected_score,
            model_config_path: pipeline.settings.model_config_path.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelEvaluationConfig {
    pub change_threshold: f64,
    pub registry_prefix: String,
    pub report_path: PathBuf,
    pub target_column: String,
}

impl ModelEvaluationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        Self {
            change_threshold: pipeline.settings.change_threshold,
            registry_prefix: pipeline.settings.registry_prefix.clone(),
            report_path: pipeline
                .stage_dir(MODEL_EVALUATION_DIR_NAME)
                .join(MODEL_EVALUATION_REPORT_NAME),
            target_column: pipeline.settings.target_column.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelPusherConfig {
    pub registry_prefix: String,
}

impl ModelPusherConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        Self {
            registry_prefix: pipeline.settings.registry_prefix.clone(),
        }
    }
}

/// Batch scoring: where to read rows, where to write them, which registry to use
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionPipelineConfig {
    pub store_root: PathBuf,
    pub registry_prefix: String,
    pub input_key: String,
    pub output_key: String,
}

impl Default for PredictionPipelineConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from(SAVED_MODEL_DIR),
            registry_prefix: MODEL_PUSHER_S3_KEY.to_string(),
            input_key: "prediction/input.csv".to_string(),
            output_key: "prediction/output.csv".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_paths_live_under_run_root() {
        let config = TrainingPipelineConfig::with_timestamp(PipelineSettings::default(), "run1");
        let ingestion = DataIngestionConfig::new(&config);
        assert_eq!(
            ingestion.train_path,
            PathBuf::from("artifact/run1/data_ingestion/ingested/train.csv")
        );
        let trainer = ModelTrainerConfig::new(&config);
        assert_eq!(
            trainer.trained_model_path,
            PathBuf::from("artifact/run1/model_trainer/trained_model/model.bin")
        );
    }

    #[test]
    fn test_settings_partial_yaml_keeps_defaults() {
        let settings: PipelineSettings = serde_yaml::from_str("change_threshold: 0.05").unwrap();
        assert_eq!(settings.change_threshold, 0.05);
        assert_eq!(settings.target_column, TARGET_COLUMN);
        assert_eq!(settings.split_ratio, 0.2);
    }

    #[test]
    fn test_invalid_split_ratio_rejected() {
        let settings = PipelineSettings {
            split_ratio: 1.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
