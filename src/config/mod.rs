//! Pipeline configuration
//!
//! Constants for the artifact layout, the YAML schema and model
//! configuration files, and the per-stage configs derived from a
//! single [`TrainingPipelineConfig`].

mod model_config;
mod pipeline;
mod schema;

pub use model_config::{ModelConfig, ModelSpec};
pub use pipeline::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelEvaluationConfig,
    ModelPusherConfig, ModelTrainerConfig, PipelineSettings, PredictionPipelineConfig,
    TrainingPipelineConfig,
};
pub use schema::{ResolvedColumns, Schema};

use crate::error::{BackorderError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

pub const TARGET_COLUMN: &str = "went_on_backorder";
pub const PIPELINE_NAME: &str = "back_order_prediction";
pub const ARTIFACT_DIR: &str = "artifact";
pub const SAVED_MODEL_DIR: &str = "saved_models";

pub const FILE_NAME: &str = "back_order.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessing.bin";
pub const LABEL_ENCODER_OBJECT_FILE_NAME: &str = "label_encoder.bin";
pub const MODEL_FILE_NAME: &str = "model.bin";

pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";
pub const MODEL_CONFIG_FILE_PATH: &str = "config/model.yaml";

pub const DATA_INGESTION_COLLECTION_NAME: &str = "back_orders";
pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
pub const DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;

pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_VALID_DIR: &str = "validated";
pub const DATA_VALIDATION_INVALID_DIR: &str = "invalid";
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
pub const DATA_VALIDATION_DRIFT_REPORT_FILE_NAME: &str = "report.yaml";

pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
pub const DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR: &str = "transformed";
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";

pub const MODEL_TRAINER_DIR_NAME: &str = "model_trainer";
pub const MODEL_TRAINER_TRAINED_MODEL_DIR: &str = "trained_model";
pub const MODEL_TRAINER_EXPECTED_SCORE: f64 = 0.0;

pub const MODEL_EVALUATION_DIR_NAME: &str = "model_evaluation";
pub const MODEL_EVALUATION_REPORT_NAME: &str = "report.yaml";
pub const MODEL_EVALUATION_CHANGED_THRESHOLD_SCORE: f64 = 0.02;

pub const MODEL_PUSHER_S3_KEY: &str = "model-registry";

/// Name of the column appended by the prediction pipeline
pub const PREDICTION_COLUMN: &str = "class";

/// Read and deserialize a YAML file
pub fn read_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        BackorderError::ConfigError(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Serialize a value as YAML, creating parent directories as needed
pub fn write_yaml_file<T: serde::Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    serde_yaml::to_writer(file, value)?;
    Ok(())
}
