//! Records handed from one pipeline stage to the next

use crate::training::ClassificationMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub feature_store_path: PathBuf,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    /// True when existing train/test files were reused instead of re-ingesting
    pub reused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub valid_train_path: PathBuf,
    pub valid_test_path: PathBuf,
    pub invalid_train_path: Option<PathBuf>,
    pub invalid_test_path: Option<PathBuf>,
    pub drift_report_path: PathBuf,
    /// Columns whose train/test distributions differ
    pub drifted_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    pub preprocessor_path: PathBuf,
    pub label_encoder_path: PathBuf,
    /// Features with the encoded label as the last column
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_path: PathBuf,
    pub train_metrics: ClassificationMetrics,
    pub test_metrics: ClassificationMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationArtifact {
    pub is_model_accepted: bool,
    /// `None` when there was no baseline to compare against
    pub improved_accuracy: Option<f64>,
    pub best_model_path: Option<String>,
    pub trained_model_path: PathBuf,
    pub trained_model_metrics: ClassificationMetrics,
    pub best_model_metrics: Option<ClassificationMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPusherArtifact {
    pub registry_prefix: String,
    pub model_key: String,
    pub version: u64,
}
