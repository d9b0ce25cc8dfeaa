//! Error types for the backorder pipeline

use std::panic::Location;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BackorderError>;

/// Main error type for the backorder pipeline
#[derive(Error, Debug)]
pub enum BackorderError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Invalid parameter for {model}: {reason}")]
    InvalidParameter { model: String, reason: String },

    #[error("Unseen label '{0}'")]
    UnseenLabel(String),

    #[error("Unknown category '{category}' in column '{column}'")]
    UnknownCategory { column: String, category: String },

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Model score {score:.4} is below the expected score {expected:.4}")]
    BelowExpectedScore { score: f64, expected: f64 },

    #[error("Model registry at '{0}' has no entries")]
    RegistryEmpty(String),

    #[error("Malformed registry entry '{0}': entry names must be integer timestamps")]
    RegistryMalformed(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Trained model was not accepted; refusing to push")]
    ModelRejected,

    #[error("{stage} failed at {location}: {source}")]
    Stage {
        stage: &'static str,
        location: String,
        #[source]
        source: Box<BackorderError>,
    },
}

impl BackorderError {
    /// Innermost error, skipping any stage wrappers
    pub fn root_cause(&self) -> &BackorderError {
        match self {
            BackorderError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<polars::error::PolarsError> for BackorderError {
    fn from(err: polars::error::PolarsError) -> Self {
        BackorderError::DataError(err.to_string())
    }
}

impl From<serde_yaml::Error> for BackorderError {
    fn from(err: serde_yaml::Error) -> Self {
        BackorderError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for BackorderError {
    fn from(err: bincode::Error) -> Self {
        BackorderError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BackorderError {
    fn from(err: ndarray::ShapeError) -> Self {
        BackorderError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

/// Wraps a failure in a stage error carrying the caller's source location.
pub trait StageExt<T> {
    fn in_stage(self, stage: &'static str) -> Result<T>;
}

impl<T> StageExt<T> for Result<T> {
    #[track_caller]
    fn in_stage(self, stage: &'static str) -> Result<T> {
        let caller = Location::caller();
        self.map_err(|err| BackorderError::Stage {
            stage,
            location: format!("{}:{}", caller.file(), caller.line()),
            source: Box::new(err),
        })
    }
}
