//! Backorder ML - batch pipeline for backorder risk classification
//!
//! This crate ingests tabular order data, validates and transforms it,
//! trains a configurable classifier, compares it with the deployed model
//! and pushes the winner to a versioned model registry. A companion
//! prediction pipeline scores new batches with the registry's latest model.
//!
//! # Modules
//!
//! ## Core ML
//! - [`preprocessing`] - Imputation, scaling, winsorizing, one-hot and label encoding
//! - [`synthetic`] - SMOTE + Tomek links class-imbalance resampling
//! - [`training`] - Model factory, classifiers, metrics, composite model
//! - [`drift`] - Train/test distribution drift detection
//!
//! ## Pipeline
//! - [`config`] - Schema, model and pipeline configuration
//! - [`components`] - The six pipeline stages and their artifacts
//! - [`registry`] - Object storage and model registry lookup
//! - [`pipeline`] - Training and prediction orchestration
//!
//! ## Interfaces
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod synthetic;
pub mod training;
pub mod drift;

// Pipeline
pub mod config;
pub mod components;
pub mod registry;
pub mod pipeline;

// Interfaces
pub mod cli;

// Utilities
pub mod utils;

pub use error::{BackorderError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{BackorderError, Result, StageExt};
    pub use crate::config::{
        ModelConfig, ModelSpec, PipelineSettings, PredictionPipelineConfig, Schema,
        TrainingPipelineConfig,
    };
    pub use crate::components::{
        CsvDocumentSource, DataIngestion, DataTransformation, DataValidation, DocumentSource,
        ModelEvaluation, ModelPusher, ModelTrainer,
    };
    pub use crate::preprocessing::{
        FeatureTransformer, HandleUnknown, LabelEncoder, PreprocessingConfig, Winsorizer,
    };
    pub use crate::synthetic::{Sampler, SmoteTomek};
    pub use crate::training::{
        BackorderModel, ClassificationMetrics, Classifier, ModelFactory, Predictor,
    };
    pub use crate::registry::{LocalObjectStore, ModelResolver, ObjectStore, RegistryEntry};
    pub use crate::pipeline::{PredictionPipeline, TrainPipeline};
}
