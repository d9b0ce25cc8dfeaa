//! Pipeline stages
//!
//! Each stage takes its config plus the artifact of the previous stage and
//! returns its own artifact. Stages never reach into each other's state.

pub mod artifacts;
pub mod data_ingestion;
pub mod data_transformation;
pub mod data_validation;
pub mod model_evaluation;
pub mod model_pusher;
pub mod model_trainer;

pub use artifacts::*;
pub use data_ingestion::{CsvDocumentSource, DataIngestion, DocumentSource};
pub use data_transformation::DataTransformation;
pub use data_validation::{DataValidation, DriftReport};
pub use model_evaluation::{is_model_accepted, ModelEvaluation};
pub use model_pusher::ModelPusher;
pub use model_trainer::ModelTrainer;
