//! Data preprocessing module
//!
//! Provides the pieces of the feature transformation pipeline:
//! - Missing value imputation
//! - Feature scaling (standard, robust)
//! - Quartile-based winsorization
//! - Drop-first one-hot encoding and target label encoding

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;
mod winsorizer;

pub use config::PreprocessingConfig;
pub use encoder::{HandleUnknown, LabelEncoder, OneHotEncoder};
pub use imputer::{ImputeStrategy, ImputeValue, Imputer};
pub use pipeline::FeatureTransformer;
pub use scaler::{Scaler, ScalerParams, ScalerType};
pub use winsorizer::{WinsorBounds, Winsorizer};
