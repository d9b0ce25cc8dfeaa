//! Preprocessing configuration

use super::{HandleUnknown, ImputeStrategy, ScalerType};
use serde::{Deserialize, Serialize};

/// Configuration for the feature transformation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Type of scaler applied to numeric features
    pub scaler_type: ScalerType,

    /// Strategy for missing numeric values, applied after scaling
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Whether to clip numeric features to their IQR fences
    pub winsorize: bool,

    /// Behaviour for categories unseen during fit
    pub handle_unknown: HandleUnknown,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            scaler_type: ScalerType::Standard,
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            winsorize: true,
            handle_unknown: HandleUnknown::Error,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    pub fn with_winsorize(mut self, enabled: bool) -> Self {
        self.winsorize = enabled;
        self
    }

    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }
}
