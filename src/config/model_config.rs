//! Model selection file (`model.yaml`)

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level layout of `model.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: ModelSpec,
}

/// Which model to build and with which hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub module: String,
    pub class: String,
    #[serde(default = "empty_params")]
    pub params: serde_yaml::Value,
}

fn empty_params() -> serde_yaml::Value {
    serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
}

impl ModelConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        super::read_yaml_file(path)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl ModelSpec {
    pub fn new(module: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
            params: empty_params(),
        }
    }

    pub fn with_params(mut self, params: serde_yaml::Value) -> Self {
        self.params = params;
        self
    }

    /// `module.class`, the key the model factory is indexed by
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.module, self.class)
    }
}
