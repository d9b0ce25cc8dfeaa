//! Declarative column schema and role resolution

use crate::error::{BackorderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Column roles as declared in `schema.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub numerical: Vec<String>,
    #[serde(default)]
    pub categorical: Vec<String>,
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

/// Feature columns after removing drop-list columns and the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    pub numerical: Vec<String>,
    pub categorical: Vec<String>,
    pub dropped: Vec<String>,
    pub target: String,
}

impl ResolvedColumns {
    /// Numerical then categorical columns, the order features are emitted in
    pub fn feature_columns(&self) -> impl Iterator<Item = &str> {
        self.numerical
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }
}

impl Schema {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        super::read_yaml_file(path)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Every column the schema knows about, target included
    pub fn known_columns<'a>(&'a self, target: &'a str) -> HashSet<&'a str> {
        self.numerical
            .iter()
            .chain(&self.categorical)
            .chain(&self.drop_columns)
            .map(String::as_str)
            .chain(std::iter::once(target))
            .collect()
    }

    /// Partition the schema into numerical and categorical feature columns.
    ///
    /// Drop-list columns are removed first, then the target. A column that
    /// survives in both roles is a configuration error.
    pub fn resolve(&self, target: &str) -> Result<ResolvedColumns> {
        let dropped: HashSet<&str> = self.drop_columns.iter().map(String::as_str).collect();
        let keep = |cols: &[String]| -> Vec<String> {
            let mut seen = HashSet::new();
            cols.iter()
                .filter(|c| !dropped.contains(c.as_str()) && c.as_str() != target)
                .filter(|c| seen.insert(c.as_str()))
                .cloned()
                .collect()
        };

        let numerical = keep(&self.numerical);
        let categorical = keep(&self.categorical);

        if let Some(both) = numerical.iter().find(|c| categorical.contains(c)) {
            return Err(BackorderError::ConfigError(format!(
                "column '{}' is declared both numerical and categorical",
                both
            )));
        }
        if numerical.is_empty() && categorical.is_empty() {
            return Err(BackorderError::ConfigError(
                "schema resolves to zero feature columns".to_string(),
            ));
        }

        Ok(ResolvedColumns {
            numerical,
            categorical,
            dropped: self.drop_columns.clone(),
            target: target.to_string(),
        })
    }
}
