//! Lookup of the currently deployed model

use super::store::ObjectStore;
use crate::config::MODEL_FILE_NAME;
use crate::error::{BackorderError, Result};
use serde::{Deserialize, Serialize};

/// One versioned model in the registry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Unix seconds, also the entry's directory name
    pub timestamp: u64,
    /// Object key of the serialized model
    pub key: String,
}

/// Finds registry entries under a prefix. The entry with the greatest
/// integer timestamp is the current best; no metric ranking happens here.
pub struct ModelResolver<'a> {
    store: &'a dyn ObjectStore,
    prefix: String,
}

impl<'a> ModelResolver<'a> {
    pub fn new(store: &'a dyn ObjectStore, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Object key for the model stored under `timestamp`
    pub fn model_key(&self, timestamp: u64) -> String {
        format!("{}/{}/{}", self.prefix, timestamp, MODEL_FILE_NAME)
    }

    /// All entries in ascending timestamp order.
    /// A non-integer entry name makes the registry malformed.
    pub fn entries(&self) -> Result<Vec<RegistryEntry>> {
        let mut entries = self
            .store
            .list(&self.prefix)?
            .into_iter()
            .map(|name| {
                let timestamp = name
                    .parse::<u64>()
                    .map_err(|_| BackorderError::RegistryMalformed(name.clone()))?;
                Ok(RegistryEntry {
                    timestamp,
                    key: self.model_key(timestamp),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(!self.store.list(&self.prefix)?.is_empty())
    }

    /// Newest entry, or `None` on an empty registry
    pub fn latest(&self) -> Result<Option<RegistryEntry>> {
        Ok(self.entries()?.pop())
    }

    /// Key of the newest entry; an empty registry is an error here
    pub fn best_path(&self) -> Result<String> {
        self.latest()?
            .map(|entry| entry.key)
            .ok_or_else(|| BackorderError::RegistryEmpty(self.prefix.clone()))
    }

    /// Timestamp for a new entry: `now`, bumped past the latest existing one
    pub fn next_version(&self, now: u64) -> Result<u64> {
        Ok(match self.latest()? {
            Some(entry) => now.max(entry.timestamp + 1),
            None => now,
        })
    }
}
