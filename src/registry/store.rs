//! Object storage backends

use crate::error::{BackorderError, Result};
use crate::utils::{csv_bytes, read_csv_bytes};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Key/value blob storage addressed by `/`-separated keys.
///
/// Failures are returned as-is; callers decide whether to abort.
pub trait ObjectStore: Send + Sync {
    /// Whether an object or a non-empty prefix exists at `key`
    fn exists(&self, key: &str) -> Result<bool>;

    /// Names of the immediate children under `prefix`, sorted
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Copy a local file to `key`
    fn upload(&self, local: &Path, key: &str) -> Result<()>;

    fn put_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn download(&self, key: &str) -> Result<Vec<u8>>;

    /// Download and parse a CSV object
    fn read_csv(&self, key: &str) -> Result<DataFrame> {
        read_csv_bytes(self.download(key)?)
    }

    /// Serialize `df` as CSV and store it at `key`
    fn write_csv(&self, key: &str, df: &mut DataFrame) -> Result<()> {
        let bytes = csv_bytes(df)?;
        self.put_bytes(key, &bytes)
    }
}

/// Stores objects as files below a root directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path, rejecting keys that would escape the root
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(BackorderError::ConfigError(format!(
                "invalid object key '{}'",
                key
            )));
        }
        Ok(self.root.join(relative))
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ObjectStore for LocalObjectStore {
    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        if path.is_dir() {
            return Ok(fs::read_dir(&path)?.next().is_some());
        }
        Ok(path.is_file())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let path = self.path_for(prefix)?;
        if !path.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn upload(&self, local: &Path, key: &str) -> Result<()> {
        let dest = self.path_for(key)?;
        Self::ensure_parent(&dest)?;
        fs::copy(local, &dest).map_err(|e| {
            BackorderError::DataError(format!("cannot upload {}: {}", local.display(), e))
        })?;
        debug!(key, from = %local.display(), "uploaded object");
        Ok(())
    }

    fn put_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let dest = self.path_for(key)?;
        Self::ensure_parent(&dest)?;
        fs::write(&dest, bytes)?;
        debug!(key, bytes = bytes.len(), "stored object");
        Ok(())
    }

    fn download(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(BackorderError::ObjectNotFound(key.to_string()));
        }
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn test_put_download_and_list() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put_bytes("registry/200/model.bin", b"b").unwrap();
        store.put_bytes("registry/100/model.bin", b"a").unwrap();

        assert_eq!(store.download("registry/100/model.bin").unwrap(), b"a");
        assert_eq!(store.list("registry").unwrap(), vec!["100", "200"]);
        assert!(store.exists("registry").unwrap());
        assert!(!store.exists("other").unwrap());
    }

    #[test]
    fn test_missing_object() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(matches!(
            store.download("nope.csv"),
            Err(BackorderError::ObjectNotFound(_))
        ));
        assert!(store.list("nope").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(store.put_bytes("../outside.bin", b"x").is_err());
    }

    #[test]
    fn test_csv_through_store() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let mut df = df!("sku" => &["a", "b"], "qty" => &[1.0, 2.0]).unwrap();

        store.write_csv("prediction/input.csv", &mut df).unwrap();
        let loaded = store.read_csv("prediction/input.csv").unwrap();
        assert_eq!(loaded.shape(), (2, 2));
    }

    #[test]
    fn test_upload_copies_file() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("model.bin");
        std::fs::write(&local, b"weights").unwrap();
        let store = LocalObjectStore::new(dir.path().join("store"));

        store.upload(&local, "model-registry/1/model.bin").unwrap();
        assert_eq!(store.download("model-registry/1/model.bin").unwrap(), b"weights");
    }
}
