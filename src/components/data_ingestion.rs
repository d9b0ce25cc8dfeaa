//! Data ingestion: collection export and train/test split

use super::artifacts::DataIngestionArtifact;
use crate::config::DataIngestionConfig;
use crate::error::{BackorderError, Result};
use crate::utils::{read_csv_with_nulls, write_csv};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tracing::info;

/// Token the raw export uses for missing values
pub const MISSING_VALUE_TOKEN: &str = "na";

/// Document-store identifier column, never a feature
pub const DOCUMENT_ID_COLUMN: &str = "_id";

/// Anything that can hand over a whole collection as a table
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, collection: &str) -> Result<DataFrame>;
}

/// Reads `<dir>/<collection>.csv`
#[derive(Debug, Clone)]
pub struct CsvDocumentSource {
    dir: PathBuf,
}

impl CsvDocumentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSource for CsvDocumentSource {
    fn fetch(&self, collection: &str) -> Result<DataFrame> {
        let path = self.dir.join(format!("{}.csv", collection));
        let mut df = read_csv_with_nulls(&path, MISSING_VALUE_TOKEN)?;
        if df.get_column_index(DOCUMENT_ID_COLUMN).is_some() {
            df = df.drop(DOCUMENT_ID_COLUMN)?;
        }
        info!(collection, rows = df.height(), columns = df.width(), "fetched collection");
        Ok(df)
    }
}

pub struct DataIngestion {
    config: DataIngestionConfig,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig) -> Self {
        Self { config }
    }

    /// Pull the collection and persist it to the feature store
    pub fn export_data_into_feature_store(&self, source: &dyn DocumentSource) -> Result<DataFrame> {
        let mut df = source.fetch(&self.config.collection_name)?;
        if df.height() == 0 {
            return Err(BackorderError::EmptyInput(format!(
                "collection '{}' is empty",
                self.config.collection_name
            )));
        }
        write_csv(&mut df, &self.config.feature_store_path)?;
        Ok(df)
    }

    /// Seeded shuffle split; the test fold gets `ceil(n * split_ratio)` rows
    pub fn split_data_as_train_test(&self, df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        let n = df.height();
        let n_test = (n as f64 * self.config.split_ratio).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(BackorderError::DataError(format!(
                "cannot split {} rows with ratio {}",
                n, self.config.split_ratio
            )));
        }

        let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        indices.shuffle(&mut rng);

        let test_idx = IdxCa::from_vec("idx".into(), indices[..n_test].to_vec());
        let train_idx = IdxCa::from_vec("idx".into(), indices[n_test..].to_vec());
        let mut train = df.take(&train_idx)?;
        let mut test = df.take(&test_idx)?;

        write_csv(&mut train, &self.config.train_path)?;
        write_csv(&mut test, &self.config.test_path)?;
        info!(train = train.height(), test = test.height(), "split feature store");
        Ok((train, test))
    }

    pub fn initiate_data_ingestion(&self, source: &dyn DocumentSource) -> Result<DataIngestionArtifact> {
        if self.config.train_path.is_file() && self.config.test_path.is_file() {
            info!(
                train = %self.config.train_path.display(),
                test = %self.config.test_path.display(),
                "train/test files already present, skipping ingestion"
            );
            return Ok(self.artifact(true));
        }

        let df = self.export_data_into_feature_store(source)?;
        self.split_data_as_train_test(&df)?;
        Ok(self.artifact(false))
    }

    fn artifact(&self, reused: bool) -> DataIngestionArtifact {
        DataIngestionArtifact {
            feature_store_path: self.config.feature_store_path.clone(),
            train_path: self.config.train_path.clone(),
            test_path: self.config.test_path.clone(),
            reused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::read_csv;
    use tempfile::tempdir;

    struct FixedSource(DataFrame);

    impl DocumentSource for FixedSource {
        fn fetch(&self, _collection: &str) -> Result<DataFrame> {
            Ok(self.0.clone())
        }
    }

    fn config(root: &std::path::Path) -> DataIngestionConfig {
        DataIngestionConfig {
            collection_name: "back_orders".to_string(),
            feature_store_path: root.join("feature_store/back_order.csv"),
            train_path: root.join("ingested/train.csv"),
            test_path: root.join("ingested/test.csv"),
            split_ratio: 0.2,
            random_state: 42,
        }
    }

    fn table(n: usize) -> DataFrame {
        let qty: Vec<f64> = (0..n).map(|i| i as f64).collect();
        df!("qty" => qty).unwrap()
    }

    #[test]
    fn test_split_sizes_and_disjoint() {
        let dir = tempdir().unwrap();
        let ingestion = DataIngestion::new(config(dir.path()));
        let (train, test) = ingestion.split_data_as_train_test(&table(10)).unwrap();
        assert_eq!(train.height(), 8);
        assert_eq!(test.height(), 2);

        let mut all: Vec<f64> = train
            .column("qty")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .chain(test.column("qty").unwrap().f64().unwrap().into_no_null_iter())
            .collect();
        all.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(all, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_short_circuit_when_files_exist() {
        let dir = tempdir().unwrap();
        let ingestion = DataIngestion::new(config(dir.path()));
        let first = ingestion
            .initiate_data_ingestion(&FixedSource(table(10)))
            .unwrap();
        assert!(!first.reused);

        // a different source would change the split, but it is never consulted
        let second = ingestion
            .initiate_data_ingestion(&FixedSource(table(50)))
            .unwrap();
        assert!(second.reused);
        assert_eq!(read_csv(&second.train_path).unwrap().height(), 8);
    }

    #[test]
    fn test_csv_source_drops_id_and_reads_na() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("back_orders.csv"),
            "_id,lead_time,went_on_backorder\n1,8,No\n2,na,Yes\n",
        )
        .unwrap();
        let df = CsvDocumentSource::new(dir.path()).fetch("back_orders").unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["lead_time", "went_on_backorder"]);
        assert_eq!(df.column("lead_time").unwrap().null_count(), 1);
    }

    #[test]
    fn test_empty_collection_rejected() {
        let dir = tempdir().unwrap();
        let ingestion = DataIngestion::new(config(dir.path()));
        let empty = table(0);
        assert!(ingestion.initiate_data_ingestion(&FixedSource(empty)).is_err());
    }
}
