//! Data validation: column checks and train/test drift report

use super::artifacts::{DataIngestionArtifact, DataValidationArtifact};
use crate::config::{write_yaml_file, DataValidationConfig, Schema};
use crate::drift::{DriftDetector, DriftResult, KolmogorovSmirnovTest};
use crate::error::{BackorderError, Result};
use crate::utils::{read_csv, write_csv};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Per-column drift results, keyed by column name
pub type DriftReport = BTreeMap<String, DriftResult>;

pub struct DataValidation {
    config: DataValidationConfig,
    schema: Schema,
}

impl DataValidation {
    /// Load the schema from the configured path
    pub fn new(config: DataValidationConfig) -> Result<Self> {
        let schema = Schema::from_yaml_file(&config.schema_path)?;
        Ok(Self::with_schema(config, schema))
    }

    pub fn with_schema(config: DataValidationConfig, schema: Schema) -> Self {
        Self { config, schema }
    }

    pub fn read_data(path: impl AsRef<Path>) -> Result<DataFrame> {
        read_csv(path)
    }

    fn missing<'a>(df: &DataFrame, columns: &'a [String]) -> Vec<&'a str> {
        columns
            .iter()
            .map(String::as_str)
            .filter(|c| df.get_column_index(c).is_none())
            .collect()
    }

    /// Every column is known to the schema, and every required column is present
    pub fn validate_number_of_columns(&self, df: &DataFrame) -> bool {
        let known = self.schema.known_columns(&self.config.target_column);
        let unexpected: Vec<&str> = df
            .get_column_names()
            .into_iter()
            .map(|c| c.as_str())
            .filter(|c| !known.contains(c))
            .collect();

        let target_present = df.get_column_index(&self.config.target_column).is_some();

        if !unexpected.is_empty() {
            warn!(columns = ?unexpected, "columns not declared in the schema");
        }
        if !target_present {
            warn!(target = %self.config.target_column, "target column missing");
        }
        unexpected.is_empty()
            && target_present
            && Self::missing(df, &self.schema.numerical).is_empty()
            && Self::missing(df, &self.schema.categorical).is_empty()
    }

    pub fn is_numerical_columns_exist(&self, df: &DataFrame) -> bool {
        let missing = Self::missing(df, &self.schema.numerical);
        if !missing.is_empty() {
            warn!(columns = ?missing, "missing numerical columns");
        }
        missing.is_empty()
    }

    pub fn is_categorical_columns_exist(&self, df: &DataFrame) -> bool {
        let missing = Self::missing(df, &self.schema.categorical);
        if !missing.is_empty() {
            warn!(columns = ?missing, "missing categorical columns");
        }
        missing.is_empty()
    }

    /// KS test per numerical column present in both tables; writes the YAML report
    pub fn detect_dataset_drift(&self, base: &DataFrame, current: &DataFrame) -> Result<DriftReport> {
        let detector = KolmogorovSmirnovTest::new(self.config.drift_alpha);
        let mut report = DriftReport::new();

        for name in &self.schema.numerical {
            let (Ok(a), Ok(b)) = (base.column(name), current.column(name)) else {
                continue;
            };
            let a: Vec<Option<f64>> = a.cast(&DataType::Float64)?.f64()?.into_iter().collect();
            let b: Vec<Option<f64>> = b.cast(&DataType::Float64)?.f64()?.into_iter().collect();

            match detector.detect(&a, &b) {
                Ok(result) => {
                    if result.drift_detected {
                        warn!(column = %name, p_value = result.p_value, "drift detected");
                    }
                    report.insert(name.clone(), result);
                }
                // an all-null column carries no distribution to compare
                Err(BackorderError::ValidationError(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        write_yaml_file(&self.config.drift_report_path, &report)?;
        Ok(report)
    }

    fn check(&self, df: &DataFrame, fold: &str) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.validate_number_of_columns(df) {
            problems.push(format!("{} columns do not match the schema", fold));
        }
        if !self.is_numerical_columns_exist(df) {
            problems.push(format!("{} is missing numerical columns", fold));
        }
        if !self.is_categorical_columns_exist(df) {
            problems.push(format!("{} is missing categorical columns", fold));
        }
        problems
    }

    pub fn initiate_data_validation(
        &self,
        ingestion: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact> {
        let mut train = Self::read_data(&ingestion.train_path)?;
        let mut test = Self::read_data(&ingestion.test_path)?;

        let mut problems = self.check(&train, "train");
        problems.extend(self.check(&test, "test"));

        if !problems.is_empty() {
            write_csv(&mut train, &self.config.invalid_train_path)?;
            write_csv(&mut test, &self.config.invalid_test_path)?;
            return Err(BackorderError::ValidationError(problems.join("; ")));
        }

        let report = self.detect_dataset_drift(&train, &test)?;
        let drifted_columns: Vec<String> = report
            .iter()
            .filter(|(_, r)| r.drift_detected)
            .map(|(name, _)| name.clone())
            .collect();

        write_csv(&mut train, &self.config.valid_train_path)?;
        write_csv(&mut test, &self.config.valid_test_path)?;
        info!(
            tested = report.len(),
            drifted = drifted_columns.len(),
            "data validation passed"
        );

        Ok(DataValidationArtifact {
            validation_status: true,
            valid_train_path: self.config.valid_train_path.clone(),
            valid_test_path: self.config.valid_test_path.clone(),
            invalid_train_path: None,
            invalid_test_path: None,
            drift_report_path: self.config.drift_report_path.clone(),
            drifted_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema {
            numerical: vec!["qty".into()],
            categorical: vec!["risk".into()],
            drop_columns: vec!["sku".into()],
        }
    }

    fn config(root: &Path) -> DataValidationConfig {
        DataValidationConfig {
            schema_path: root.join("schema.yaml"),
            target_column: "went_on_backorder".to_string(),
            valid_train_path: root.join("validated/train.csv"),
            valid_test_path: root.join("validated/test.csv"),
            invalid_train_path: root.join("invalid/train.csv"),
            invalid_test_path: root.join("invalid/test.csv"),
            drift_report_path: root.join("drift_report/report.yaml"),
            drift_alpha: 0.05,
        }
    }

    fn frame(offset: f64) -> DataFrame {
        let qty: Vec<f64> = (0..60).map(|i| i as f64 + offset).collect();
        let risk: Vec<&str> = (0..60).map(|i| if i % 3 == 0 { "Yes" } else { "No" }).collect();
        let sku: Vec<String> = (0..60).map(|i| format!("s{}", i)).collect();
        let target: Vec<&str> = (0..60).map(|i| if i % 5 == 0 { "Yes" } else { "No" }).collect();
        df!("sku" => sku, "qty" => qty, "risk" => risk, "went_on_backorder" => target).unwrap()
    }

    fn ingested(root: &Path, mut train: DataFrame, mut test: DataFrame) -> DataIngestionArtifact {
        let train_path = root.join("ingested/train.csv");
        let test_path = root.join("ingested/test.csv");
        write_csv(&mut train, &train_path).unwrap();
        write_csv(&mut test, &test_path).unwrap();
        DataIngestionArtifact {
            feature_store_path: root.join("feature_store.csv"),
            train_path,
            test_path,
            reused: false,
        }
    }

    #[test]
    fn test_column_checks() {
        let dir = tempdir().unwrap();
        let validation = DataValidation::with_schema(config(dir.path()), schema());
        let df = frame(0.0);
        assert!(validation.validate_number_of_columns(&df));

        let mut extra = df.clone();
        extra
            .with_column(Series::new("surprise".into(), vec![1i64; 60]))
            .unwrap();
        assert!(!validation.validate_number_of_columns(&extra));

        let no_risk = df.drop("risk").unwrap();
        assert!(!validation.is_categorical_columns_exist(&no_risk));
        assert!(validation.is_numerical_columns_exist(&no_risk));
    }

    #[test]
    fn test_valid_run_writes_report_and_files() {
        let dir = tempdir().unwrap();
        let validation = DataValidation::with_schema(config(dir.path()), schema());
        let artifact = validation
            .initiate_data_validation(&ingested(dir.path(), frame(0.0), frame(0.0)))
            .unwrap();

        assert!(artifact.validation_status);
        assert!(artifact.valid_train_path.is_file());
        assert!(artifact.drifted_columns.is_empty());
        let report: DriftReport = crate::config::read_yaml_file(&artifact.drift_report_path).unwrap();
        assert_eq!(report["qty"].statistic, 0.0);
    }

    #[test]
    fn test_drift_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let validation = DataValidation::with_schema(config(dir.path()), schema());
        let artifact = validation
            .initiate_data_validation(&ingested(dir.path(), frame(0.0), frame(100.0)))
            .unwrap();
        assert_eq!(artifact.drifted_columns, vec!["qty"]);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir = tempdir().unwrap();
        let validation = DataValidation::with_schema(config(dir.path()), schema());
        let broken = frame(0.0).drop("qty").unwrap();
        let result = validation.initiate_data_validation(&ingested(dir.path(), frame(0.0), broken));

        assert!(matches!(result, Err(BackorderError::ValidationError(_))));
        assert!(dir.path().join("invalid/test.csv").is_file());
    }
}
