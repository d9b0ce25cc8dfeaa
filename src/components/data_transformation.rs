//! Data transformation: feature pipeline, label encoding and resampling

use super::artifacts::{DataTransformationArtifact, DataValidationArtifact};
use crate::config::{DataTransformationConfig, Schema};
use crate::error::{BackorderError, Result};
use crate::preprocessing::{FeatureTransformer, LabelEncoder, PreprocessingConfig};
use crate::synthetic::{Sampler, SmoteTomek};
use crate::utils::{read_csv, save_array, save_object};
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use tracing::info;

/// Append the encoded label as the last column
pub fn join_features_and_label(x: &Array2<f64>, y: &Array1<i64>) -> Result<Array2<f64>> {
    let label = y.mapv(|v| v as f64).insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[x.view(), label.view()])?)
}

/// Inverse of [`join_features_and_label`]
pub fn split_features_and_label(arr: &Array2<f64>) -> Result<(Array2<f64>, Array1<i64>)> {
    if arr.ncols() < 2 {
        return Err(BackorderError::ShapeError {
            expected: "at least one feature column plus the label".to_string(),
            actual: format!("{} columns", arr.ncols()),
        });
    }
    let last = arr.ncols() - 1;
    let x = arr.slice(ndarray::s![.., ..last]).to_owned();
    let y = arr.column(last).mapv(|v| v.round() as i64);
    Ok((x, y))
}

pub struct DataTransformation {
    config: DataTransformationConfig,
    schema: Schema,
}

impl DataTransformation {
    /// Load the schema from the configured path
    pub fn new(config: DataTransformationConfig) -> Result<Self> {
        let schema = Schema::from_yaml_file(&config.schema_path)?;
        Ok(Self::with_schema(config, schema))
    }

    pub fn with_schema(config: DataTransformationConfig, schema: Schema) -> Self {
        Self { config, schema }
    }

    /// An unfitted feature transformer for this schema
    pub fn get_data_transformer_object(&self) -> Result<FeatureTransformer> {
        let columns = self.schema.resolve(&self.config.target_column)?;
        let preprocessing =
            PreprocessingConfig::default().with_handle_unknown(self.config.unknown_categories);
        Ok(FeatureTransformer::with_config(&columns, preprocessing))
    }

    /// Split a table into input features and the target column
    fn separate_target(&self, df: &DataFrame) -> Result<(DataFrame, Series)> {
        let target = df
            .column(&self.config.target_column)
            .map_err(|_| BackorderError::FeatureNotFound(self.config.target_column.clone()))?
            .as_materialized_series()
            .clone();
        let features = df.drop(&self.config.target_column)?;
        Ok((features, target))
    }

    pub fn initiate_data_transformation(
        &self,
        validation: &DataValidationArtifact,
    ) -> Result<DataTransformationArtifact> {
        let train = read_csv(&validation.valid_train_path)?;
        let test = read_csv(&validation.valid_test_path)?;

        let (train_features, train_target) = self.separate_target(&train)?;
        let (test_features, test_target) = self.separate_target(&test)?;

        // everything below is fitted on the training fold only
        let mut preprocessor = self.get_data_transformer_object()?;
        let x_train = preprocessor.fit_transform(&train_features)?;
        let x_test = preprocessor.transform(&test_features)?;

        let mut label_encoder = LabelEncoder::new();
        label_encoder.fit_series(&train_target)?;
        let y_train = Array1::from_vec(label_encoder.encode_series(&train_target)?);
        let y_test = Array1::from_vec(label_encoder.encode_series(&test_target)?);

        let mut sampler = SmoteTomek::new()
            .with_k_neighbors(self.config.smote_k_neighbors)
            .with_seed(self.config.random_state);
        let resampled = sampler.fit_resample(&x_train, &y_train)?;

        save_array(
            &self.config.transformed_train_path,
            &join_features_and_label(&resampled.x, &resampled.y)?,
        )?;
        save_array(
            &self.config.transformed_test_path,
            &join_features_and_label(&x_test, &y_test)?,
        )?;
        preprocessor.save(&self.config.preprocessor_path)?;
        save_object(&self.config.label_encoder_path, &label_encoder)?;

        info!(
            train_rows = resampled.x.nrows(),
            test_rows = x_test.nrows(),
            features = preprocessor.n_features(),
            classes = ?label_encoder.classes(),
            "data transformation complete"
        );

        Ok(DataTransformationArtifact {
            preprocessor_path: self.config.preprocessor_path.clone(),
            label_encoder_path: self.config.label_encoder_path.clone(),
            transformed_train_path: self.config.transformed_train_path.clone(),
            transformed_test_path: self.config.transformed_test_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::HandleUnknown;
    use crate::synthetic::class_counts;
    use crate::utils::{load_array, load_object, write_csv};
    use ndarray::array;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_label_is_last_column() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0, 1];
        let joined = join_features_and_label(&x, &y).unwrap();
        assert_eq!(joined.column(2).to_vec(), vec![0.0, 1.0]);

        let (x2, y2) = split_features_and_label(&joined).unwrap();
        assert_eq!(x2, x);
        assert_eq!(y2, y);
    }

    fn config(root: &Path) -> DataTransformationConfig {
        DataTransformationConfig {
            schema_path: root.join("schema.yaml"),
            target_column: "went_on_backorder".to_string(),
            transformed_train_path: root.join("transformed/train.bin"),
            transformed_test_path: root.join("transformed/test.bin"),
            preprocessor_path: root.join("objects/preprocessing.bin"),
            label_encoder_path: root.join("objects/label_encoder.bin"),
            unknown_categories: HandleUnknown::Ignore,
            smote_k_neighbors: 3,
            random_state: 7,
        }
    }

    fn frame(n: usize) -> DataFrame {
        let qty: Vec<f64> = (0..n).map(|i| (i % 17) as f64).collect();
        let risk: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Yes" } else { "No" }).collect();
        let target: Vec<&str> = (0..n).map(|i| if i % 6 == 0 { "Yes" } else { "No" }).collect();
        df!("qty" => qty, "risk" => risk, "went_on_backorder" => target).unwrap()
    }

    #[test]
    fn test_transformation_stage_outputs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let (train_path, test_path) = (root.join("valid/train.csv"), root.join("valid/test.csv"));
        write_csv(&mut frame(60), &train_path).unwrap();
        write_csv(&mut frame(20), &test_path).unwrap();

        let schema = Schema {
            numerical: vec!["qty".into()],
            categorical: vec!["risk".into()],
            drop_columns: vec![],
        };
        let validation = DataValidationArtifact {
            validation_status: true,
            valid_train_path: train_path,
            valid_test_path: test_path,
            invalid_train_path: None,
            invalid_test_path: None,
            drift_report_path: root.join("report.yaml"),
            drifted_columns: vec![],
        };

        let artifact = DataTransformation::with_schema(config(root), schema)
            .initiate_data_transformation(&validation)
            .unwrap();

        let test = load_array(&artifact.transformed_test_path).unwrap();
        // qty + risk_Yes + label
        assert_eq!(test.shape(), &[20, 3]);

        let train = load_array(&artifact.transformed_train_path).unwrap();
        let (_, y_train) = split_features_and_label(&train).unwrap();
        let counts = class_counts(&y_train);
        assert!(counts[&1] > 10, "minority class should be oversampled");

        let encoder: LabelEncoder = load_object(&artifact.label_encoder_path).unwrap();
        assert_eq!(encoder.classes(), &["No".to_string(), "Yes".to_string()]);
        assert!(FeatureTransformer::load(&artifact.preprocessor_path).unwrap().is_fitted());
    }
}
