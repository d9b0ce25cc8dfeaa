//! Deployable bundle of preprocessor, classifier and label encoder

use super::classifier::Classifier;
use super::models::Predictor;
use crate::error::{BackorderError, Result};
use crate::preprocessing::{FeatureTransformer, LabelEncoder};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The unit that gets serialized, pushed to the registry and loaded for
/// scoring. Owns all three fitted parts; scoring never refits any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackorderModel {
    preprocessor: FeatureTransformer,
    model: Classifier,
    label_encoder: LabelEncoder,
}

impl BackorderModel {
    pub fn new(
        preprocessor: FeatureTransformer,
        model: Classifier,
        label_encoder: LabelEncoder,
    ) -> Result<Self> {
        if !preprocessor.is_fitted() {
            return Err(BackorderError::ModelNotFitted);
        }
        if !label_encoder.is_fitted() {
            return Err(BackorderError::ModelNotFitted);
        }
        Ok(Self {
            preprocessor,
            model,
            label_encoder,
        })
    }

    /// Encoded predictions for a raw table
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<i64>> {
        let features = self.preprocessor.transform(df)?;
        self.model.predict(&features)
    }

    /// Predictions decoded back to the original target labels
    pub fn predict_labels(&self, df: &DataFrame) -> Result<Vec<String>> {
        let codes = self.predict(df)?;
        self.label_encoder.decode(&codes.to_vec())
    }

    pub fn preprocessor(&self) -> &FeatureTransformer {
        &self.preprocessor
    }

    pub fn model(&self) -> &Classifier {
        &self.model
    }

    pub fn label_encoder(&self) -> &LabelEncoder {
        &self.label_encoder
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::utils::save_object(path, self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::utils::load_object(path)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Already-transformed features go straight to the classifier
impl Predictor for BackorderModel {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        self.model.predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Schema;
    use crate::training::DecisionTree;

    fn fitted() -> (BackorderModel, DataFrame) {
        let df = df!(
            "qty" => &[1.0, 2.0, 3.0, 10.0, 11.0, 12.0],
            "risk" => &["No", "No", "Yes", "Yes", "No", "Yes"],
            "went_on_backorder" => &["No", "No", "No", "Yes", "Yes", "Yes"],
        )
        .unwrap();
        let columns = Schema {
            numerical: vec!["qty".into()],
            categorical: vec!["risk".into()],
            drop_columns: vec![],
        }
        .resolve("went_on_backorder")
        .unwrap();

        let mut preprocessor = FeatureTransformer::new(&columns);
        let x = preprocessor.fit_transform(&df).unwrap();
        let mut encoder = LabelEncoder::new();
        encoder
            .fit_series(df.column("went_on_backorder").unwrap().as_materialized_series())
            .unwrap();
        let y = Array1::from_vec(
            encoder
                .encode_series(df.column("went_on_backorder").unwrap().as_materialized_series())
                .unwrap(),
        );
        let mut model = Classifier::DecisionTree(DecisionTree::new());
        model.fit(&x, &y).unwrap();

        (BackorderModel::new(preprocessor, model, encoder).unwrap(), df)
    }

    #[test]
    fn test_predict_labels_decodes() {
        let (model, df) = fitted();
        assert_eq!(
            model.predict_labels(&df).unwrap(),
            vec!["No", "No", "No", "Yes", "Yes", "Yes"]
        );
    }

    #[test]
    fn test_bytes_round_trip_preserves_predictions() {
        let (model, df) = fitted();
        let restored = BackorderModel::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.predict(&df).unwrap(), model.predict(&df).unwrap());
    }

    #[test]
    fn test_requires_fitted_parts() {
        let columns = Schema {
            numerical: vec!["qty".into()],
            categorical: vec![],
            drop_columns: vec![],
        }
        .resolve("t")
        .unwrap();
        let result = BackorderModel::new(
            FeatureTransformer::new(&columns),
            Classifier::DecisionTree(DecisionTree::new()),
            LabelEncoder::new(),
        );
        assert!(matches!(result, Err(BackorderError::ModelNotFitted)));
    }
}
