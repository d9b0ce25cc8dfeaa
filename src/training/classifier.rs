//! Closed set of classifiers the pipeline can train and persist

use super::decision_tree::DecisionTree;
use super::linear_models::LogisticRegression;
use super::models::Predictor;
use super::random_forest::RandomForest;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A trainable classifier variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl Classifier {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        match self {
            Classifier::LogisticRegression(m) => {
                m.fit(x, y)?;
            }
            Classifier::DecisionTree(m) => {
                m.fit(x, y)?;
            }
            Classifier::RandomForest(m) => {
                m.fit(x, y)?;
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Classifier::LogisticRegression(_) => "LogisticRegression",
            Classifier::DecisionTree(_) => "DecisionTreeClassifier",
            Classifier::RandomForest(_) => "RandomForestClassifier",
        }
    }

    /// Per-feature importances, when the model exposes them
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        match self {
            Classifier::LogisticRegression(m) => {
                m.coefficients.as_ref().map(|c| c.mapv(f64::abs))
            }
            Classifier::DecisionTree(m) => m.feature_importances().cloned(),
            Classifier::RandomForest(m) => m.feature_importances().cloned(),
        }
    }
}

impl Predictor for Classifier {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        match self {
            Classifier::LogisticRegression(m) => m.predict(x),
            Classifier::DecisionTree(m) => m.predict(x),
            Classifier::RandomForest(m) => m.predict(x),
        }
    }
}
