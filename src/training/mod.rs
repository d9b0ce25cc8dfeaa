//! Model training module
//!
//! Provides the classifiers the pipeline can train:
//! - Logistic regression
//! - Decision trees and Random Forests
//!
//! plus the configuration-driven [`ModelFactory`], the shared
//! [`ClassificationMetrics`], and the deployable [`BackorderModel`].

mod classifier;
mod estimator;
mod models;
pub mod decision_tree;
pub mod factory;
pub mod linear_models;
pub mod random_forest;

pub use classifier::Classifier;
pub use decision_tree::{Criterion, DecisionTree, MaxFeatures, TreeNode};
pub use estimator::BackorderModel;
pub use factory::{Constructor, ModelFactory};
pub use linear_models::LogisticRegression;
pub use models::{balanced_accuracy, roc_auc, ClassificationMetrics, Predictor, POSITIVE_LABEL};
pub use random_forest::RandomForest;
