//! Integration test: acceptance decisions against the model registry

use backorder_ml::components::{
    is_model_accepted, DataValidationArtifact, ModelEvaluation, ModelTrainerArtifact,
};
use backorder_ml::config::{ModelEvaluationConfig, Schema};
use backorder_ml::preprocessing::{FeatureTransformer, LabelEncoder};
use backorder_ml::registry::{LocalObjectStore, ModelResolver, ObjectStore};
use backorder_ml::training::{BackorderModel, ClassificationMetrics, Classifier, DecisionTree};
use backorder_ml::utils::write_csv;
use ndarray::Array1;
use polars::prelude::*;
use std::path::Path;
use tempfile::tempdir;

const TARGET: &str = "went_on_backorder";
const PREFIX: &str = "model-registry";

fn create_dataset() -> DataFrame {
    let qty: Vec<f64> = (0..40).map(|i| i as f64).collect();
    let target: Vec<&str> = (0..40).map(|i| if i >= 20 { "Yes" } else { "No" }).collect();
    df!("qty" => qty, TARGET => target).unwrap()
}

/// A composite model; `inverted` learns the opposite labelling
fn build_model(df: &DataFrame, inverted: bool) -> BackorderModel {
    let columns = Schema {
        numerical: vec!["qty".into()],
        categorical: vec![],
        drop_columns: vec![],
    }
    .resolve(TARGET)
    .unwrap();
    let features = df.drop(TARGET).unwrap();
    let target = df.column(TARGET).unwrap().as_materialized_series().clone();

    let mut preprocessor = FeatureTransformer::new(&columns);
    let x = preprocessor.fit_transform(&features).unwrap();
    let mut encoder = LabelEncoder::new();
    encoder.fit_series(&target).unwrap();
    let mut y = Array1::from_vec(encoder.encode_series(&target).unwrap());
    if inverted {
        y.mapv_inplace(|v| 1 - v);
    }

    let mut model = Classifier::DecisionTree(DecisionTree::new());
    model.fit(&x, &y).unwrap();
    BackorderModel::new(preprocessor, model, encoder).unwrap()
}

fn config(root: &Path) -> ModelEvaluationConfig {
    ModelEvaluationConfig {
        change_threshold: 0.02,
        registry_prefix: PREFIX.to_string(),
        report_path: root.join("model_evaluation/report.yaml"),
        target_column: TARGET.to_string(),
    }
}

fn artifacts(root: &Path, trained: &BackorderModel) -> (DataValidationArtifact, ModelTrainerArtifact) {
    let test_path = root.join("validated/test.csv");
    write_csv(&mut create_dataset(), &test_path).unwrap();
    let model_path = root.join("trained/model.bin");
    trained.save(&model_path).unwrap();

    let metrics = ClassificationMetrics {
        f1_score: 1.0,
        precision_score: 1.0,
        recall_score: 1.0,
        balanced_accuracy: 1.0,
        roc_auc_score: 1.0,
    };
    let validation = DataValidationArtifact {
        validation_status: true,
        valid_train_path: test_path.clone(),
        valid_test_path: test_path,
        invalid_train_path: None,
        invalid_test_path: None,
        drift_report_path: root.join("drift.yaml"),
        drifted_columns: vec![],
    };
    let trainer = ModelTrainerArtifact {
        trained_model_path: model_path,
        train_metrics: metrics,
        test_metrics: metrics,
    };
    (validation, trainer)
}

fn publish(store: &LocalObjectStore, model: &BackorderModel, version: u64) {
    let key = ModelResolver::new(store, PREFIX).model_key(version);
    store.put_bytes(&key, &model.to_bytes().unwrap()).unwrap();
}

#[test]
fn test_empty_registry_accepts() {
    let dir = tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path().join("store"));
    let (validation, trainer) = artifacts(dir.path(), &build_model(&create_dataset(), true));

    let artifact = ModelEvaluation::new(config(dir.path()), &store)
        .initiate_model_evaluation(&validation, &trainer)
        .unwrap();

    assert!(artifact.is_model_accepted);
    assert_eq!(artifact.improved_accuracy, None);
    assert!(dir.path().join("model_evaluation/report.yaml").is_file());
}

#[test]
fn test_better_model_replaces_baseline() {
    let dir = tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path().join("store"));
    let df = create_dataset();
    publish(&store, &build_model(&df, true), 100);
    let (validation, trainer) = artifacts(dir.path(), &build_model(&df, false));

    let artifact = ModelEvaluation::new(config(dir.path()), &store)
        .initiate_model_evaluation(&validation, &trainer)
        .unwrap();

    assert!(artifact.is_model_accepted);
    assert_eq!(artifact.best_model_path.as_deref(), Some("model-registry/100/model.bin"));
    assert_eq!(artifact.trained_model_metrics.balanced_accuracy, 1.0);
    assert_eq!(artifact.best_model_metrics.unwrap().balanced_accuracy, 0.0);
    assert_eq!(artifact.improved_accuracy, Some(1.0));
}

#[test]
fn test_equal_model_is_rejected() {
    let dir = tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path().join("store"));
    let df = create_dataset();
    publish(&store, &build_model(&df, false), 100);
    let (validation, trainer) = artifacts(dir.path(), &build_model(&df, false));

    let artifact = ModelEvaluation::new(config(dir.path()), &store)
        .initiate_model_evaluation(&validation, &trainer)
        .unwrap();

    assert!(!artifact.is_model_accepted);
    assert_eq!(artifact.improved_accuracy, Some(0.0));
}

#[test]
fn test_latest_entry_is_the_baseline() {
    let dir = tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path().join("store"));
    let df = create_dataset();
    // the older entry is the strong one; only the newest counts
    publish(&store, &build_model(&df, false), 100);
    publish(&store, &build_model(&df, true), 200);
    let (validation, trainer) = artifacts(dir.path(), &build_model(&df, false));

    let artifact = ModelEvaluation::new(config(dir.path()), &store)
        .initiate_model_evaluation(&validation, &trainer)
        .unwrap();
    assert!(artifact.is_model_accepted);
    assert_eq!(artifact.best_model_path.as_deref(), Some("model-registry/200/model.bin"));
}

#[test]
fn test_threshold_boundary() {
    assert!(!is_model_accepted(0.75, 0.70, 0.05));
    assert!(is_model_accepted(0.7501, 0.70, 0.05));
    for baseline in [0.0, 0.3, 0.9] {
        assert!(!is_model_accepted(baseline, baseline, 0.0));
    }
}
