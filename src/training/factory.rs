//! Model factory: configuration identifier to constructed classifier

use super::classifier::Classifier;
use super::decision_tree::{Criterion, DecisionTree, MaxFeatures};
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use crate::config::ModelSpec;
use crate::error::{BackorderError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

/// Builds an unfitted classifier from a hyperparameter mapping
pub type Constructor = fn(&serde_yaml::Value) -> Result<Classifier>;

pub const LOGISTIC_REGRESSION: &str = "linear_model.LogisticRegression";
pub const DECISION_TREE: &str = "tree.DecisionTreeClassifier";
pub const RANDOM_FOREST: &str = "ensemble.RandomForestClassifier";

/// Registry of supported model kinds keyed by `module.class`
#[derive(Clone)]
pub struct ModelFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl std::fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFactory")
            .field("supported", &self.supported())
            .finish()
    }
}

impl Default for ModelFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(LOGISTIC_REGRESSION, build_logistic_regression);
        factory.register(DECISION_TREE, build_decision_tree);
        factory.register(RANDOM_FOREST, build_random_forest);
        factory
    }
}

impl ModelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with nothing registered
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, identifier: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(identifier.into(), constructor);
    }

    /// Registered identifiers in sorted order
    pub fn supported(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn is_supported(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }

    /// Resolve `spec` and construct the model with its hyperparameters
    pub fn create(&self, spec: &ModelSpec) -> Result<Classifier> {
        let identifier = spec.identifier();
        let constructor = self
            .constructors
            .get(&identifier)
            .ok_or_else(|| BackorderError::UnknownModel(identifier.clone()))?;
        let model = constructor(&spec.params)?;
        info!(model = %identifier, "model constructed from configuration");
        Ok(model)
    }

    /// Check that `spec` names a registered model with well-formed params
    pub fn validate(&self, spec: &ModelSpec) -> Result<()> {
        self.create(spec).map(|_| ())
    }
}

fn parse_params<P: DeserializeOwned>(model: &str, params: &serde_yaml::Value) -> Result<P> {
    let value = if params.is_null() {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
    } else {
        params.clone()
    };
    serde_yaml::from_value(value).map_err(|e| BackorderError::InvalidParameter {
        model: model.to_string(),
        reason: e.to_string(),
    })
}

fn invalid(model: &str, reason: impl Into<String>) -> BackorderError {
    BackorderError::InvalidParameter {
        model: model.to_string(),
        reason: reason.into(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LogisticRegressionParams {
    alpha: f64,
    max_iter: usize,
    learning_rate: f64,
    tol: f64,
    fit_intercept: bool,
    threshold: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        let base = LogisticRegression::new();
        Self {
            alpha: base.alpha,
            max_iter: base.max_iter,
            learning_rate: base.learning_rate,
            tol: base.tol,
            fit_intercept: base.fit_intercept,
            threshold: base.threshold,
        }
    }
}

fn build_logistic_regression(params: &serde_yaml::Value) -> Result<Classifier> {
    let p: LogisticRegressionParams = parse_params(LOGISTIC_REGRESSION, params)?;
    if p.alpha < 0.0 {
        return Err(invalid(LOGISTIC_REGRESSION, "alpha must be non-negative"));
    }
    if p.learning_rate <= 0.0 {
        return Err(invalid(LOGISTIC_REGRESSION, "learning_rate must be positive"));
    }
    if !(0.0..=1.0).contains(&p.threshold) {
        return Err(invalid(LOGISTIC_REGRESSION, "threshold must be in [0, 1]"));
    }
    Ok(Classifier::LogisticRegression(
        LogisticRegression::new()
            .with_alpha(p.alpha)
            .with_max_iter(p.max_iter)
            .with_learning_rate(p.learning_rate)
            .with_tol(p.tol)
            .with_fit_intercept(p.fit_intercept)
            .with_threshold(p.threshold),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DecisionTreeParams {
    criterion: Criterion,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
    random_state: Option<u64>,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: None,
        }
    }
}

fn check_tree_params(
    model: &str,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
) -> Result<()> {
    if max_depth == Some(0) {
        return Err(invalid(model, "max_depth must be at least 1"));
    }
    if min_samples_split < 2 {
        return Err(invalid(model, "min_samples_split must be at least 2"));
    }
    if min_samples_leaf < 1 {
        return Err(invalid(model, "min_samples_leaf must be at least 1"));
    }
    if let MaxFeatures::Fraction(f) = max_features {
        if !(f > 0.0 && f <= 1.0) {
            return Err(invalid(model, "max_features fraction must be in (0, 1]"));
        }
    }
    Ok(())
}

fn build_decision_tree(params: &serde_yaml::Value) -> Result<Classifier> {
    let p: DecisionTreeParams = parse_params(DECISION_TREE, params)?;
    check_tree_params(
        DECISION_TREE,
        p.max_depth,
        p.min_samples_split,
        p.min_samples_leaf,
        p.max_features,
    )?;

    let mut tree = DecisionTree::new()
        .with_criterion(p.criterion)
        .with_min_samples_split(p.min_samples_split)
        .with_min_samples_leaf(p.min_samples_leaf)
        .with_max_features(p.max_features);
    if let Some(depth) = p.max_depth {
        tree = tree.with_max_depth(depth);
    }
    if let Some(seed) = p.random_state {
        tree = tree.with_random_state(seed);
    }
    Ok(Classifier::DecisionTree(tree))
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RandomForestParams {
    n_estimators: usize,
    criterion: Criterion,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
    bootstrap: bool,
    random_state: Option<u64>,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: None,
        }
    }
}

fn build_random_forest(params: &serde_yaml::Value) -> Result<Classifier> {
    let p: RandomForestParams = parse_params(RANDOM_FOREST, params)?;
    if p.n_estimators == 0 {
        return Err(invalid(RANDOM_FOREST, "n_estimators must be at least 1"));
    }
    check_tree_params(
        RANDOM_FOREST,
        p.max_depth,
        p.min_samples_split,
        p.min_samples_leaf,
        p.max_features,
    )?;

    let mut forest = RandomForest::new(p.n_estimators)
        .with_criterion(p.criterion)
        .with_min_samples_split(p.min_samples_split)
        .with_min_samples_leaf(p.min_samples_leaf)
        .with_max_features(p.max_features)
        .with_bootstrap(p.bootstrap);
    if let Some(depth) = p.max_depth {
        forest = forest.with_max_depth(depth);
    }
    if let Some(seed) = p.random_state {
        forest = forest.with_random_state(seed);
    }
    Ok(Classifier::RandomForest(forest))
}
