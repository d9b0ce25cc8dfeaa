//! Feature transformation pipeline

use super::{
    config::PreprocessingConfig,
    encoder::OneHotEncoder,
    imputer::Imputer,
    scaler::Scaler,
    winsorizer::Winsorizer,
};
use crate::config::ResolvedColumns;
use crate::error::{BackorderError, Result};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Turns a raw table into a dense feature matrix.
///
/// Numeric columns go through scale, median-impute and winsorize; categorical
/// columns through most-frequent-impute and drop-first one-hot encoding. The
/// numeric block comes first, then the categorical block. All statistics are
/// learned in [`fit`](Self::fit); [`transform`](Self::transform) only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTransformer {
    config: PreprocessingConfig,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    drop_columns: Vec<String>,
    scaler: Option<Scaler>,
    numeric_imputer: Option<Imputer>,
    winsorizer: Option<Winsorizer>,
    categorical_imputer: Option<Imputer>,
    encoder: Option<OneHotEncoder>,
    is_fitted: bool,
    /// Rows seen by the last fit
    n_samples_fit: usize,
    /// Seconds spent in the last fit
    fit_time: Option<f64>,
}

impl FeatureTransformer {
    pub fn new(columns: &ResolvedColumns) -> Self {
        Self::with_config(columns, PreprocessingConfig::default())
    }

    pub fn with_config(columns: &ResolvedColumns, config: PreprocessingConfig) -> Self {
        Self {
            config,
            numeric_columns: columns.numerical.clone(),
            categorical_columns: columns.categorical.clone(),
            drop_columns: columns.dropped.clone(),
            scaler: None,
            numeric_imputer: None,
            winsorizer: None,
            categorical_imputer: None,
            encoder: None,
            is_fitted: false,
            n_samples_fit: 0,
            fit_time: None,
        }
    }

    /// Learn every statistic from the training fold
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let start = Instant::now();
        if df.height() == 0 {
            return Err(BackorderError::EmptyInput(
                "cannot fit the feature transformer on an empty table".to_string(),
            ));
        }

        let df = self.drop_configured(df)?;

        if !self.numeric_columns.is_empty() {
            let cols = Self::as_strs(&self.numeric_columns);
            let frame = self.numeric_frame(&df)?;

            let mut scaler = Scaler::new(self.config.scaler_type);
            let scaled = scaler.fit_transform(&frame, &cols)?;

            let mut imputer = Imputer::new(self.config.numeric_impute_strategy.clone());
            let imputed = imputer.fit_transform(&scaled, &cols)?;

            if self.config.winsorize {
                let mut winsorizer = Winsorizer::new();
                winsorizer.fit(&imputed, &cols)?;
                self.winsorizer = Some(winsorizer);
            }
            self.scaler = Some(scaler);
            self.numeric_imputer = Some(imputer);
        }

        if !self.categorical_columns.is_empty() {
            let cols = Self::as_strs(&self.categorical_columns);
            let frame = Self::select(&df, &self.categorical_columns)?;

            let mut imputer = Imputer::new(self.config.categorical_impute_strategy.clone());
            let imputed = imputer.fit_transform(&frame, &cols)?;

            let mut encoder = OneHotEncoder::new(self.config.handle_unknown);
            encoder.fit(&imputed, &cols)?;

            self.categorical_imputer = Some(imputer);
            self.encoder = Some(encoder);
        }

        self.is_fitted = true;
        self.n_samples_fit = df.height();
        self.fit_time = Some(start.elapsed().as_secs_f64());
        info!(
            rows = df.height(),
            numeric = self.numeric_columns.len(),
            categorical = self.categorical_columns.len(),
            features = self.n_features(),
            "fitted feature transformer"
        );
        Ok(self)
    }

    /// Apply the fitted statistics. Never refits.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(BackorderError::ModelNotFitted);
        }
        let df = self.drop_configured(df)?;

        let numeric = match (&self.scaler, &self.numeric_imputer) {
            (Some(scaler), Some(imputer)) => {
                let frame = self.numeric_frame(&df)?;
                let mut out = imputer.transform(&scaler.transform(&frame)?)?;
                if let Some(winsorizer) = &self.winsorizer {
                    out = winsorizer.transform(&out)?;
                }
                Self::frame_to_array(&out, &self.numeric_columns)?
            }
            _ => Array2::zeros((df.height(), 0)),
        };

        let categorical = match (&self.categorical_imputer, &self.encoder) {
            (Some(imputer), Some(encoder)) => {
                let frame = Self::select(&df, &self.categorical_columns)?;
                encoder.transform(&imputer.transform(&frame)?)?
            }
            _ => Array2::zeros((df.height(), 0)),
        };

        let features = concatenate(Axis(1), &[numeric.view(), categorical.view()])?;
        debug!(shape = ?features.shape(), "transformed features");
        Ok(features)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Width of the produced matrix
    pub fn n_features(&self) -> usize {
        let categorical = self.encoder.as_ref().map_or(0, |e| e.n_output_features());
        self.numeric_columns.len() + categorical
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        if let Some(encoder) = &self.encoder {
            names.extend(encoder.feature_names());
        }
        names
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn winsorizer(&self) -> Option<&Winsorizer> {
        self.winsorizer.as_ref()
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.scaler.as_ref()
    }

    pub fn n_samples_fit(&self) -> usize {
        self.n_samples_fit
    }

    pub fn fit_time(&self) -> Option<f64> {
        self.fit_time
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::utils::save_object(path, self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::utils::load_object(path)
    }

    fn as_strs(cols: &[String]) -> Vec<&str> {
        cols.iter().map(String::as_str).collect()
    }

    fn drop_configured(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for name in &self.drop_columns {
            if out.get_column_index(name).is_some() {
                out = out.drop(name)?;
            }
        }
        Ok(out)
    }

    fn select(df: &DataFrame, cols: &[String]) -> Result<DataFrame> {
        let columns = cols
            .iter()
            .map(|name| {
                df.column(name)
                    .cloned()
                    .map_err(|_| BackorderError::FeatureNotFound(name.clone()))
            })
            .collect::<Result<Vec<Column>>>()?;
        Ok(DataFrame::new(columns)?)
    }

    fn numeric_frame(&self, df: &DataFrame) -> Result<DataFrame> {
        let columns = self
            .numeric_columns
            .iter()
            .map(|name| {
                let col = df
                    .column(name)
                    .map_err(|_| BackorderError::FeatureNotFound(name.clone()))?;
                Ok(col.cast(&DataType::Float64)?)
            })
            .collect::<Result<Vec<Column>>>()?;
        Ok(DataFrame::new(columns)?)
    }

    fn frame_to_array(df: &DataFrame, cols: &[String]) -> Result<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((df.height(), cols.len()));
        for (j, name) in cols.iter().enumerate() {
            let ca = df
                .column(name)
                .map_err(|_| BackorderError::FeatureNotFound(name.clone()))?
                .f64()?;
            for (i, v) in ca.into_iter().enumerate() {
                out[[i, j]] = v.unwrap_or(f64::NAN);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Schema;

    fn columns() -> ResolvedColumns {
        Schema {
            numerical: vec!["qty".into(), "lead".into()],
            categorical: vec!["risk".into()],
            drop_columns: vec!["sku".into()],
        }
        .resolve("target")
        .unwrap()
    }

    fn train_df() -> DataFrame {
        df!(
            "sku" => &["a", "b", "c", "d", "e", "f"],
            "qty" => &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)],
            "lead" => &[8.0, 8.0, 2.0, 4.0, 6.0, 8.0],
            "risk" => &[Some("No"), Some("Yes"), Some("No"), None, Some("Maybe"), Some("No")],
            "target" => &["No", "No", "Yes", "No", "No", "Yes"],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_transform_shape_and_names() {
        let mut transformer = FeatureTransformer::new(&columns());
        let features = transformer.fit_transform(&train_df()).unwrap();

        assert_eq!(features.shape(), &[6, 4]);
        assert_eq!(
            transformer.feature_names(),
            vec!["qty", "lead", "risk_No", "risk_Yes"]
        );
        assert!(features.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_category_imputed_with_mode() {
        let mut transformer = FeatureTransformer::new(&columns());
        let features = transformer.fit_transform(&train_df()).unwrap();
        // row 3 had a null risk, imputed to "No"
        assert_eq!(features[[3, 2]], 1.0);
        assert_eq!(features[[3, 3]], 0.0);
    }

    #[test]
    fn test_transform_requires_fit() {
        let transformer = FeatureTransformer::new(&columns());
        assert!(matches!(
            transformer.transform(&train_df()),
            Err(BackorderError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_missing_feature_column() {
        let mut transformer = FeatureTransformer::new(&columns());
        transformer.fit(&train_df()).unwrap();
        let broken = train_df().drop("lead").unwrap();
        assert!(matches!(
            transformer.transform(&broken),
            Err(BackorderError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessing.bin");
        let mut transformer = FeatureTransformer::new(&columns());
        let expected = transformer.fit_transform(&train_df()).unwrap();

        transformer.save(&path).unwrap();
        let loaded = FeatureTransformer::load(&path).unwrap();
        assert_eq!(loaded.transform(&train_df()).unwrap(), expected);
    }
}
