//! Batch scoring with the latest registry model

use crate::config::{PredictionPipelineConfig, PREDICTION_COLUMN};
use crate::error::Result;
use crate::registry::{ModelResolver, ObjectStore};
use crate::training::BackorderModel;
use polars::prelude::*;
use tracing::info;

pub struct PredictionPipeline<'a> {
    config: PredictionPipelineConfig,
    store: &'a dyn ObjectStore,
}

impl<'a> PredictionPipeline<'a> {
    pub fn new(config: PredictionPipelineConfig, store: &'a dyn ObjectStore) -> Self {
        Self { config, store }
    }

    /// Deserialize the newest model in the registry
    pub fn load_best_model(&self) -> Result<BackorderModel> {
        let key = ModelResolver::new(self.store, self.config.registry_prefix.as_str()).best_path()?;
        info!(key = %key, "loading model");
        BackorderModel::from_bytes(&self.store.download(&key)?)
    }

    /// Score `df` and append the decoded labels as the prediction column
    pub fn predict(&self, model: &BackorderModel, df: &DataFrame) -> Result<DataFrame> {
        let labels = model.predict_labels(df)?;
        let mut scored = df.clone();
        scored.with_column(Series::new(PREDICTION_COLUMN.into(), labels))?;
        Ok(scored)
    }

    /// Read the input key, score it and write the output key.
    /// Returns the number of rows scored.
    pub fn initiate_prediction(&self) -> Result<usize> {
        let model = self.load_best_model()?;
        let input = self.store.read_csv(&self.config.input_key)?;
        let mut scored = self.predict(&model, &input)?;
        self.store.write_csv(&self.config.output_key, &mut scored)?;
        info!(
            rows = scored.height(),
            output = %self.config.output_key,
            "prediction written"
        );
        Ok(scored.height())
    }
}
