//! Ingest → Validate → Transform → Train → Evaluate → Push

use crate::components::*;
use crate::config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelEvaluationConfig,
    ModelPusherConfig, ModelTrainerConfig, TrainingPipelineConfig,
};
use crate::error::{Result, StageExt};
use crate::registry::ObjectStore;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, info_span};

/// Every artifact a completed run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub ingestion: DataIngestionArtifact,
    pub validation: DataValidationArtifact,
    pub transformation: DataTransformationArtifact,
    pub trainer: ModelTrainerArtifact,
    pub evaluation: ModelEvaluationArtifact,
    /// `None` when the trained model was not accepted
    pub pusher: Option<ModelPusherArtifact>,
}

/// Owns the storage clients for one run and hands them to each stage
pub struct TrainPipeline {
    config: TrainingPipelineConfig,
    source: Box<dyn DocumentSource>,
    store: Box<dyn ObjectStore>,
}

impl TrainPipeline {
    pub fn new(
        config: TrainingPipelineConfig,
        source: Box<dyn DocumentSource>,
        store: Box<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    pub fn config(&self) -> &TrainingPipelineConfig {
        &self.config
    }

    pub fn start_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        let _span = info_span!("data_ingestion").entered();
        DataIngestion::new(DataIngestionConfig::new(&self.config))
            .initiate_data_ingestion(self.source.as_ref())
            .in_stage("data ingestion")
    }

    pub fn start_data_validation(
        &self,
        ingestion: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact> {
        let _span = info_span!("data_validation").entered();
        DataValidation::new(DataValidationConfig::new(&self.config))
            .and_then(|stage| stage.initiate_data_validation(ingestion))
            .in_stage("data validation")
    }

    pub fn start_data_transformation(
        &self,
        validation: &DataValidationArtifact,
    ) -> Result<DataTransformationArtifact> {
        let _span = info_span!("data_transformation").entered();
        DataTransformation::new(DataTransformationConfig::new(&self.config))
            .and_then(|stage| stage.initiate_data_transformation(validation))
            .in_stage("data transformation")
    }

    pub fn start_model_trainer(
        &self,
        transformation: &DataTransformationArtifact,
    ) -> Result<ModelTrainerArtifact> {
        let _span = info_span!("model_trainer").entered();
        ModelTrainer::new(ModelTrainerConfig::new(&self.config))
            .and_then(|stage| stage.initiate_model_trainer(transformation))
            .in_stage("model trainer")
    }

    pub fn start_model_evaluation(
        &self,
        validation: &DataValidationArtifact,
        trainer: &ModelTrainerArtifact,
    ) -> Result<ModelEvaluationArtifact> {
        let _span = info_span!("model_evaluation").entered();
        ModelEvaluation::new(ModelEvaluationConfig::new(&self.config), self.store.as_ref())
            .initiate_model_evaluation(validation, trainer)
            .in_stage("model evaluation")
    }

    pub fn start_model_pusher(
        &self,
        evaluation: &ModelEvaluationArtifact,
    ) -> Result<ModelPusherArtifact> {
        let _span = info_span!("model_pusher").entered();
        ModelPusher::new(ModelPusherConfig::new(&self.config), self.store.as_ref())
            .initiate_model_pusher(evaluation)
            .in_stage("model pusher")
    }

    /// Run every stage in order. Any stage failure aborts the run; a
    /// rejected model ends it early without touching the registry.
    pub fn run_pipeline(&self) -> Result<PipelineOutcome> {
        let start = Instant::now();
        info!(
            pipeline = %self.config.pipeline_name,
            artifact_root = %self.config.artifact_root.display(),
            "training pipeline started"
        );

        let ingestion = self.start_data_ingestion()?;
        let validation = self.start_data_validation(&ingestion)?;
        let transformation = self.start_data_transformation(&validation)?;
        let trainer = self.start_model_trainer(&transformation)?;
        let evaluation = self.start_model_evaluation(&validation, &trainer)?;

        let pusher = if evaluation.is_model_accepted {
            Some(self.start_model_pusher(&evaluation)?)
        } else {
            info!("trained model is not better than the deployed one");
            None
        };

        info!(
            seconds = start.elapsed().as_secs_f64(),
            pushed = pusher.is_some(),
            "training pipeline finished"
        );
        Ok(PipelineOutcome {
            ingestion,
            validation,
            transformation,
            trainer,
            evaluation,
            pusher,
        })
    }
}
