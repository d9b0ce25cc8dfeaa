//! End-to-end training and batch prediction

mod prediction;
mod training_pipeline;

pub use prediction::PredictionPipeline;
pub use training_pipeline::{PipelineOutcome, TrainPipeline};
