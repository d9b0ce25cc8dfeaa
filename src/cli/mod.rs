//! Backorder CLI Module
//!
//! Command-line interface for training, batch prediction and configuration checks.

use clap::{Parser, Subcommand};
use colored::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::components::CsvDocumentSource;
use crate::config::{
    ModelConfig, PipelineSettings, PredictionPipelineConfig, Schema, TrainingPipelineConfig,
};
use crate::pipeline::{PredictionPipeline, TrainPipeline};
use crate::registry::LocalObjectStore;
use crate::training::ModelFactory;
use crate::utils::read_csv;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn bad(s: &str) -> ColoredString    { s.truecolor(230, 110, 110) }

fn kv(key: &str, val: &str) {
    println!("  {:<22} {}", muted(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_fail(msg: &str) {
    println!("  {} {}", bad("✗"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
    let _ = std::io::stdout().flush();
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "backorder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch training and prediction pipeline for backorder risk")]
#[command(long_about = None)]
pub struct Cli {
    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full training pipeline
    Train {
        /// Pipeline settings file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reuse an existing run directory instead of starting a new one
        #[arg(long)]
        timestamp: Option<String>,
    },

    /// Score a CSV from the object store with the latest registry model
    Predict {
        /// Input object key
        #[arg(short, long)]
        input: String,

        /// Output object key
        #[arg(short, long)]
        output: String,

        /// Pipeline settings file, for the store root and registry prefix
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show how the schema resolves against a CSV file
    Inspect {
        /// CSV file to inspect
        csv: PathBuf,

        /// Pipeline settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check the schema and model configuration files
    ValidateConfig {
        /// Pipeline settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn load_settings(path: Option<&Path>) -> anyhow::Result<PipelineSettings> {
    Ok(match path {
        Some(path) => PipelineSettings::from_yaml_file(path)?,
        None => PipelineSettings::default(),
    })
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(config: Option<&Path>, timestamp: Option<&str>) -> anyhow::Result<()> {
    section("Train");

    let settings = load_settings(config)?;
    let pipeline_config = match timestamp {
        Some(ts) => TrainingPipelineConfig::with_timestamp(settings.clone(), ts),
        None => TrainingPipelineConfig::new(settings.clone()),
    };
    kv("Run", &pipeline_config.artifact_root.display().to_string());
    kv("Model registry", &format!(
        "{}/{}",
        settings.store_root.display(),
        settings.registry_prefix
    ));
    println!();

    let pipeline = TrainPipeline::new(
        pipeline_config,
        Box::new(CsvDocumentSource::new(&settings.source_dir)),
        Box::new(LocalObjectStore::new(&settings.store_root)),
    );

    step_run("Running pipeline");
    let start = Instant::now();
    let outcome = pipeline.run_pipeline()?;
    step_done(&format!("{:.2?}", start.elapsed()));

    let train = &outcome.trainer.train_metrics;
    let test = &outcome.trainer.test_metrics;
    println!();
    println!("  {:<22} {:>10} {:>10}", muted("Metric"), muted("Train"), muted("Test"));
    println!("  {}", dim(&"─".repeat(44)));
    for (name, a, b) in [
        ("Balanced accuracy", train.balanced_accuracy, test.balanced_accuracy),
        ("F1", train.f1_score, test.f1_score),
        ("Precision", train.precision_score, test.precision_score),
        ("Recall", train.recall_score, test.recall_score),
        ("ROC AUC", train.roc_auc_score, test.roc_auc_score),
    ] {
        println!("  {:<22} {:>10.4} {:>10.4}", name, a, b);
    }
    println!();

    if !outcome.validation.drifted_columns.is_empty() {
        println!(
            "  {} {}",
            "drift".yellow(),
            outcome.validation.drifted_columns.join(", ")
        );
    }
    if let Some(improved) = outcome.evaluation.improved_accuracy {
        kv("Improvement", &format!("{:+.4}", improved));
    }
    match &outcome.pusher {
        Some(pushed) => step_ok(&format!("pushed {}", pushed.model_key.cyan())),
        None => step_fail("model rejected, registry unchanged"),
    }
    println!();
    Ok(())
}

pub fn cmd_predict(input: &str, output: &str, config: Option<&Path>) -> anyhow::Result<()> {
    section("Predict");

    let settings = load_settings(config)?;
    let store = LocalObjectStore::new(&settings.store_root);
    let prediction = PredictionPipeline::new(
        PredictionPipelineConfig {
            store_root: settings.store_root.clone(),
            registry_prefix: settings.registry_prefix.clone(),
            input_key: input.to_string(),
            output_key: output.to_string(),
        },
        &store,
    );

    step_run(&format!("Scoring {}", input.cyan()));
    let start = Instant::now();
    let rows = prediction.initiate_prediction()?;
    step_done(&format!("{} rows in {:.2?}", rows, start.elapsed()));
    step_ok(&format!("wrote {}", output.cyan()));
    println!();
    Ok(())
}

pub fn cmd_inspect(csv: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    section("Inspect");

    let settings = load_settings(config)?;
    let schema = Schema::from_yaml_file(&settings.schema_path)?;
    let columns = schema.resolve(&settings.target_column)?;

    step_run("Loading data");
    let df = read_csv(csv)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));
    println!();

    let known = schema.known_columns(&settings.target_column);
    let roles = [
        ("numerical", &columns.numerical),
        ("categorical", &columns.categorical),
        ("dropped", &columns.dropped),
    ];
    println!("  {:<26} {:<12} {:>8}", muted("Column"), muted("Role"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(48)));
    for (role, names) in roles {
        for name in names.iter() {
            match df.column(name) {
                Ok(col) => println!("  {:<26} {:<12} {:>8}", name, role, col.null_count()),
                Err(_) => println!("  {:<26} {:<12} {:>8}", name, role, "missing".red()),
            }
        }
    }
    let target = match df.column(&settings.target_column) {
        Ok(col) => col.null_count().to_string().normal(),
        Err(_) => "missing".red(),
    };
    println!("  {:<26} {:<12} {:>8}", settings.target_column, "target", target);

    let unexpected: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .map(|c| c.as_str())
        .filter(|c| !known.contains(c))
        .collect();
    if !unexpected.is_empty() {
        println!();
        println!("  {} {}", "undeclared".yellow(), unexpected.join(", "));
    }
    println!();
    Ok(())
}

pub fn cmd_validate_config(config: Option<&Path>) -> anyhow::Result<()> {
    section("Validate config");

    let settings = load_settings(config)?;
    step_ok("pipeline settings");

    let schema = Schema::from_yaml_file(&settings.schema_path)?;
    let columns = schema.resolve(&settings.target_column)?;
    step_ok(&format!(
        "schema {} ({} numerical, {} categorical)",
        settings.schema_path.display(),
        columns.numerical.len(),
        columns.categorical.len()
    ));

    let model_config = ModelConfig::from_yaml_file(&settings.model_config_path)?;
    let factory = ModelFactory::default();
    if let Err(e) = factory.validate(&model_config.model) {
        step_fail(&format!("model {}", model_config.model.identifier()));
        println!("    {}", muted(&format!("supported: {}", factory.supported().join(", "))));
        return Err(e.into());
    }
    step_ok(&format!("model {}", model_config.model.identifier().cyan()));
    println!();
    Ok(())
}
