//! Backorder - Main Entry Point
//!
//! Batch training and prediction for backorder risk classification.

use backorder_ml::cli::{cmd_inspect, cmd_predict, cmd_train, cmd_validate_config, Cli, Commands};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The guard flushes the file writer on drop, so it lives until main returns
    let (file_layer, _guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "backorder.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "backorder_ml=info".into()),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    match cli.command {
        Commands::Train { config, timestamp } => {
            cmd_train(config.as_deref(), timestamp.as_deref())?;
        }
        Commands::Predict { input, output, config } => {
            cmd_predict(&input, &output, config.as_deref())?;
        }
        Commands::Inspect { csv, config } => {
            cmd_inspect(&csv, config.as_deref())?;
        }
        Commands::ValidateConfig { config } => {
            cmd_validate_config(config.as_deref())?;
        }
    }

    Ok(())
}
