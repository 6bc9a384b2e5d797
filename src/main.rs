//! churnml - Main Entry Point
//!
//! Batch pipeline for training and evaluating churn-classification models.

use clap::Parser;
use churnml::cli::{cmd_evaluate, cmd_preprocess, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churnml=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess { input, output } => {
            cmd_preprocess(&input, &output)?;
        }
        Commands::Train { data, params, model, metrics, track_dir } => {
            cmd_train(&data, &params, &model, &metrics, track_dir.as_deref())?;
        }
        Commands::Evaluate { model, data, metrics, plot } => {
            cmd_evaluate(&model, &data, &metrics, &plot)?;
        }
    }

    Ok(())
}
