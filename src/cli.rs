//! Command-line interface for the churn pipeline

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::*;

use crate::config::PipelineParams;
use crate::data::preprocess_file;
use crate::metrics::MetricsReport;
use crate::pipeline::{evaluate, Trainer};
use crate::tracking::FileTracker;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_run(msg: &str) {
    println!("  {} {}", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("  {} {}", ok("✓"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn print_report(report: &MetricsReport) {
    for (name, value) in report.iter() {
        println!("  {} {:.4}", muted(name.as_str()), value);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "churnml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate churn-classification models")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Preprocess a raw CSV into a numeric feature table
    Preprocess {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Train a model and score it on a held-out split
    Train {
        /// Labeled training CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Pipeline parameters file
        #[arg(short, long, default_value = "params.yaml")]
        params: PathBuf,

        /// Output model artifact
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Output metrics report
        #[arg(long, default_value = "metrics.json")]
        metrics: PathBuf,

        /// Record the run under this experiment-tracking directory
        #[arg(long)]
        track_dir: Option<PathBuf>,
    },

    /// Evaluate a saved model against a labeled CSV
    Evaluate {
        /// Model artifact produced by `train`
        #[arg(short, long)]
        model: PathBuf,

        /// Labeled evaluation CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Output metrics report
        #[arg(long, default_value = "eval_metrics.json")]
        metrics: PathBuf,

        /// Output ROC curve SVG (written when the model has probabilities)
        #[arg(long, default_value = "roc.svg")]
        plot: PathBuf,
    },
}

// ─── Command handlers ──────────────────────────────────────────────────────────

pub fn cmd_preprocess(input: &Path, output: &Path) -> anyhow::Result<()> {
    section("Preprocess");
    step_run(&format!("reading {}", input.display()));
    let df = preprocess_file(input, output)?;
    step_done(&format!(
        "{} rows, {} columns -> {}",
        df.height(),
        df.width(),
        output.display()
    ));
    Ok(())
}

pub fn cmd_train(
    data: &Path,
    params_path: &Path,
    model_out: &Path,
    metrics_out: &Path,
    track_dir: Option<&Path>,
) -> anyhow::Result<()> {
    section("Train");

    let params = PipelineParams::load(params_path)?;
    step_run(&format!(
        "training {} on {}",
        params.model.kind(),
        data.display()
    ));

    let mut trainer = Trainer::new(params);
    if let Some(dir) = track_dir {
        trainer = trainer.with_tracker(Box::new(FileTracker::new(dir)?));
    }

    let report = trainer.run(data, model_out, metrics_out)?;

    step_done(&format!("model -> {}", model_out.display()));
    print_report(&report);

    // Machine-readable summary line for scripted callers
    if let Some((name, value)) = report.primary() {
        println!("{}={:.3}", name.as_str(), value);
    }

    Ok(())
}

pub fn cmd_evaluate(
    model: &Path,
    data: &Path,
    metrics_out: &Path,
    plot_out: &Path,
) -> anyhow::Result<()> {
    section("Evaluate");
    step_run(&format!(
        "scoring {} against {}",
        model.display(),
        data.display()
    ));

    let report = evaluate(model, data, metrics_out, plot_out)?;

    step_done(&format!("metrics -> {}", metrics_out.display()));
    print_report(&report);

    Ok(())
}
