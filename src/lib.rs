//! churnml - Batch churn classification pipeline
//!
//! A small batch pipeline for training and evaluating tabular
//! churn-classification models:
//! - Load a CSV dataset and normalize its column names
//! - Preprocess it (drop identifier columns, one-hot encode categoricals)
//! - Split it with a seeded, optionally stratified train/test split
//! - Fit one of four classifier types selected by configuration
//! - Compute a configured set of evaluation metrics
//! - Persist the trained model and metrics report to disk
//!
//! # Modules
//!
//! - [`data`] - Dataset loading and feature preparation
//! - [`models`] - Classifier implementations and the persisted model artifact
//! - [`metrics`] - Metric registry and ordered metrics report
//! - [`pipeline`] - Train/test split, trainer and evaluator orchestration
//! - [`tracking`] - Optional experiment tracking
//! - [`plot`] - ROC curve rendering
//! - [`config`] - Pipeline parameters file
//! - [`cli`] - Command-line interface

pub mod error;

pub mod config;
pub mod data;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod tracking;

pub mod cli;

pub use error::{ChurnError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ChurnError, Result};

    pub use crate::config::{ModelConfig, PipelineParams};
    pub use crate::data::{loader, prepare, LABEL_COLUMN};
    pub use crate::metrics::{compute_metrics, MetricName, MetricsReport};
    pub use crate::models::{ChurnModel, Classifier};
    pub use crate::pipeline::{evaluate, train_test_split, SplitConfig, Trainer};
    pub use crate::tracking::{ExperimentTracker, FileTracker};
}
