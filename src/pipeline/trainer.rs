//! Training pipeline
//!
//! Runs the full train flow: load CSV, preprocess, split, fit, score on the
//! held-out partition, persist the model artifact and metrics report. An
//! optional experiment tracker records the run; tracker failures are logged
//! and never abort training.

use std::path::Path;

use tracing::{info, warn};

use crate::config::PipelineParams;
use crate::data::{load_csv, preprocess, to_matrix};
use crate::error::Result;
use crate::metrics::{compute_metrics, MetricsReport};
use crate::models::ChurnModel;
use crate::pipeline::split::train_test_split;
use crate::tracking::ExperimentTracker;

/// Orchestrates a single training run
pub struct Trainer {
    params: PipelineParams,
    tracker: Option<Box<dyn ExperimentTracker>>,
}

impl Trainer {
    pub fn new(params: PipelineParams) -> Self {
        Self {
            params,
            tracker: None,
        }
    }

    pub fn with_tracker(mut self, tracker: Box<dyn ExperimentTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Train on `data_path`, writing the model artifact to `model_out` and
    /// the held-out metrics to `metrics_out`. Returns the computed report.
    pub fn run(
        &mut self,
        data_path: &Path,
        model_out: &Path,
        metrics_out: &Path,
    ) -> Result<MetricsReport> {
        info!(data = %data_path.display(), "loading training data");
        let df = load_csv(data_path)?;
        let df = preprocess(df)?;
        let (x, y, feature_names) = to_matrix(&df)?;
        info!(
            rows = x.nrows(),
            features = x.ncols(),
            "prepared feature matrix"
        );

        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, &self.params.split)?;
        info!(
            train = x_train.nrows(),
            test = x_test.nrows(),
            "split into train/test"
        );

        let mut classifier = self.params.model.build();
        info!(model = classifier.kind(), "fitting model");
        classifier.fit(&x_train, &y_train)?;

        let y_pred = classifier.predict(&x_test)?;
        let y_proba = classifier
            .supports_proba()
            .then(|| classifier.predict_proba(&x_test))
            .transpose()?;

        let requested = self.params.metric_names();
        let report = compute_metrics(&y_test, &y_pred, y_proba.as_ref(), &requested);

        let model = ChurnModel::new(classifier, feature_names);
        model.save(model_out)?;
        report.save(metrics_out)?;
        info!(
            model = %model_out.display(),
            metrics = %metrics_out.display(),
            "wrote artifacts"
        );

        self.record_run(model_out, &report);

        Ok(report)
    }

    fn record_run(&mut self, model_out: &Path, report: &MetricsReport) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };

        let mut track = || -> std::result::Result<(), String> {
            tracker.start_run("train")?;
            tracker.log_params(&self.params.model.tracker_params())?;
            for (name, value) in report.iter() {
                tracker.log_metric(name.as_str(), *value)?;
            }
            tracker.log_artifact(model_out)?;
            tracker.finish_run()?;
            Ok(())
        };

        if let Err(e) = track() {
            warn!("experiment tracking failed: {}", e);
        }
    }
}
