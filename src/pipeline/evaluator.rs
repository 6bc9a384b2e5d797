//! Evaluation pipeline
//!
//! Loads a persisted model artifact and scores it against a labeled dataset.
//! Feature columns are selected by the names stored in the artifact, so the
//! evaluation data may carry extra columns in any order; an indicator column
//! for a category unseen in the evaluation data is filled with zeros.

use std::path::Path;

use tracing::info;

use crate::data::{label_array, load_csv, preprocess, select_features, LABEL_COLUMN};
use crate::error::{ChurnError, Result};
use crate::metrics::{compute_metrics, MetricName, MetricsReport};
use crate::models::ChurnModel;
use crate::plot;

/// Evaluate a saved model against a labeled CSV.
///
/// Writes the metrics report to `metrics_out`. When the model supports
/// probabilities, roc_auc is added to the base metrics and a ROC curve SVG is
/// written to `plot_out`.
pub fn evaluate(
    model_path: &Path,
    data_path: &Path,
    metrics_out: &Path,
    plot_out: &Path,
) -> Result<MetricsReport> {
    let model = ChurnModel::load(model_path)?;
    info!(
        model = %model_path.display(),
        kind = model.model_type,
        "loaded model artifact"
    );

    let df = load_csv(data_path)?;
    let df = preprocess(df)?;

    if df.column(LABEL_COLUMN).is_err() {
        return Err(ChurnError::MissingColumn(LABEL_COLUMN.to_string()));
    }
    let y_true = label_array(&df)?;
    let x = select_features(&df, &model.feature_names)?;

    let y_pred = model.classifier.predict(&x)?;
    let y_proba = model
        .classifier
        .supports_proba()
        .then(|| model.classifier.predict_proba(&x))
        .transpose()?;

    let mut requested = vec![
        MetricName::Accuracy,
        MetricName::Precision,
        MetricName::Recall,
        MetricName::F1,
    ];
    if y_proba.is_some() {
        requested.push(MetricName::RocAuc);
    }

    let report = compute_metrics(&y_true, &y_pred, y_proba.as_ref(), &requested);
    report.save(metrics_out)?;

    if let Some(proba) = &y_proba {
        let auc = report.get(MetricName::RocAuc);
        plot::save_roc(plot_out, &y_true, proba, auc)?;
        info!(plot = %plot_out.display(), "wrote ROC curve");
    }

    info!(metrics = %metrics_out.display(), "wrote evaluation report");
    Ok(report)
}
