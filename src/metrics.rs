//! Evaluation metrics
//!
//! Each metric is a pure scorer of uniform signature registered on
//! [`MetricName`]. Scorers return `None` when the metric is undefined for the
//! given inputs (roc_auc without probabilities or with a single class), and
//! the report silently omits those entries.

use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Scorer signature: (y_true, y_pred, y_proba) -> value
type Scorer = fn(&Array1<f64>, &Array1<f64>, Option<&Array1<f64>>) -> Option<f64>;

/// Supported metric names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Accuracy,
    Precision,
    Recall,
    F1,
    RocAuc,
}

impl MetricName {
    /// Parse a metric name as it appears in a params file
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accuracy" => Some(MetricName::Accuracy),
            "precision" => Some(MetricName::Precision),
            "recall" => Some(MetricName::Recall),
            "f1" => Some(MetricName::F1),
            "roc_auc" => Some(MetricName::RocAuc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Accuracy => "accuracy",
            MetricName::Precision => "precision",
            MetricName::Recall => "recall",
            MetricName::F1 => "f1",
            MetricName::RocAuc => "roc_auc",
        }
    }

    fn scorer(&self) -> Scorer {
        match self {
            MetricName::Accuracy => accuracy,
            MetricName::Precision => precision,
            MetricName::Recall => recall,
            MetricName::F1 => f1,
            MetricName::RocAuc => roc_auc,
        }
    }
}

/// Parse a metric list from configuration, skipping unknown names with a
/// warning. An empty result falls back to accuracy.
pub fn parse_metric_names(names: &[String]) -> Vec<MetricName> {
    let mut parsed = Vec::new();
    for name in names {
        match MetricName::parse(name) {
            Some(m) => parsed.push(m),
            None => warn!("unknown metric '{}', skipping", name),
        }
    }
    if parsed.is_empty() {
        parsed.push(MetricName::Accuracy);
    }
    parsed
}

/// Compute the requested metrics, preserving request order. Metrics that are
/// undefined for the inputs are omitted. An empty request defaults to
/// accuracy.
pub fn compute_metrics(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    y_proba: Option<&Array1<f64>>,
    requested: &[MetricName],
) -> MetricsReport {
    let default = [MetricName::Accuracy];
    let requested = if requested.is_empty() {
        &default[..]
    } else {
        requested
    };

    let mut report = MetricsReport::new();
    for metric in requested {
        if let Some(value) = (metric.scorer())(y_true, y_pred, y_proba) {
            report.push(*metric, value);
        }
    }
    report
}

fn confusion_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let t_bool = *t > 0.5;
        let p_bool = *p > 0.5;

        match (t_bool, p_bool) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    (tp, fp, tn, fn_)
}

fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>, _: Option<&Array1<f64>>) -> Option<f64> {
    if y_true.is_empty() {
        return None;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    Some(correct as f64 / y_true.len() as f64)
}

fn precision(y_true: &Array1<f64>, y_pred: &Array1<f64>, _: Option<&Array1<f64>>) -> Option<f64> {
    let (tp, fp, _, _) = confusion_counts(y_true, y_pred);
    // Zero division yields 0.0
    if tp + fp > 0 {
        Some(tp as f64 / (tp + fp) as f64)
    } else {
        Some(0.0)
    }
}

fn recall(y_true: &Array1<f64>, y_pred: &Array1<f64>, _: Option<&Array1<f64>>) -> Option<f64> {
    let (tp, _, _, fn_) = confusion_counts(y_true, y_pred);
    if tp + fn_ > 0 {
        Some(tp as f64 / (tp + fn_) as f64)
    } else {
        Some(0.0)
    }
}

fn f1(y_true: &Array1<f64>, y_pred: &Array1<f64>, _: Option<&Array1<f64>>) -> Option<f64> {
    let p = precision(y_true, y_pred, None)?;
    let r = recall(y_true, y_pred, None)?;
    if p + r > 0.0 {
        Some(2.0 * p * r / (p + r))
    } else {
        Some(0.0)
    }
}

/// Area under the ROC curve via the rank-sum formulation, with tied scores
/// receiving their average rank. Undefined without probabilities or when only
/// one class is present.
fn roc_auc(y_true: &Array1<f64>, _: &Array1<f64>, y_proba: Option<&Array1<f64>>) -> Option<f64> {
    let proba = y_proba?;
    let n = y_true.len();
    if n == 0 || proba.len() != n {
        return None;
    }

    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        proba[a]
            .partial_cmp(&proba[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks over tie groups
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && proba[order[j + 1]] == proba[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let sum_pos_ranks: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t > 0.5)
        .map(|(_, &r)| r)
        .sum();

    let auc = (sum_pos_ranks - (n_pos * (n_pos + 1)) as f64 / 2.0) / (n_pos * n_neg) as f64;
    Some(auc)
}

/// Ordered metrics report: entries keep the order they were computed in, and
/// that order is preserved in the JSON output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsReport {
    entries: Vec<(MetricName, f64)>,
}

impl MetricsReport {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, name: MetricName, value: f64) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: MetricName) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(MetricName, f64)> {
        self.entries.iter()
    }

    /// The headline metric for the summary line: accuracy if present,
    /// otherwise the first computed metric.
    pub fn primary(&self) -> Option<(MetricName, f64)> {
        self.get(MetricName::Accuracy)
            .map(|v| (MetricName::Accuracy, v))
            .or_else(|| self.entries.first().copied())
    }

    /// Render as JSON with two-space indentation, preserving entry order.
    pub fn to_json(&self) -> String {
        let mut json = String::from("{\n");
        for (i, (name, value)) in self.entries.iter().enumerate() {
            json.push_str(&format!("  \"{}\": {}", name.as_str(), value));
            if i + 1 < self.entries.len() {
                json.push(',');
            }
            json.push('\n');
        }
        json.push('}');
        json
    }

    /// Write the JSON report, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json())?;
        Ok(())
    }
}
