//! Classifier implementations
//!
//! Each model exposes the same surface: `fit`, `predict` (0/1 labels) and
//! `predict_proba` (positive-class probability). The [`Classifier`] enum
//! dispatches over the four supported types and is what gets persisted.

pub mod decision_tree;
pub mod logistic;
pub mod random_forest;
pub mod svc;

pub use decision_tree::{Criterion, DecisionTreeClassifier, DecisionTreeParams};
pub use logistic::{LogisticParams, LogisticRegression, Penalty};
pub use random_forest::{RandomForestClassifier, RandomForestParams};
pub use svc::{Gamma, KernelName, SvcClassifier, SvcParams};

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// Enum holding one of the supported classifier variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    Svc(SvcClassifier),
    DecisionTree(DecisionTreeClassifier),
    RandomForest(RandomForestClassifier),
}

impl Classifier {
    /// Canonical model type tag
    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::LogisticRegression(_) => "LogisticRegression",
            Classifier::Svc(_) => "SVC",
            Classifier::DecisionTree(_) => "DecisionTreeClassifier",
            Classifier::RandomForest(_) => "RandomForestClassifier",
        }
    }

    /// Fit the classifier on training data with 0/1 labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Classifier::LogisticRegression(m) => m.fit(x, y),
            Classifier::Svc(m) => m.fit(x, y),
            Classifier::DecisionTree(m) => m.fit(x, y),
            Classifier::RandomForest(m) => m.fit(x, y),
        }
    }

    /// Predict 0/1 class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::LogisticRegression(m) => m.predict(x),
            Classifier::Svc(m) => m.predict(x),
            Classifier::DecisionTree(m) => m.predict(x),
            Classifier::RandomForest(m) => m.predict(x),
        }
    }

    /// Predict positive-class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::LogisticRegression(m) => m.predict_proba(x),
            Classifier::Svc(m) => m.predict_proba(x),
            Classifier::DecisionTree(m) => m.predict_proba(x),
            Classifier::RandomForest(m) => m.predict_proba(x),
        }
    }

    /// Whether `predict_proba` is available for this variant
    pub fn supports_proba(&self) -> bool {
        match self {
            Classifier::Svc(m) => m.supports_proba(),
            _ => true,
        }
    }
}

/// Persisted model artifact: the fitted classifier plus the feature columns
/// it was trained on, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnModel {
    pub model_type: String,
    pub feature_names: Vec<String>,
    pub classifier: Classifier,
}

impl ChurnModel {
    pub fn new(classifier: Classifier, feature_names: Vec<String>) -> Self {
        Self {
            model_type: classifier.kind().to_string(),
            feature_names,
            classifier,
        }
    }

    /// Save the artifact as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChurnError::InputNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&json)?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_kind() {
        let clf = Classifier::LogisticRegression(LogisticRegression::new(LogisticParams::default()));
        assert_eq!(clf.kind(), "LogisticRegression");
    }

    #[test]
    fn test_model_roundtrip_identical_predictions() {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.2],
            [1.0, 0.9],
            [0.9, 1.1],
            [1.1, 1.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut clf = Classifier::DecisionTree(DecisionTreeClassifier::new(
            DecisionTreeParams::default(),
        ));
        clf.fit(&x, &y).unwrap();

        let model = ChurnModel::new(clf, vec!["f0".to_string(), "f1".to_string()]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(&path).unwrap();

        let loaded = ChurnModel::load(&path).unwrap();
        assert_eq!(loaded.model_type, "DecisionTreeClassifier");
        assert_eq!(loaded.feature_names, model.feature_names);

        let before = model.classifier.predict(&x).unwrap();
        let after = loaded.classifier.predict(&x).unwrap();
        assert_eq!(before, after);

        let proba_before = model.classifier.predict_proba(&x).unwrap();
        let proba_after = loaded.classifier.predict_proba(&x).unwrap();
        assert_eq!(proba_before, proba_after);
    }

    #[test]
    fn test_load_missing_artifact() {
        let result = ChurnModel::load(Path::new("/nonexistent/model.json"));
        assert!(matches!(result, Err(ChurnError::InputNotFound(_))));
    }
}
