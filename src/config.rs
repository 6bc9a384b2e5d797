//! Pipeline configuration
//!
//! Parameters come from a YAML file with three optional sections: `split`,
//! `model`, and `metrics`. The `model` section carries a `type` tag plus
//! whatever hyperparameters that model accepts; keys the model does not
//! recognize are ignored.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{ChurnError, Result};
use crate::metrics::{parse_metric_names, MetricName};
use crate::models::{
    Classifier, DecisionTreeClassifier, DecisionTreeParams, LogisticParams, LogisticRegression,
    RandomForestClassifier, RandomForestParams, SvcClassifier, SvcParams,
};
use crate::pipeline::SplitConfig;

/// Full pipeline parameters as loaded from a params file
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub split: SplitConfig,
    pub model: ModelConfig,
    metrics: Vec<String>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            model: ModelConfig::LogisticRegression(LogisticParams::default()),
            metrics: Vec::new(),
        }
    }
}

impl PipelineParams {
    /// Load parameters from a YAML file. Missing sections take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChurnError::InputNotFound(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_yaml::from_str(&raw)?;

        let split = match value.get("split") {
            Some(v) if !v.is_null() => SplitConfig::deserialize(v.clone())?,
            _ => SplitConfig::default(),
        };

        let model = match value.get("model") {
            Some(v) if !v.is_null() => ModelConfig::from_value(v)?,
            _ => ModelConfig::LogisticRegression(LogisticParams::default()),
        };

        let metrics = match value.get("metrics") {
            Some(v) if !v.is_null() => Vec::<String>::deserialize(v.clone())?,
            _ => Vec::new(),
        };

        Ok(Self {
            split,
            model,
            metrics,
        })
    }

    /// The metric names to compute, with unknown names dropped. Defaults to
    /// accuracy when the section is missing or empty.
    pub fn metric_names(&self) -> Vec<MetricName> {
        parse_metric_names(&self.metrics)
    }
}

/// Model selection plus hyperparameters
#[derive(Debug, Clone)]
pub enum ModelConfig {
    LogisticRegression(LogisticParams),
    Svc(SvcParams),
    DecisionTree(DecisionTreeParams),
    RandomForest(RandomForestParams),
}

impl ModelConfig {
    /// Build a model config from the `model` section of a params file. The
    /// `type` key selects the model (defaulting to logistic regression); the
    /// remaining keys are hyperparameters.
    pub fn from_value(value: &Value) -> Result<Self> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("LogisticRegression")
            .to_string();

        let config = match tag.as_str() {
            "LogisticRegression" => {
                ModelConfig::LogisticRegression(LogisticParams::deserialize(value.clone())?)
            }
            "SVC" => ModelConfig::Svc(SvcParams::deserialize(value.clone())?),
            "DecisionTreeClassifier" => {
                ModelConfig::DecisionTree(DecisionTreeParams::deserialize(value.clone())?)
            }
            "RandomForestClassifier" => {
                ModelConfig::RandomForest(RandomForestParams::deserialize(value.clone())?)
            }
            _ => return Err(ChurnError::UnsupportedModelType(tag)),
        };

        Ok(config)
    }

    /// The model type tag
    pub fn kind(&self) -> &'static str {
        match self {
            ModelConfig::LogisticRegression(_) => "LogisticRegression",
            ModelConfig::Svc(_) => "SVC",
            ModelConfig::DecisionTree(_) => "DecisionTreeClassifier",
            ModelConfig::RandomForest(_) => "RandomForestClassifier",
        }
    }

    /// Construct an unfitted classifier from this configuration
    pub fn build(&self) -> Classifier {
        match self {
            ModelConfig::LogisticRegression(p) => {
                Classifier::LogisticRegression(LogisticRegression::new(p.clone()))
            }
            ModelConfig::Svc(p) => Classifier::Svc(SvcClassifier::new(p.clone())),
            ModelConfig::DecisionTree(p) => {
                Classifier::DecisionTree(DecisionTreeClassifier::new(p.clone()))
            }
            ModelConfig::RandomForest(p) => {
                Classifier::RandomForest(RandomForestClassifier::new(p.clone()))
            }
        }
    }

    /// Flatten the hyperparameters into string pairs for experiment tracking
    pub fn tracker_params(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("model_type".to_string(), self.kind().to_string())];

        let value = match self {
            ModelConfig::LogisticRegression(p) => serde_json::to_value(p),
            ModelConfig::Svc(p) => serde_json::to_value(p),
            ModelConfig::DecisionTree(p) => serde_json::to_value(p),
            ModelConfig::RandomForest(p) => serde_json::to_value(p),
        };

        if let Ok(serde_json::Value::Object(map)) = value {
            for (key, val) in map {
                let rendered = match val {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => "null".to_string(),
                    other => other.to_string(),
                };
                pairs.push((key, rendered));
            }
        }

        pairs
    }
}
