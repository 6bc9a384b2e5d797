//! Decision tree classifier
//!
//! Binary classification tree. Leaves store the positive-class fraction of
//! the samples that reached them, so probabilities come for free.

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Gini,
    Entropy,
}

/// Decision tree hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeParams {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: Option<u64>,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: None,
        }
    }
}

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the positive-class fraction
    Leaf { prob: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    pub params: DecisionTreeParams,
    root: Option<TreeNode>,
    /// Number of features sampled as split candidates at each node
    /// (set by the forest)
    pub(crate) max_features: Option<usize>,
    n_features: usize,
}

impl DecisionTreeClassifier {
    pub fn new(params: DecisionTreeParams) -> Self {
        Self {
            params,
            root: None,
            max_features: None,
            n_features: 0,
        }
    }

    /// Fit the tree to training data with 0/1 labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ChurnError::InvalidInput("empty training set".to_string()));
        }

        self.n_features = x.ncols();

        let mut rng = ChaCha8Rng::seed_from_u64(self.params.random_state.unwrap_or(42));
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng));

        Ok(())
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let n_pos = indices.iter().filter(|&&i| y[i] > 0.5).count();

        let should_stop = n_samples < self.params.min_samples_split
            || n_samples <= self.params.min_samples_leaf
            || self.params.max_depth.map_or(false, |d| depth >= d)
            || n_pos == 0
            || n_pos == n_samples;

        if should_stop {
            return TreeNode::Leaf {
                prob: n_pos as f64 / n_samples as f64,
                n_samples,
            };
        }

        if let Some((best_feature, best_threshold)) = self.find_best_split(x, y, indices, rng) {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, best_feature]] <= best_threshold);

            if left_indices.len() < self.params.min_samples_leaf
                || right_indices.len() < self.params.min_samples_leaf
            {
                return TreeNode::Leaf {
                    prob: n_pos as f64 / n_samples as f64,
                    n_samples,
                };
            }

            let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
            let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

            TreeNode::Split {
                feature_idx: best_feature,
                threshold: best_threshold,
                left,
                right,
                n_samples,
            }
        } else {
            TreeNode::Leaf {
                prob: n_pos as f64 / n_samples as f64,
                n_samples,
            }
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        let n_features_to_try = self.max_features.unwrap_or(n_features).min(n_features);

        // When capped, draw a fresh random subset of features for this split
        let candidate_features: Vec<usize> = if n_features_to_try < n_features {
            let mut chosen =
                rand::seq::index::sample(rng, n_features, n_features_to_try).into_vec();
            chosen.sort_unstable();
            chosen
        } else {
            (0..n_features).collect()
        };

        let n = indices.len();
        let n_pos = indices.iter().filter(|&&i| y[i] > 0.5).count();
        let parent_impurity = self.impurity(n, n_pos);

        // Each candidate feature independently finds its best split, in parallel
        let feature_results: Vec<Option<(usize, f64, f64)>> = candidate_features
            .into_par_iter()
            .map(|feature_idx| {
                let mut values: Vec<f64> =
                    indices.iter().map(|&i| x[[i, feature_idx]]).collect();
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                values.dedup();

                let mut best_gain = 0.0f64;
                let mut best_threshold = 0.0f64;

                for window in values.windows(2) {
                    let threshold = (window[0] + window[1]) / 2.0;

                    let mut left_count = 0usize;
                    let mut left_pos = 0usize;
                    for &idx in indices {
                        if x[[idx, feature_idx]] <= threshold {
                            left_count += 1;
                            if y[idx] > 0.5 {
                                left_pos += 1;
                            }
                        }
                    }
                    let right_count = n - left_count;
                    let right_pos = n_pos - left_pos;

                    if left_count < self.params.min_samples_leaf
                        || right_count < self.params.min_samples_leaf
                    {
                        continue;
                    }

                    let weighted_impurity = (left_count as f64
                        * self.impurity(left_count, left_pos)
                        + right_count as f64 * self.impurity(right_count, right_pos))
                        / n as f64;

                    let gain = parent_impurity - weighted_impurity;
                    if gain > best_gain {
                        best_gain = gain;
                        best_threshold = threshold;
                    }
                }

                if best_gain > 0.0 {
                    Some((feature_idx, best_threshold, best_gain))
                } else {
                    None
                }
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    fn impurity(&self, count: usize, pos: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let p = pos as f64 / count as f64;
        match self.params.criterion {
            Criterion::Gini => 1.0 - p * p - (1.0 - p) * (1.0 - p),
            Criterion::Entropy => {
                let mut entropy = 0.0;
                if p > 0.0 {
                    entropy -= p * p.ln();
                }
                if p < 1.0 {
                    entropy -= (1.0 - p) * (1.0 - p).ln();
                }
                entropy
            }
        }
    }

    /// Predict positive-class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ChurnError::ModelNotFitted)?;

        let proba: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let sample = x.row(i);
                Self::traverse(root, &sample.to_vec())
            })
            .collect();

        Ok(Array1::from_vec(proba))
    }

    /// Predict 0/1 class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn traverse(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { prob, .. } => *prob,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::traverse(left, sample)
                } else {
                    Self::traverse(right, sample)
                }
            }
        }
    }

    /// Get tree depth
    pub fn depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::node_depth(node),
        }
    }

    fn node_depth(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                1 + Self::node_depth(left).max(Self::node_depth(right))
            }
        }
    }
}
