//! Train/test splitting
//!
//! Stratified splitting keeps the class balance of the label in both
//! partitions. The split is deterministic for a fixed `random_state`.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// Split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_size: f64,
    pub random_state: u64,
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            stratify: true,
        }
    }
}

/// Split features and labels into train and test partitions.
///
/// Returns `(x_train, x_test, y_train, y_test)`. Both partitions are
/// guaranteed non-empty; a dataset too small to split is an error.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    config: &SplitConfig,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n_samples = x.nrows();

    if n_samples != y.len() {
        return Err(ChurnError::ShapeError {
            expected: format!("y length = {}", n_samples),
            actual: format!("y length = {}", y.len()),
        });
    }
    if n_samples < 2 {
        return Err(ChurnError::DataError(format!(
            "need at least 2 samples to split, got {}",
            n_samples
        )));
    }
    if !(0.0..1.0).contains(&config.test_size) || config.test_size <= 0.0 {
        return Err(ChurnError::ConfigError(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.random_state);

    let test_indices: Vec<usize> = if config.stratify {
        // Group indices by class; BTreeMap keeps class order deterministic
        let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            by_class.entry(label.round() as i64).or_default().push(i);
        }

        let mut test = Vec::new();
        for (label, mut indices) in by_class {
            let n_class = indices.len();
            // Each class must land in both partitions
            if n_class < 2 {
                return Err(ChurnError::DataError(format!(
                    "least populated class ({}) has only {} member; need at least 2 \
                     for a stratified split",
                    label, n_class
                )));
            }
            indices.shuffle(&mut rng);
            let n_test = ((n_class as f64 * config.test_size).round() as usize)
                .max(1)
                .min(n_class - 1);
            test.extend(indices.into_iter().take(n_test));
        }
        test
    } else {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut rng);
        let n_test = ((n_samples as f64 * config.test_size).round() as usize)
            .max(1)
            .min(n_samples - 1);
        indices.into_iter().take(n_test).collect()
    };

    let test_set: std::collections::HashSet<usize> = test_indices.iter().copied().collect();
    let train_indices: Vec<usize> = (0..n_samples).filter(|i| !test_set.contains(i)).collect();

    if train_indices.is_empty() || test_indices.is_empty() {
        return Err(ChurnError::DataError(
            "split produced an empty partition".to_string(),
        ));
    }

    let x_train = x.select(Axis(0), &train_indices);
    let x_test = x.select(Axis(0), &test_indices);
    let y_train = Array1::from_vec(train_indices.iter().map(|&i| y[i]).collect());
    let y_test = Array1::from_vec(test_indices.iter().map(|&i| y[i]).collect());

    Ok((x_train, x_test, y_train, y_test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn imbalanced_data(n: usize, pos_frac: f64) -> (Array2<f64>, Array1<f64>) {
        let n_pos = (n as f64 * pos_frac) as usize;
        let x = Array2::from_shape_fn((n, 3), |(i, j)| (i * 3 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| if i < n_pos { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = imbalanced_data(100, 0.3);
        let config = SplitConfig::default();
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, &config).unwrap();

        assert_eq!(x_train.nrows() + x_test.nrows(), 100);
        assert_eq!(x_train.nrows(), y_train.len());
        assert_eq!(x_test.nrows(), y_test.len());
        assert_eq!(x_test.nrows(), 20);
    }

    #[test]
    fn test_stratified_preserves_class_balance() {
        let (x, y) = imbalanced_data(100, 0.3);
        let config = SplitConfig::default();
        let (_, _, y_train, y_test) = train_test_split(&x, &y, &config).unwrap();

        let train_pos = y_train.iter().filter(|&&v| v > 0.5).count() as f64 / y_train.len() as f64;
        let test_pos = y_test.iter().filter(|&&v| v > 0.5).count() as f64 / y_test.len() as f64;

        assert!((train_pos - 0.3).abs() < 0.05, "train frac {}", train_pos);
        assert!((test_pos - 0.3).abs() < 0.05, "test frac {}", test_pos);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let (x, y) = imbalanced_data(50, 0.4);
        let config = SplitConfig {
            random_state: 7,
            ..Default::default()
        };

        let (a_train, _, _, a_test_y) = train_test_split(&x, &y, &config).unwrap();
        let (b_train, _, _, b_test_y) = train_test_split(&x, &y, &config).unwrap();

        assert_eq!(a_train, b_train);
        assert_eq!(a_test_y, b_test_y);
    }

    #[test]
    fn test_different_seeds_differ() {
        let (x, y) = imbalanced_data(50, 0.4);
        let a = train_test_split(
            &x,
            &y,
            &SplitConfig {
                random_state: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let b = train_test_split(
            &x,
            &y,
            &SplitConfig {
                random_state: 2,
                ..Default::default()
            },
        )
        .unwrap();
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn test_unstratified_split() {
        let (x, y) = imbalanced_data(40, 0.5);
        let config = SplitConfig {
            stratify: false,
            test_size: 0.25,
            ..Default::default()
        };
        let (x_train, x_test, _, _) = train_test_split(&x, &y, &config).unwrap();
        assert_eq!(x_train.nrows(), 30);
        assert_eq!(x_test.nrows(), 10);
    }

    #[test]
    fn test_invalid_test_size() {
        let (x, y) = imbalanced_data(10, 0.5);
        let config = SplitConfig {
            test_size: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            train_test_split(&x, &y, &config),
            Err(ChurnError::ConfigError(_))
        ));
    }

    #[test]
    fn test_single_member_class_rejected() {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i * 2 + j) as f64);
        let mut labels = vec![0.0; 10];
        labels[0] = 1.0;
        let y = Array1::from_vec(labels);

        let result = train_test_split(&x, &y, &SplitConfig::default());
        match result {
            Err(ChurnError::DataError(msg)) => {
                assert!(msg.contains("only 1 member"), "message: {}", msg);
            }
            other => panic!("expected DataError, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_too_few_samples() {
        let x = Array2::zeros((1, 2));
        let y = Array1::zeros(1);
        assert!(matches!(
            train_test_split(&x, &y, &SplitConfig::default()),
            Err(ChurnError::DataError(_))
        ));
    }
}
