//! Support vector classifier
//!
//! Binary SVC trained with SMO (Sequential Minimal Optimization). Probability
//! estimates come from a Platt-style sigmoid calibrated on the training
//! decision scores, so `predict_proba` is always available after fitting.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel selector as it appears in a params file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelName {
    Linear,
    Poly,
    Rbf,
    Sigmoid,
}

/// Gamma setting: a keyword or an explicit value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gamma {
    Keyword(GammaKeyword),
    Value(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaKeyword {
    Scale,
    Auto,
}

impl Gamma {
    /// Resolve against the training matrix: `scale` is 1/(n_features * var),
    /// `auto` is 1/n_features.
    fn resolve(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self {
            Gamma::Value(v) => *v,
            Gamma::Keyword(GammaKeyword::Auto) => 1.0 / n_features,
            Gamma::Keyword(GammaKeyword::Scale) => {
                let n = (x.nrows() * x.ncols()).max(1) as f64;
                let mean = x.iter().sum::<f64>() / n;
                let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0 / n_features
                }
            }
        }
    }
}

/// SVC hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SvcParams {
    #[serde(rename = "C")]
    pub c: f64,
    pub kernel: KernelName,
    pub gamma: Gamma,
    pub degree: usize,
    pub coef0: f64,
    pub random_state: Option<u64>,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelName::Rbf,
            gamma: Gamma::Keyword(GammaKeyword::Scale),
            degree: 3,
            coef0: 0.0,
            random_state: Some(42),
        }
    }
}

/// Kernel with gamma resolved at fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum KernelType {
    Linear,
    Polynomial { degree: usize, gamma: f64, coef0: f64 },
    Rbf { gamma: f64 },
    Sigmoid { gamma: f64, coef0: f64 },
}

/// Support vector classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvcClassifier {
    pub params: SvcParams,
    kernel: Option<KernelType>,
    support_vectors: Option<Array2<f64>>,
    alphas: Option<Array1<f64>>,
    support_labels: Option<Array1<f64>>,
    bias: f64,
    /// Platt sigmoid coefficients (a, b) for probability calibration
    platt: Option<(f64, f64)>,
    /// Tolerance for the SMO stopping criterion
    tol: f64,
    /// Maximum SMO sweeps
    max_iter: usize,
    is_fitted: bool,
}

impl SvcClassifier {
    pub fn new(params: SvcParams) -> Self {
        Self {
            params,
            kernel: None,
            support_vectors: None,
            alphas: None,
            support_labels: None,
            bias: 0.0,
            platt: None,
            tol: 1e-3,
            max_iter: 1000,
            is_fitted: false,
        }
    }

    /// Fit the classifier on training data with 0/1 labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(ChurnError::InvalidInput(format!(
                "dataset has {} samples, exceeding the maximum {} for the SVC kernel matrix",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let has_pos = y.iter().any(|&v| v > 0.5);
        let has_neg = y.iter().any(|&v| v <= 0.5);
        if !has_pos || !has_neg {
            return Err(ChurnError::InvalidInput(
                "SVC requires both classes in the training set".to_string(),
            ));
        }

        let gamma = self.params.gamma.resolve(x);
        self.kernel = Some(match self.params.kernel {
            KernelName::Linear => KernelType::Linear,
            KernelName::Poly => KernelType::Polynomial {
                degree: self.params.degree,
                gamma,
                coef0: self.params.coef0,
            },
            KernelName::Rbf => KernelType::Rbf { gamma },
            KernelName::Sigmoid => KernelType::Sigmoid {
                gamma,
                coef0: self.params.coef0,
            },
        });

        // SMO works on -1/+1 labels
        let y_signed: Array1<f64> = y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 });

        let (alphas, bias, support_indices) = self.smo_train(x, &y_signed)?;

        let sv_count = support_indices.len();
        let n_features = x.ncols();

        let mut support_vectors = Array2::zeros((sv_count, n_features));
        let mut support_labels = Array1::zeros(sv_count);
        let mut support_alphas = Array1::zeros(sv_count);

        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y_signed[idx];
            support_alphas[i] = alphas[idx];
        }

        self.support_vectors = Some(support_vectors);
        self.support_labels = Some(support_labels);
        self.alphas = Some(support_alphas);
        self.bias = bias;
        self.is_fitted = true;

        // Calibrate the probability sigmoid on the training decision scores
        let scores = self.decision_function(x)?;
        self.platt = Some(Self::fit_platt(&scores, y));

        Ok(())
    }

    /// SMO training loop
    fn smo_train(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array1<f64>, f64, Vec<usize>)> {
        let n = x.nrows();

        let mut alphas = Array1::zeros(n);
        let mut bias = 0.0;

        let kernel_matrix = self.compute_kernel_matrix(x);

        let mut rng = match self.params.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let c = self.params.c;
        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.max_iter {
            let mut num_changed = 0;

            if n <= 1 {
                break;
            }

            for i in 0..n {
                let e_i =
                    Self::decision_cached(&kernel_matrix, &alphas, y, bias, i) - y[i];

                // KKT violation check
                if (y[i] * e_i < -self.tol && alphas[i] < c)
                    || (y[i] * e_i > self.tol && alphas[i] > 0.0)
                {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j =
                        Self::decision_cached(&kernel_matrix, &alphas, y, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        (
                            (alphas[j] - alphas[i]).max(0.0),
                            (c + alphas[j] - alphas[i]).min(c),
                        )
                    } else {
                        (
                            (alphas[i] + alphas[j] - c).max(0.0),
                            (alphas[i] + alphas[j]).min(c),
                        )
                    };

                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * kernel_matrix[[i, j]]
                        - kernel_matrix[[i, i]]
                        - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] -= y[j] * (e_i - e_j) / eta;
                    alphas[j] = alphas[j].max(l).min(h);

                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        Ok((alphas, bias, support_indices))
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let val = self.kernel_fn(&x.row(i).to_owned(), &x.row(j).to_owned());
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    fn kernel_fn(&self, x1: &Array1<f64>, x2: &Array1<f64>) -> f64 {
        match self.kernel.as_ref() {
            Some(KernelType::Linear) | None => x1.dot(x2),
            Some(KernelType::Polynomial { degree, gamma, coef0 }) => {
                (*gamma * x1.dot(x2) + coef0).powi((*degree).min(i32::MAX as usize) as i32)
            }
            Some(KernelType::Rbf { gamma }) => {
                let diff = x1 - x2;
                (-gamma * diff.dot(&diff)).exp()
            }
            Some(KernelType::Sigmoid { gamma, coef0 }) => {
                (*gamma * x1.dot(x2) + coef0).tanh()
            }
        }
    }

    fn decision_cached(
        k: &Array2<f64>,
        alphas: &Array1<f64>,
        y: &Array1<f64>,
        bias: f64,
        idx: usize,
    ) -> f64 {
        let mut sum = 0.0;
        for i in 0..alphas.len() {
            sum += alphas[i] * y[i] * k[[i, idx]];
        }
        sum + bias
    }

    /// Decision function scores
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let sv = self.support_vectors.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        let sv_labels = self.support_labels.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        let alphas = self.alphas.as_ref().ok_or(ChurnError::ModelNotFitted)?;

        let n = x.nrows();
        let mut scores = Array1::zeros(n);

        for i in 0..n {
            let sample = x.row(i).to_owned();
            let mut sum = self.bias;
            for j in 0..sv.nrows() {
                sum += alphas[j] * sv_labels[j] * self.kernel_fn(&sample, &sv.row(j).to_owned());
            }
            scores[i] = sum;
        }

        Ok(scores)
    }

    /// Fit sigmoid coefficients (a, b) so that sigmoid(a*s + b) matches the
    /// observed labels, by gradient descent on the log loss.
    fn fit_platt(scores: &Array1<f64>, y: &Array1<f64>) -> (f64, f64) {
        let n = scores.len() as f64;
        let mut a = 1.0;
        let mut b = 0.0;
        let lr = 0.1;

        for _ in 0..200 {
            let mut da = 0.0;
            let mut db = 0.0;
            for (s, t) in scores.iter().zip(y.iter()) {
                let p = 1.0 / (1.0 + (-(a * s + b)).exp());
                da += (p - t) * s;
                db += p - t;
            }
            a -= lr * da / n;
            b -= lr * db / n;
        }

        (a, b)
    }

    /// Predict 0/1 class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_function(x)?;
        Ok(scores.mapv(|s| if s >= 0.0 { 1.0 } else { 0.0 }))
    }

    /// Predict positive-class probabilities via the calibrated sigmoid
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (a, b) = self.platt.ok_or(ChurnError::ModelNotFitted)?;
        let scores = self.decision_function(x)?;
        Ok(scores.mapv(|s| 1.0 / (1.0 + (-(a * s + b)).exp())))
    }

    /// Whether calibrated probabilities are available
    pub fn supports_proba(&self) -> bool {
        self.platt.is_some()
    }

    /// Number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors
            .as_ref()
            .map(|sv| sv.nrows())
            .unwrap_or(0)
    }
}
