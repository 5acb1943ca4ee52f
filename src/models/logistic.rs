// 📈 Logistic Regression - L2-regularised, full-batch gradient descent

use super::Classifier;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularisation strength
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    pub tolerance: f64,
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Iterations actually run by the last fit
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        LogisticRegression {
            c: 1.0,
            max_iter: 1000,
            learning_rate: 0.5,
            tolerance: 1e-6,
            weights: Vec::new(),
            intercept: 0.0,
            n_iter: 0,
        }
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize) -> Self {
        LogisticRegression {
            c,
            max_iter,
            ..Default::default()
        }
    }

    fn decision(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Minimise mean log-loss + ||w||² / (2·C·n)
    pub fn fit(&mut self, rows: &[Vec<f64>], labels: &[u8]) -> Result<()> {
        if rows.is_empty() {
            bail!("Cannot fit logistic regression on zero rows");
        }
        if rows.len() != labels.len() {
            bail!("Row/label count mismatch: {} vs {}", rows.len(), labels.len());
        }

        let n = rows.len() as f64;
        let dim = rows[0].len();
        let penalty = 1.0 / (self.c * n);
        self.weights = vec![0.0; dim];
        self.intercept = 0.0;
        self.n_iter = 0;

        let mut grad = vec![0.0; dim];
        for iter in 0..self.max_iter {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0;

            for (row, &label) in rows.iter().zip(labels) {
                let err = sigmoid(self.decision(row)) - f64::from(label);
                for (g, x) in grad.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_b += err;
            }

            let mut norm_sq = 0.0;
            for (g, w) in grad.iter_mut().zip(&self.weights) {
                *g = *g / n + penalty * w;
                norm_sq += *g * *g;
            }
            grad_b /= n;
            norm_sq += grad_b * grad_b;

            for (w, g) in self.weights.iter_mut().zip(&grad) {
                *w -= self.learning_rate * g;
            }
            self.intercept -= self.learning_rate * grad_b;
            self.n_iter = iter + 1;

            if norm_sq.sqrt() < self.tolerance {
                break;
            }
        }

        tracing::debug!(iterations = self.n_iter, features = dim, "logistic regression fitted");
        Ok(())
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.decision(features))
    }
}
