// 📏 Metrics - Binary classification scores
// Positive class is INCOME (label 1)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &[u8], predicted: &[u8]) -> Self {
        let mut m = ConfusionMatrix::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t, p) {
                (1, 1) => m.true_positive += 1,
                (0, 1) => m.false_positive += 1,
                (1, _) => m.false_negative += 1,
                _ => m.true_negative += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        harmonic(self.precision(), self.recall())
    }

    /// Same matrix with the classes swapped (EXPENSE as positive)
    pub fn flipped(&self) -> Self {
        ConfusionMatrix {
            true_positive: self.true_negative,
            false_positive: self.false_negative,
            true_negative: self.true_positive,
            false_negative: self.false_positive,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn harmonic(p: f64, r: f64) -> f64 {
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Precision/recall/F1 on the INCOME class
pub fn binary_metrics(truth: &[u8], predicted: &[u8]) -> BinaryMetrics {
    let m = ConfusionMatrix::from_labels(truth, predicted);
    BinaryMetrics {
        accuracy: m.accuracy(),
        precision: m.precision(),
        recall: m.recall(),
        f1_score: m.f1(),
    }
}

/// Per-class scores averaged with class support as weight
pub fn weighted_metrics(truth: &[u8], predicted: &[u8]) -> BinaryMetrics {
    let income = ConfusionMatrix::from_labels(truth, predicted);
    let expense = income.flipped();

    let n_income = (income.true_positive + income.false_negative) as f64;
    let n_expense = (expense.true_positive + expense.false_negative) as f64;
    let total = n_income + n_expense;
    if total == 0.0 {
        return BinaryMetrics::default();
    }

    let avg = |a: f64, b: f64| (a * n_income + b * n_expense) / total;
    BinaryMetrics {
        accuracy: income.accuracy(),
        precision: avg(income.precision(), expense.precision()),
        recall: avg(income.recall(), expense.recall()),
        f1_score: avg(income.f1(), expense.f1()),
    }
}

/// Mean binary cross-entropy with probabilities clipped away from 0 and 1
pub fn log_loss(truth: &[u8], p_income: &[f64]) -> f64 {
    const EPS: f64 = 1e-7;
    if truth.is_empty() {
        return 0.0;
    }
    let sum: f64 = truth
        .iter()
        .zip(p_income)
        .map(|(&t, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if t == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    sum / truth.len() as f64
}

/// Mean and population standard deviation
pub fn mean_std(scores: &[f64]) -> (f64, f64) {
    if scores.is_empty() {
        return (0.0, 0.0);
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_counts() {
        let m = ConfusionMatrix::from_labels(&[1, 1, 0, 0, 1], &[1, 0, 0, 1, 1]);
        assert_eq!(m.true_positive, 2);
        assert_eq!(m.false_negative, 1);
        assert_eq!(m.false_positive, 1);
        assert_eq!(m.true_negative, 1);
        assert_eq!(m.accuracy(), 0.6);
        assert!((m.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_predicted_positives_gives_zero_precision() {
        let m = binary_metrics(&[1, 0], &[0, 0]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.accuracy, 0.5);
    }

    #[test]
    fn test_weighted_metrics_perfect() {
        let m = weighted_metrics(&[0, 1, 1, 0], &[0, 1, 1, 0]);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
    }

    #[test]
    fn test_weighted_recall_equals_accuracy() {
        let truth = [0, 0, 0, 1, 1];
        let pred = [0, 1, 0, 1, 0];
        let m = weighted_metrics(&truth, &pred);
        assert!((m.recall - m.accuracy).abs() < 1e-12);
    }

    #[test]
    fn test_log_loss_and_mean_std() {
        assert!(log_loss(&[1], &[1.0]) < 1e-6);
        assert!(log_loss(&[0], &[1.0]) > 10.0);
        let (mean, std) = mean_std(&[1.0, 3.0]);
        assert_eq!(mean, 2.0);
        assert_eq!(std, 1.0);
    }
}
