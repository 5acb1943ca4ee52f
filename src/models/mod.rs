// Models - Everything that turns a sentence (or its features) into a label
//
// Each model answers with a probability of INCOME; the kind and confidence
// shown to the app are derived from it.

pub mod forest;
pub mod logistic;
pub mod network;
pub mod semantic;

pub use forest::{DecisionTree, ForestParams, RandomForest};
pub use logistic::LogisticRegression;
pub use network::{Encoder, NetworkConfig, SequenceNetwork, TrainingHistory, TrainingOptions};
pub use semantic::SemanticRuleClassifier;

use crate::dataset::TransactionKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// PREDICTION
// ============================================================================

/// Kind + confidence + a human-readable reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub kind: TransactionKind,
    pub confidence: f64,
    pub analysis: String,
}

impl Prediction {
    pub fn new(kind: TransactionKind, confidence: f64, analysis: impl Into<String>) -> Self {
        Prediction {
            kind,
            confidence,
            analysis: analysis.into(),
        }
    }

    /// Kind from p(income), confidence = max class probability
    pub fn from_probability(p_income: f64, analysis: impl Into<String>) -> Self {
        let kind = TransactionKind::from_probability(p_income);
        Prediction::new(kind, p_income.max(1.0 - p_income), analysis)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({:.0}% confidence) - {}",
            self.kind,
            self.confidence * 100.0,
            self.analysis
        )
    }
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Fitted model over dense feature rows
pub trait Classifier {
    /// Probability that the row is INCOME
    fn predict_proba(&self, features: &[f64]) -> f64;

    fn predict(&self, features: &[f64]) -> TransactionKind {
        TransactionKind::from_probability(self.predict_proba(features))
    }

    /// Mean accuracy over rows
    fn score(&self, rows: &[Vec<f64>], labels: &[u8]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        let correct = rows
            .iter()
            .zip(labels)
            .filter(|(row, &label)| self.predict(row).label() == label)
            .count();
        correct as f64 / rows.len() as f64
    }

    fn predict_all(&self, rows: &[Vec<f64>]) -> Vec<u8> {
        rows.iter().map(|r| self.predict(r).label()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(f64);

    impl Classifier for Always {
        fn predict_proba(&self, _features: &[f64]) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_prediction_from_probability() {
        let p = Prediction::from_probability(0.2, "test");
        assert_eq!(p.kind, TransactionKind::Expense);
        assert!((p.confidence - 0.8).abs() < 1e-12);

        let p = Prediction::from_probability(0.9, "test");
        assert_eq!(p.kind, TransactionKind::Income);
    }

    #[test]
    fn test_default_score() {
        let rows = vec![vec![0.0], vec![1.0], vec![2.0]];
        assert_eq!(Always(0.9).score(&rows, &[1, 1, 0]), 2.0 / 3.0);
        assert_eq!(Always(0.1).predict_all(&rows), vec![0, 0, 0]);
    }
}
