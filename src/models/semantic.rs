// 🧭 Semantic Rule Classifier - Hand-tuned decision over semantic features
//
// Used where the fitted forest is not available at inference time. Works on
// the 28-wide vectors from `SemanticFeatures`.

use super::{Classifier, Prediction};
use crate::dataset::TransactionKind;
use crate::features::{SemanticFeatures, NET_SCORE};

const STRONG_MARGIN: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticRuleClassifier;

impl SemanticRuleClassifier {
    pub fn classify(&self, text: &str) -> Prediction {
        self.classify_features(&SemanticFeatures::extract(text))
    }

    pub fn classify_features(&self, features: &[f64]) -> Prediction {
        let gave_me = features.first().copied().unwrap_or(0.0);
        let net = features.get(NET_SCORE).copied().unwrap_or(0.0);

        if gave_me > 0.5 {
            Prediction::new(
                TransactionKind::Income,
                0.99,
                "Semantic pattern 'gave me' indicates INCOME",
            )
        } else if net > STRONG_MARGIN {
            Prediction::new(
                TransactionKind::Income,
                (0.70 + net * 0.05).min(0.95),
                "Income semantic features dominant",
            )
        } else if net < -STRONG_MARGIN {
            Prediction::new(
                TransactionKind::Expense,
                (0.70 + net.abs() * 0.05).min(0.95),
                "Expense semantic features dominant",
            )
        } else {
            Prediction::new(
                TransactionKind::Expense,
                0.65,
                "Unclear semantic pattern, defaulting to expense",
            )
        }
    }
}

impl Classifier for SemanticRuleClassifier {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        let p = self.classify_features(features);
        match p.kind {
            TransactionKind::Income => p.confidence,
            TransactionKind::Expense => 1.0 - p.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gave_me_wins() {
        let p = SemanticRuleClassifier.classify("Father gave me money");
        assert_eq!(p.kind, TransactionKind::Income);
        assert_eq!(p.confidence, 0.99);
    }

    #[test]
    fn test_net_score_thresholds() {
        // salary 2.5 + company 2.0 → net 4.5
        let p = SemanticRuleClassifier.classify("salary from company");
        assert_eq!(p.kind, TransactionKind::Income);
        assert!((p.confidence - 0.925).abs() < 1e-9);

        // got myself 3.0 + cost 2.5 → net -5.5, capped
        let p = SemanticRuleClassifier.classify("I got myself a tshirt that cost 3000");
        assert_eq!(p.kind, TransactionKind::Expense);
        assert!((p.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_unclear_defaults_to_expense() {
        let p = SemanticRuleClassifier.classify("lunch 25");
        assert_eq!(p.kind, TransactionKind::Expense);
        assert_eq!(p.confidence, 0.65);
    }

    #[test]
    fn test_probability_view() {
        let rows = SemanticFeatures::extract_all(&["Mother gave me 500", "Electricity bill 75"]);
        let c = SemanticRuleClassifier;
        assert!(c.predict_proba(&rows[0]) > 0.9);
        assert!(c.predict_proba(&rows[1]) < 0.5);
        assert_eq!(c.score(&rows, &[1, 0]), 1.0);
    }
}
