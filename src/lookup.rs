// 🔎 Lookup Table - Precomputed predictions for common sentences
//
// The table is baked into generated app code. Keys are lowercased
// sentences; a key may contain the literal `AMOUNT` where a number was.

use crate::dataset::TransactionKind;
use crate::keywords::KeywordEngine;
use crate::models::Prediction;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const AMOUNT_TOKEN: &str = "AMOUNT";

/// Only the first entries (in key order) get amount variations
pub const MAX_VARIATION_SOURCES: usize = 100;

const VARIATION_DISCOUNT: f64 = 0.9;

pub const COMMON_PATTERNS: [&str; 28] = [
    // personal purchases
    "I got myself a tshirt that cost 3000",
    "Bought myself new shoes for 150",
    "Treated myself to dinner for 75",
    "Purchased phone for myself costing 800",
    "Got me a shirt that was 50",
    // regular expenses
    "Paid 50 for groceries",
    "Spent 25 on coffee",
    "Cost of lunch was 15",
    "Bought gas for 40",
    "Movie tickets cost 20",
    "Electricity bill 75",
    "Internet bill 60",
    "Phone bill 45",
    // income
    "Received salary 5000 from work",
    "Got paid 3000 this month",
    "Freelance payment 2000",
    "Client paid 1500 for project",
    "Business income 1000",
    "Bonus payment 500",
    "Commission earned 300",
    // short forms
    "Spent money on food",
    "Paid for transportation",
    "Got income from job",
    "Received payment",
    "Bought clothes",
    "Paid bills",
    "Salary deposited",
    "Freelance work payment",
];

const VARIATION_AMOUNTS: [u32; 5] = [10, 25, 50, 75, 100];
const VARIATION_CATEGORIES: [&str; 3] = ["food", "groceries", "gas"];

/// Hand patterns plus amount × category variations, duplicates removed
pub fn common_patterns() -> Vec<String> {
    let mut patterns: Vec<String> = COMMON_PATTERNS.iter().map(|p| p.to_string()).collect();
    for amount in VARIATION_AMOUNTS {
        for category in VARIATION_CATEGORIES {
            patterns.push(format!("Paid {} for {}", amount, category));
            patterns.push(format!("Spent {} on {}", amount, category));
            patterns.push(format!("Bought {} for {}", category, amount));
            patterns.push(format!("Cost of {} was {}", category, amount));
        }
    }

    let mut seen = std::collections::HashSet::new();
    patterns.retain(|p| seen.insert(p.clone()));
    patterns
}

static DIGITS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("[0-9]+").ok());

/// Replace every run of ASCII digits with `AMOUNT`
pub fn mask_amounts(text: &str) -> String {
    match DIGITS.as_ref() {
        Some(re) => re.replace_all(text, NoExpand(AMOUNT_TOKEN)).into_owned(),
        None => text.to_string(),
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub kind: TransactionKind,
    pub confidence: f64,
    /// Sentence the entry was computed from, original casing
    pub pattern: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupTable {
    entries: BTreeMap<String, LookupEntry>,
}

impl LookupTable {
    /// Score every pattern with `predict`, then add amount variations
    pub fn build<F>(patterns: &[String], mut predict: F) -> Self
    where
        F: FnMut(&str) -> Prediction,
    {
        let mut base = BTreeMap::new();
        for pattern in patterns {
            let prediction = predict(pattern);
            base.insert(
                pattern.to_lowercase(),
                LookupEntry {
                    kind: prediction.kind,
                    confidence: prediction.confidence,
                    pattern: pattern.clone(),
                },
            );
        }

        let mut entries = base.clone();
        for (key, entry) in base.iter().take(MAX_VARIATION_SOURCES) {
            let words: Vec<&str> = key.split_whitespace().collect();
            for (i, word) in words.iter().enumerate() {
                if word.len() > 4 || !word.chars().all(|c| c.is_ascii_digit()) {
                    continue;
                }
                let mut variation = words.clone();
                variation[i] = AMOUNT_TOKEN;
                let variation = variation.join(" ");
                if base.contains_key(&variation) {
                    continue;
                }
                entries.entry(variation).or_insert_with(|| LookupEntry {
                    kind: entry.kind,
                    confidence: entry.confidence * VARIATION_DISCOUNT,
                    pattern: entry.pattern.clone(),
                });
            }
        }

        tracing::info!(patterns = base.len(), entries = entries.len(), "lookup table built");
        LookupTable { entries }
    }

    pub fn get(&self, key: &str) -> Option<&LookupEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LookupEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Same decision order as the generated app class
pub struct LookupClassifier {
    table: LookupTable,
    keywords: KeywordEngine,
}

impl LookupClassifier {
    pub fn new(table: LookupTable, keywords: KeywordEngine) -> Self {
        LookupClassifier { table, keywords }
    }

    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    pub fn keywords(&self) -> &KeywordEngine {
        &self.keywords
    }

    pub fn predict(&self, text: &str) -> Prediction {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return Prediction::new(TransactionKind::Expense, 0.5, "Empty input");
        }

        if let Some(entry) = self.table.get(&normalized) {
            return Prediction::new(entry.kind, entry.confidence, entry.pattern.clone());
        }

        if let Some(entry) = self.table.get(&mask_amounts(&normalized)) {
            return Prediction::new(entry.kind, entry.confidence, entry.pattern.clone());
        }

        self.keywords.classify(&normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_keyword(text: &str) -> Prediction {
        KeywordEngine::fallback().classify(text)
    }

    fn classifier() -> LookupClassifier {
        let table = LookupTable::build(&common_patterns(), by_keyword);
        LookupClassifier::new(table, KeywordEngine::fallback())
    }

    #[test]
    fn test_common_patterns_are_deduplicated() {
        let patterns = common_patterns();
        // "Paid 50 for groceries" is both hand-written and generated
        assert_eq!(patterns.len(), 28 + 60 - 1);
        assert_eq!(patterns.iter().filter(|p| *p == "Paid 50 for groceries").count(), 1);
    }

    #[test]
    fn test_mask_amounts() {
        assert_eq!(mask_amounts("paid 50 for gas"), "paid AMOUNT for gas");
        assert_eq!(mask_amounts("$1,250.75 rent"), "$AMOUNT,AMOUNT.AMOUNT rent");
        assert_eq!(mask_amounts("no digits"), "no digits");
        // only ASCII digits count, as in the generated Java
        assert_eq!(mask_amounts("paid ٣ for tea"), "paid ٣ for tea");
    }

    #[test]
    fn test_variations_are_discounted() {
        let table = LookupTable::build(&["Electricity bill 75".to_string()], by_keyword);
        let base = table.get("electricity bill 75").unwrap();
        let variation = table.get("electricity bill AMOUNT").unwrap();
        assert_eq!(variation.kind, base.kind);
        assert!((variation.confidence - base.confidence * 0.9).abs() < 1e-12);
        assert_eq!(variation.pattern, "Electricity bill 75");
    }

    #[test]
    fn test_long_numbers_get_no_variation() {
        let table = LookupTable::build(&["Freelance payment 20000".to_string()], by_keyword);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_predict_order() {
        let c = classifier();

        let p = c.predict("   ");
        assert_eq!(p.analysis, "Empty input");
        assert_eq!(p.confidence, 0.5);

        let p = c.predict("  Electricity BILL 75 ");
        assert_eq!(p.analysis, "Electricity bill 75");

        let p = c.predict("Internet bill 99");
        assert_eq!(p.analysis, "Internet bill 60");

        let p = c.predict("Received salary $5000 from work");
        assert_eq!(p.analysis, "Keyword analysis");
        assert_eq!(p.kind, TransactionKind::Income);
    }
}
