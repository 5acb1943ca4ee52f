// 🏷️ Keyword Rules - Rules as Data
// Keyword tables for the fallback classifier and the fixed vocabularies

use crate::artifacts::Vocabulary;
use crate::dataset::TransactionKind;
use crate::models::Prediction;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Substring to look for (supports wildcards with *)
    pub keyword: String,

    /// Kind this keyword votes for
    pub kind: TransactionKind,

    /// Vote weight
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl KeywordRule {
    pub fn new(keyword: &str, kind: TransactionKind) -> Self {
        KeywordRule {
            keyword: keyword.to_lowercase(),
            kind,
            weight: 1.0,
        }
    }

    /// Case-insensitive substring match; `*` matches any run of characters
    pub fn matches(&self, text: &str) -> bool {
        let keyword = self.keyword.to_lowercase();
        let text = text.to_lowercase();

        if !keyword.contains('*') {
            return text.contains(&keyword);
        }

        // every literal part must appear, in order
        let mut pos = 0;
        for part in keyword.split('*').filter(|p| !p.is_empty()) {
            match text[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
        true
    }
}

// ============================================================================
// KEYWORD TABLES
// ============================================================================

pub const EXPENSE_KEYWORDS: [&str; 49] = [
    "paid", "spent", "bought", "cost", "fee", "charge", "purchased",
    "got myself", "treated myself", "bought myself",
    "shopping", "store", "mall", "market", "online",
    "food", "lunch", "dinner", "coffee", "groceries", "restaurant",
    "gas", "fuel", "transport", "taxi", "uber", "bus",
    "movie", "cinema", "entertainment", "tickets", "show",
    "clothes", "shirt", "tshirt", "shoes", "dress", "jewelry",
    "bill", "electricity", "water", "internet", "phone", "rent",
    "insurance", "subscription", "membership", "gym", "spa",
];

pub const INCOME_KEYWORDS: [&str; 23] = [
    "received", "got", "earned", "salary", "income", "payment",
    "deposit", "credited", "bonus", "commission", "freelance",
    "business", "client", "customer", "work", "job", "company",
    "transfer", "wire", "check", "cash", "money", "funds",
];

/// Tokens of the basic vocabulary, ids as shipped with the first app build
pub const BASIC_VOCABULARY: [(&str, u32); 34] = [
    ("<PAD>", 0), ("<UNK>", 1), ("<CLS>", 101), ("<SEP>", 102),
    ("paid", 4), ("received", 5), ("spent", 6), ("got", 7), ("bought", 8),
    ("cost", 9), ("salary", 10), ("earned", 11), ("income", 12), ("money", 13),
    ("for", 14), ("from", 15), ("i", 16), ("myself", 17), ("tshirt", 18),
    ("that", 19), ("3000", 20), ("payment", 21), ("bonus", 22), ("fee", 23),
    ("deposit", 24), ("credit", 25), ("cash", 26), ("transfer", 27), ("bill", 28),
    ("rent", 29), ("food", 30), ("gas", 31), ("shopping", 32), ("entertainment", 33),
];

pub const ENHANCED_VOCABULARY: [(&str, u32); 84] = [
    // special
    ("<PAD>", 0), ("<UNK>", 1), ("<CLS>", 101), ("<SEP>", 102),
    // financial verbs and nouns
    ("paid", 4), ("received", 5), ("spent", 6), ("got", 7), ("bought", 8),
    ("cost", 9), ("salary", 10), ("earned", 11), ("income", 12), ("money", 13),
    ("payment", 14), ("bonus", 15), ("fee", 16), ("deposit", 17), ("credit", 18),
    ("cash", 19), ("transfer", 20), ("bill", 21), ("rent", 22), ("food", 23),
    ("gas", 24), ("shopping", 25), ("entertainment", 26),
    // personal
    ("i", 27), ("my", 28), ("myself", 29), ("me", 30), ("personal", 31), ("own", 32),
    // prepositions
    ("for", 33), ("from", 34), ("to", 35), ("at", 36), ("on", 37), ("with", 38), ("by", 39),
    // currency
    ("dollars", 40), ("bucks", 41), ("rupees", 42), ("rs", 43), ("₹", 44), ("$", 45),
    // categories
    ("groceries", 46), ("lunch", 47), ("dinner", 48), ("coffee", 49), ("movie", 50),
    ("tickets", 51), ("clothes", 52), ("shirt", 53), ("tshirt", 54), ("shoes", 55),
    ("electricity", 56), ("water", 57), ("internet", 58), ("phone", 59),
    // business
    ("client", 60), ("customer", 61), ("business", 62), ("freelance", 63), ("work", 64),
    ("job", 65), ("company", 66), ("office", 67),
    // time
    ("today", 68), ("yesterday", 69), ("last", 70), ("month", 71), ("week", 72), ("day", 73),
    // context
    ("new", 74), ("old", 75), ("expensive", 76), ("cheap", 77), ("discount", 78),
    ("sale", 79), ("online", 80), ("store", 81), ("market", 82), ("mall", 83),
];

pub fn basic_vocabulary() -> Vocabulary {
    Vocabulary::from_entries(BASIC_VOCABULARY)
}

pub fn enhanced_vocabulary() -> Vocabulary {
    Vocabulary::from_entries(ENHANCED_VOCABULARY)
}

// ============================================================================
// KEYWORD ENGINE
// ============================================================================

/// Summed keyword votes per kind
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeywordScore {
    pub expense: f64,
    pub income: f64,
}

pub struct KeywordEngine {
    rules: Vec<KeywordRule>,
}

impl KeywordEngine {
    pub fn new() -> Self {
        KeywordEngine { rules: Vec::new() }
    }

    /// Load rules from a JSON array of `{keyword, kind, weight}`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read keyword file: {:?}", path.as_ref()))?;

        let rules: Vec<KeywordRule> =
            serde_json::from_str(&content).context("Failed to parse keyword JSON")?;

        Ok(KeywordEngine::from_rules(rules))
    }

    pub fn from_rules(rules: Vec<KeywordRule>) -> Self {
        KeywordEngine { rules }
    }

    /// The tables the generated app classifier falls back to
    pub fn fallback() -> Self {
        let rules = EXPENSE_KEYWORDS
            .iter()
            .map(|k| KeywordRule::new(k, TransactionKind::Expense))
            .chain(
                INCOME_KEYWORDS
                    .iter()
                    .map(|k| KeywordRule::new(k, TransactionKind::Income)),
            )
            .collect();
        KeywordEngine { rules }
    }

    pub fn add_rule(&mut self, rule: KeywordRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn keywords(&self, kind: TransactionKind) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.keyword.as_str())
            .collect()
    }

    pub fn score(&self, text: &str) -> KeywordScore {
        let mut score = KeywordScore::default();
        for rule in self.rules.iter().filter(|r| r.matches(text)) {
            match rule.kind {
                TransactionKind::Expense => score.expense += rule.weight,
                TransactionKind::Income => score.income += rule.weight,
            }
        }
        score
    }

    /// Majority vote; a tie (including no match) falls back to expense
    pub fn classify(&self, text: &str) -> Prediction {
        let score = self.score(text);
        let confidence = |votes: f64| (0.5 + votes * 0.1).min(0.8);

        if score.expense > score.income {
            Prediction::new(TransactionKind::Expense, confidence(score.expense), "Keyword analysis")
        } else if score.income > score.expense {
            Prediction::new(TransactionKind::Income, confidence(score.income), "Keyword analysis")
        } else {
            Prediction::new(TransactionKind::Expense, 0.6, "Default classification")
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for KeywordEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_plain_keyword_match() {
        let rule = KeywordRule::new("salary", TransactionKind::Income);
        assert!(rule.matches("Received SALARY today"));
        assert!(!rule.matches("paid rent"));
    }

    #[test]
    fn test_wildcard_keyword() {
        let rule = KeywordRule::new("got*myself", TransactionKind::Expense);
        assert!(rule.matches("I got a shirt for myself"));
        assert!(!rule.matches("myself got"));
    }

    #[test]
    fn test_fallback_counts() {
        let engine = KeywordEngine::fallback();
        assert_eq!(engine.rule_count(), 72);

        // paid, bill, electricity vs nothing
        let score = engine.score("paid electricity bill 75");
        assert_eq!(score.expense, 3.0);
        assert_eq!(score.income, 0.0);
    }

    #[test]
    fn test_classify_confidence_is_capped() {
        let engine = KeywordEngine::fallback();
        let p = engine.classify("paid electricity bill 75");
        assert_eq!(p.kind, TransactionKind::Expense);
        assert!((p.confidence - 0.8).abs() < 1e-9);

        // received, salary
        let p = engine.classify("received salary");
        assert_eq!(p.kind, TransactionKind::Income);
        assert!((p.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_tie_defaults_to_expense() {
        let p = KeywordEngine::fallback().classify("hello there");
        assert_eq!(p.kind, TransactionKind::Expense);
        assert_eq!(p.confidence, 0.6);
        assert_eq!(p.analysis, "Default classification");
    }

    #[test]
    fn test_rules_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("keywords.json");
        fs::write(&path, r#"[{"keyword": "refund", "kind": "INCOME"}]"#).unwrap();

        let engine = KeywordEngine::from_file(&path).unwrap();
        assert_eq!(engine.rules()[0].weight, 1.0);
        assert_eq!(engine.classify("store refund").kind, TransactionKind::Income);
    }

    #[test]
    fn test_vocabularies_have_listed_tokens() {
        let basic = basic_vocabulary();
        assert_eq!(basic.len(), 34);
        assert_eq!(basic.get("3000"), Some(20));

        let enhanced = enhanced_vocabulary();
        assert_eq!(enhanced.len(), 84);
        assert_eq!(enhanced.get("₹"), Some(44));
        assert_eq!(enhanced.get("mall"), Some(83));

        let ids: HashSet<u32> = enhanced.iter().map(|(_, id)| id).collect();
        assert_eq!(ids.len(), 84);
    }
}
