// 🧠 Semantic Features - Money-flow pattern flags
// 28 hand-coded features: containment checks plus weighted scores

use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 28;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gave_me_pattern",
    "lent_me_pattern",
    "paid_me_pattern",
    "received_from",
    "got_from",
    "money_from",
    "came_from",
    "gave_away",
    "paid_for",
    "spent_on",
    "cost_me",
    "got_myself",
    "for_myself",
    "treated_myself",
    "salary_income",
    "freelance_income",
    "business_income",
    "bonus_income",
    "bill_payment",
    "shopping_expense",
    "food_expense",
    "transport_expense",
    "has_amount",
    "has_money_word",
    "has_personal_pronoun",
    "income_semantic_score",
    "expense_semantic_score",
    "net_semantic_score",
];

pub const INCOME_SCORE: usize = 25;
pub const EXPENSE_SCORE: usize = 26;
pub const NET_SCORE: usize = 27;

/// (feature index, weight) pairs summed into the income score
const INCOME_WEIGHTS: [(usize, f64); 11] = [
    (0, 3.0),
    (1, 3.0),
    (2, 3.0),
    (3, 2.5),
    (4, 2.0),
    (5, 2.0),
    (6, 1.5),
    (14, 2.5),
    (15, 2.5),
    (16, 2.0),
    (17, 2.0),
];

const EXPENSE_WEIGHTS: [(usize, f64); 11] = [
    (7, 2.5),
    (8, 2.0),
    (9, 2.0),
    (10, 2.5),
    (11, 3.0),
    (12, 2.5),
    (13, 2.5),
    (18, 2.0),
    (19, 2.0),
    (20, 1.5),
    (21, 1.5),
];

/// Metadata written next to the trained forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticFeatureInfo {
    pub feature_names: Vec<String>,
    pub num_features: usize,
    pub model_type: String,
}

impl Default for SemanticFeatureInfo {
    fn default() -> Self {
        SemanticFeatureInfo {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            num_features: FEATURE_COUNT,
            model_type: "semantic_random_forest".to_string(),
        }
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Stateless extractor
pub struct SemanticFeatures;

impl SemanticFeatures {
    pub fn extract(text: &str) -> [f64; FEATURE_COUNT] {
        let t = text.to_lowercase();
        let words: Vec<&str> = t.split_whitespace().collect();
        let mut f = [0.0; FEATURE_COUNT];

        // direct money flow
        f[0] = flag(t.contains("gave me") || t.contains("gave to me"));
        f[1] = flag(t.contains("lent me") || t.contains("lent to me"));
        f[2] = flag(t.contains("paid me"));

        // receiving
        f[3] = flag(t.contains("received from"));
        f[4] = flag(t.contains("got from") && !t.contains("myself"));
        f[5] = flag(t.contains("money from"));
        f[6] = flag(t.contains("came from"));

        // giving
        f[7] = flag(t.contains("gave away") || t.contains("gave to"));
        f[8] = flag(t.contains("paid for"));
        f[9] = flag(t.contains("spent on"));
        f[10] = flag(t.contains("cost"));

        // personal purchases
        f[11] = flag(t.contains("got myself") || t.contains("bought myself"));
        f[12] = flag(t.contains("for myself") || t.contains("for me"));
        f[13] = flag(t.contains("treated myself"));

        // income sources
        f[14] = flag(t.contains("salary") || t.contains("payroll"));
        f[15] = flag(t.contains("freelance") || t.contains("client"));
        f[16] = flag(t.contains("business") || t.contains("company"));
        f[17] = flag(t.contains("bonus") || t.contains("commission"));

        // expense categories
        f[18] = flag(contains_any(&t, &["bill", "electricity", "internet", "phone", "rent", "water"]));
        f[19] = flag(contains_any(&t, &["shopping", "bought", "purchase", "store", "mall"]));
        f[20] = flag(contains_any(&t, &["food", "lunch", "dinner", "restaurant", "coffee"]));
        f[21] = flag(contains_any(&t, &["gas", "taxi", "uber", "bus", "train"]));

        // context
        f[22] = flag(text.chars().any(|c| c.is_ascii_digit()));
        f[23] = flag(contains_any(&t, &["money", "cash", "rupees", "dollars"]));
        f[24] = flag(words.iter().any(|w| matches!(*w, "i" | "me" | "my" | "myself")));

        let income: f64 = INCOME_WEIGHTS.iter().map(|(i, w)| f[*i] * w).sum();
        let expense: f64 = EXPENSE_WEIGHTS.iter().map(|(i, w)| f[*i] * w).sum();
        f[INCOME_SCORE] = income;
        f[EXPENSE_SCORE] = expense;
        f[NET_SCORE] = income - expense;

        f
    }

    /// Feature matrix for a batch of texts
    pub fn extract_all<S: AsRef<str>>(texts: &[S]) -> Vec<Vec<f64>> {
        texts
            .iter()
            .map(|t| SemanticFeatures::extract(t.as_ref()).to_vec())
            .collect()
    }
}
