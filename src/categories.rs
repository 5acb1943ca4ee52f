// 🏷️ Categories - Title suggestion for detected transactions
//
// Categories are checked in registry order; the first one whose keywords
// appear in the text names the transaction. Nothing matching falls back to a
// title built from the transaction kind.

use crate::dataset::TransactionKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Display name, also used as the transaction title
    pub name: String,

    /// Kind this category usually belongs to
    pub kind: TransactionKind,

    /// Icon for console output (e.g. "🍽️")
    pub icon: String,

    /// Lowercase substrings that select this category
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: &str, kind: TransactionKind, icon: &str, keywords: &[&str]) -> Self {
        Category {
            name: name.to_string(),
            kind,
            icon: icon.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn matches(&self, lower_text: &str) -> bool {
        self.keywords.iter().any(|k| lower_text.contains(k.as_str()))
    }
}

/// Ordered list of categories
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        CategoryRegistry {
            categories: Vec::new(),
        }
    }

    /// The categories the mobile app knows, in matching order
    pub fn with_defaults() -> Self {
        use TransactionKind::{Expense, Income};

        let mut registry = CategoryRegistry::new();
        registry.register(Category::new(
            "Food & Dining",
            Expense,
            "🍽️",
            &["food", "lunch", "dinner", "restaurant", "coffee", "groceries"],
        ));
        registry.register(Category::new(
            "Transportation",
            Expense,
            "🚗",
            &["gas", "fuel", "transport", "taxi", "uber", "bus"],
        ));
        registry.register(Category::new(
            "Entertainment",
            Expense,
            "🎬",
            &["movie", "cinema", "entertainment", "tickets"],
        ));
        registry.register(Category::new(
            "Shopping",
            Expense,
            "🛍️",
            &["clothes", "shirt", "tshirt", "shoes", "shopping"],
        ));
        registry.register(Category::new(
            "Bills & Utilities",
            Expense,
            "💡",
            &["bill", "electricity", "water", "internet", "phone", "rent"],
        ));
        registry.register(Category::new("Salary", Income, "💼", &["salary", "payroll"]));
        registry.register(Category::new(
            "Freelance Income",
            Income,
            "💻",
            &["freelance", "client"],
        ));
        registry
    }

    pub fn register(&mut self, category: Category) {
        self.categories.push(category);
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// First category whose keywords appear in the text
    pub fn find(&self, text: &str) -> Option<&Category> {
        let lower = text.to_lowercase();
        self.categories.iter().find(|c| c.matches(&lower))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        let lower = name.to_lowercase();
        self.categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    pub fn by_kind(&self, kind: TransactionKind) -> Vec<&Category> {
        self.categories.iter().filter(|c| c.kind == kind).collect()
    }

    pub fn count(&self) -> usize {
        self.categories.len()
    }

    /// Category name, or "Income Transaction" / "Expense Transaction"
    pub fn suggest_title(&self, text: &str, kind: TransactionKind) -> String {
        match self.find(text) {
            Some(category) => category.name.clone(),
            None => match kind {
                TransactionKind::Income => "Income Transaction".to_string(),
                TransactionKind::Expense => "Expense Transaction".to_string(),
            },
        }
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_ordered() {
        let registry = CategoryRegistry::with_defaults();
        assert_eq!(registry.count(), 7);
        assert_eq!(registry.categories()[0].name, "Food & Dining");
        assert_eq!(registry.by_kind(TransactionKind::Income).len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let registry = CategoryRegistry::with_defaults();
        // "groceries" (Food) is checked before "gas" (Transportation)
        assert_eq!(
            registry.suggest_title("Paid 50 for groceries and gas", TransactionKind::Expense),
            "Food & Dining"
        );
        assert_eq!(
            registry.suggest_title("Paid electricity bill $75", TransactionKind::Expense),
            "Bills & Utilities"
        );
        assert_eq!(
            registry.suggest_title("Got payment from CLIENT $1000", TransactionKind::Income),
            "Freelance Income"
        );
    }

    #[test]
    fn test_fallback_titles() {
        let registry = CategoryRegistry::with_defaults();
        assert_eq!(registry.suggest_title("gift 20", TransactionKind::Income), "Income Transaction");
        assert_eq!(registry.suggest_title("misc 20", TransactionKind::Expense), "Expense Transaction");
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let registry = CategoryRegistry::with_defaults();
        assert_eq!(registry.find_by_name("salary").unwrap().icon, "💼");
        assert!(registry.find_by_name("Travel").is_none());
    }
}
