// 🧪 Synthesis - Templated and hand-written training sentences
// Every builder gets its examples from here

use crate::dataset::{Dataset, Example, TransactionKind};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

// ============================================================================
// HAND-WRITTEN EXAMPLES
// ============================================================================

const BASIC_EXPENSES: &[&str] = &[
    "I paid $50 for groceries",
    "Spent $20 on coffee",
    "Bought a shirt for $30",
    "Cost of lunch was $15",
    "Paid $100 for gas",
    "Got myself a tshirt that cost 3000",
    "Purchased new shoes for $80",
    "Bought groceries for $45",
    "Paid electricity bill $75",
    "Spent $25 on movie tickets",
];

const BASIC_INCOMES: &[&str] = &[
    "Received salary $5000",
    "Got payment from client $1000",
    "Earned $200 from freelance",
    "Salary deposited $3000",
    "Received bonus $500",
    "Got money from John $200",
    "Income from business $1500",
    "Payment received $800",
    "Earned commission $300",
    "Salary credit $2500",
];

const CONTEXT_INCOMES: &[&str] = &[
    "received salary payment of 5000",
    "got paid from work today",
    "salary deposited in account",
    "bonus received from company",
    "commission payment received",
    "freelance payment credited",
    "refund from amazon purchase",
    "money from mom for birthday",
    "gift received from friend",
    "dividend payment from stocks",
    "interest earned on savings",
    "someone gave me 1000 rupees",
    "friend lent me 500 cash",
    "boss paid me bonus amount",
    "got money from client payment",
    "transfer received in bank",
    "deposit in savings account",
    "cash received from customer",
    "payment credited to account",
    "income from part time job",
    "won prize money",
    "lottery winnings received",
    "inheritance money received",
    "tax refund deposited",
    "insurance claim payment",
];

const CONTEXT_EXPENSES: &[&str] = &[
    "paid electricity bill 1200",
    "bought groceries from supermarket",
    "spent on lunch at restaurant",
    "taxi fare to airport",
    "coffee purchase at starbucks",
    "rent payment for apartment",
    "gas bill paid online",
    "shopping expenses at mall",
    "movie tickets for family",
    "clothes bought from store",
    "phone bill payment",
    "internet bill paid",
    "water bill settlement",
    "gave money to friend for help",
    "paid for dinner at hotel",
    "spent on transportation",
    "bought medicine from pharmacy",
    "gym membership fee",
    "book purchase online",
    "paid insurance premium",
    "fuel cost for car",
    "parking fee paid",
    "subscription payment",
    "maintenance cost paid",
    "repair bill settled",
];

/// The 10 + 10 examples behind the logistic-regression builder
pub fn basic_examples() -> Dataset {
    Dataset::from_lists(BASIC_EXPENSES, BASIC_INCOMES)
}

/// The 25 + 25 contextual examples behind the embedding builder (incomes first)
pub fn contextual_examples() -> Dataset {
    let mut ds = Dataset::default();
    ds.extend(CONTEXT_INCOMES.iter().map(|t| Example::income(*t)));
    ds.extend(CONTEXT_EXPENSES.iter().map(|t| Example::expense(*t)));
    ds
}

// ============================================================================
// TEMPLATES
// ============================================================================

/// Which amount range a template draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Personal,
    Bill,
    Regular,
    Income,
}

impl TemplateKind {
    pub fn classify(template: &str, kind: TransactionKind) -> Self {
        if kind == TransactionKind::Income {
            return TemplateKind::Income;
        }
        let lower = template.to_lowercase();
        if lower.contains("myself") || lower.contains("personal") {
            TemplateKind::Personal
        } else if ["bill", "electricity", "internet", "phone"]
            .iter()
            .any(|w| lower.contains(w))
        {
            TemplateKind::Bill
        } else {
            TemplateKind::Regular
        }
    }

    pub fn amount_range(&self) -> RangeInclusive<u32> {
        match self {
            TemplateKind::Personal => 10..=2000,
            TemplateKind::Bill => 20..=500,
            TemplateKind::Regular => 5..=1000,
            TemplateKind::Income => 100..=10000,
        }
    }
}

/// Fill `{amount}`, `{item}` and `{source}` slots
pub fn render(template: &str, amount: u32, item: &str, source: &str) -> String {
    template
        .replace("{amount}", &amount.to_string())
        .replace("{item}", item)
        .replace("{source}", source)
}

/// Template pools plus the hand-picked hard cases appended after sampling
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub name: &'static str,
    pub expense_templates: Vec<&'static str>,
    pub income_templates: Vec<&'static str>,
    pub categories: Vec<&'static str>,
    pub sources: Vec<&'static str>,
    pub challenging: Vec<(&'static str, TransactionKind)>,
}

impl TemplateSet {
    /// Pool used by the random forest builder
    pub fn advanced() -> Self {
        use TransactionKind::{Expense, Income};

        TemplateSet {
            name: "advanced",
            expense_templates: vec![
                // personal purchases
                "I got myself a {item} that cost ${amount}",
                "Bought myself {item} for ${amount}",
                "Treated myself to {item} for ${amount}",
                "Purchased {item} for myself costing ${amount}",
                "Got me a {item} that was ${amount}",
                // daily
                "Paid ${amount} for {item}",
                "Spent ${amount} on {item}",
                "Cost of {item} was ${amount}",
                "Bought {item} for ${amount}",
                "Got {item} for ${amount}",
                "Purchased {item} costing ${amount}",
                // services and bills
                "Paid ${amount} {item} bill",
                "Electricity bill was ${amount}",
                "Internet cost ${amount}",
                "Phone bill ${amount}",
                "Rent payment ${amount}",
                "Water bill ${amount}",
                "Gas bill ${amount}",
                // transportation
                "Gas cost ${amount}",
                "Uber ride ${amount}",
                "Taxi fare ${amount}",
                "Bus ticket ${amount}",
                "Train ticket ${amount}",
                "Parking fee ${amount}",
                // food
                "Lunch cost ${amount}",
                "Dinner at restaurant ${amount}",
                "Coffee and pastry ${amount}",
                "Groceries bill ${amount}",
                "Takeout food ${amount}",
                "Restaurant bill ${amount}",
                // entertainment
                "Movie tickets ${amount}",
                "Concert tickets ${amount}",
                "Streaming subscription ${amount}",
                "Game purchase ${amount}",
                "Book purchase ${amount}",
                // shopping
                "New clothes ${amount}",
                "Shoes cost ${amount}",
                "Bought electronics for ${amount}",
                "Online shopping ${amount}",
                "Supermarket bill ${amount}",
                // health
                "Pharmacy bill ${amount}",
                "Doctor visit ${amount}",
                "Dental bill ${amount}",
                "Gym membership ${amount}",
                "Haircut ${amount}",
                // education
                "Course fee ${amount}",
                "Book purchase ${amount}",
                "Online learning ${amount}",
                "Tuition fee ${amount}",
            ],
            income_templates: vec![
                "Salary deposited ${amount}",
                "Got paid ${amount} from work",
                "Monthly salary ${amount}",
                "Received paycheck ${amount}",
                "Work payment ${amount}",
                "Payroll deposit ${amount}",
                "Freelance payment ${amount}",
                "Client paid ${amount}",
                "Business income ${amount}",
                "Project payment ${amount}",
                "Consulting fee ${amount}",
                "Invoice payment ${amount}",
                "Received ${amount} from {source}",
                "Got ${amount} payment",
                "Earned ${amount} from {source}",
                "Income of ${amount} received",
                "Bonus payment ${amount}",
                "Commission earned ${amount}",
                "Dividend payment ${amount}",
                "Interest earned ${amount}",
                "Refund received ${amount}",
                "Gift money ${amount}",
            ],
            categories: vec![
                "food", "lunch", "dinner", "coffee", "groceries", "restaurant", "snack",
                "gas", "transport", "taxi", "uber", "bus", "train", "parking",
                "movie", "cinema", "entertainment", "tickets", "show", "concert",
                "clothes", "shirt", "tshirt", "shoes", "dress", "shopping", "electronics",
                "electricity", "water", "internet", "phone", "rent", "utilities", "gas bill",
                "subscription", "streaming", "game", "book", "course",
                "pharmacy", "doctor", "dental", "gym", "haircut", "health",
            ],
            sources: vec![
                "work", "job", "company", "office", "business", "freelance",
                "client", "customer", "project", "consulting", "investment",
                "bank", "friend", "family", "refund", "bonus", "commission",
            ],
            challenging: vec![
                // personal purchases
                ("I got myself a tshirt that cost 3000", Expense),
                ("Got myself new shoes for 150", Expense),
                ("Treated myself to dinner for 75", Expense),
                ("Bought myself a phone for 800", Expense),
                ("Purchased clothes for myself", Expense),
                ("Got me a new shirt", Expense),
                // money received
                ("My father gave me 200", Income),
                ("Father gave me money", Income),
                ("Mother gave me 500", Income),
                ("Friend gave me cash", Income),
                ("Someone gave me 100", Income),
                ("Gave me money", Income),
                ("Received money from father", Income),
                ("Got money from mother", Income),
                ("Received cash from friend", Income),
                ("Money came from family", Income),
                // salary
                ("Received salary 5000 from work", Income),
                ("Got paid 3000 this month", Income),
                ("Salary deposited 4000", Income),
                ("Payroll payment 3500", Income),
                // freelance and business
                ("Got payment from client for project", Income),
                ("Freelance income 2000", Income),
                ("Business payment received 1500", Income),
                ("Client paid 800", Income),
                ("Invoice payment 1200", Income),
                // bills
                ("Paid electricity bill 75", Expense),
                ("Spent 25 on movie tickets", Expense),
                ("Bought groceries for 45", Expense),
                ("Gas bill payment 60", Expense),
                ("Internet bill 50", Expense),
                // "gave me" variations
                ("Gave me 100 dollars", Income),
                ("Gave me money", Income),
                ("Gave me cash", Income),
                ("Gave me 50", Income),
                ("Someone gave me 200", Income),
                ("They gave me money", Income),
                ("He gave me 300", Income),
                ("She gave me cash", Income),
                ("Family gave me 150", Income),
                ("Friend gave me money", Income),
            ],
        }
    }

    /// Pool used by the convolutional network builder
    pub fn comprehensive() -> Self {
        use TransactionKind::{Expense, Income};

        TemplateSet {
            name: "comprehensive",
            expense_templates: vec![
                "I got myself a {item} that cost ${amount}",
                "Bought myself {item} for ${amount}",
                "Treated myself to {item} for ${amount}",
                "Purchased {item} for ${amount} as a personal item",
                "Paid ${amount} for {item}",
                "Spent ${amount} on {item}",
                "Cost of {item} was ${amount}",
                "Bought {item} for ${amount}",
                "Got {item} for ${amount}",
                "Paid ${amount} {item} bill",
                "Electricity bill was ${amount}",
                "Internet cost ${amount}",
                "Phone bill ${amount}",
                "Rent payment ${amount}",
                "Gas cost ${amount}",
                "Uber ride ${amount}",
                "Taxi fare ${amount}",
                "Bus ticket ${amount}",
                "Train ticket ${amount}",
                "Lunch cost ${amount}",
                "Dinner at restaurant ${amount}",
                "Coffee and pastry ${amount}",
                "Groceries bill ${amount}",
                "Takeout food ${amount}",
                "Movie tickets ${amount}",
                "Concert tickets ${amount}",
                "Streaming subscription ${amount}",
                "Game purchase ${amount}",
                "New clothes ${amount}",
                "Shoes cost ${amount}",
                "Bought electronics for ${amount}",
                "Online shopping ${amount}",
            ],
            income_templates: vec![
                "Salary deposited ${amount}",
                "Got paid ${amount} from work",
                "Monthly salary ${amount}",
                "Received paycheck ${amount}",
                "Work payment ${amount}",
                "Freelance payment ${amount}",
                "Client paid ${amount}",
                "Business income ${amount}",
                "Project payment ${amount}",
                "Consulting fee ${amount}",
                "Received ${amount} from {source}",
                "Got ${amount} payment",
                "Earned ${amount} from {source}",
                "Income of ${amount} received",
                "Bonus payment ${amount}",
                "Commission earned ${amount}",
                "Dividend payment ${amount}",
                "Interest earned ${amount}",
            ],
            categories: vec![
                "food", "lunch", "dinner", "coffee", "groceries", "restaurant",
                "gas", "transport", "taxi", "uber", "bus", "train",
                "movie", "cinema", "entertainment", "tickets", "show",
                "clothes", "shirt", "tshirt", "shoes", "dress", "shopping",
                "electricity", "water", "internet", "phone", "rent", "utilities",
                "subscription", "streaming", "game", "electronics",
            ],
            sources: vec![
                "work", "job", "company", "office", "business", "freelance",
                "client", "customer", "project", "consulting", "investment",
            ],
            challenging: vec![
                ("I got myself a tshirt that cost 3000", Expense),
                ("Got myself new shoes for 150", Expense),
                ("Treated myself to dinner for 75", Expense),
                ("Bought myself a phone for 800", Expense),
                ("Received salary 5000 from work", Income),
                ("Got payment from client for project", Income),
                ("Freelance income 2000", Income),
                ("Business payment received 1500", Income),
            ],
        }
    }

    /// Look up a preset by name (`advanced` / `comprehensive`)
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "advanced" => Some(TemplateSet::advanced()),
            "comprehensive" => Some(TemplateSet::comprehensive()),
            _ => None,
        }
    }

    fn sample_one<R: Rng>(&self, kind: TransactionKind, rng: &mut R) -> String {
        let pool = match kind {
            TransactionKind::Expense => &self.expense_templates,
            TransactionKind::Income => &self.income_templates,
        };
        let template = pool.choose(rng).copied().unwrap_or("{amount}");
        let amount = rng.gen_range(TemplateKind::classify(template, kind).amount_range());
        let item = self.categories.choose(rng).copied().unwrap_or("item");
        let source = self.sources.choose(rng).copied().unwrap_or("work");
        render(template, amount, item, source)
    }

    /// `count / 2` expenses, then `count / 2` incomes, then the hard cases
    pub fn synthesize<R: Rng>(&self, count: usize, rng: &mut R) -> Dataset {
        let half = count / 2;
        let mut ds = Dataset::new(Vec::with_capacity(half * 2 + self.challenging.len()));

        for _ in 0..half {
            ds.push(Example::expense(self.sample_one(TransactionKind::Expense, rng)));
        }
        for _ in 0..half {
            ds.push(Example::income(self.sample_one(TransactionKind::Income, rng)));
        }
        ds.extend(
            self.challenging
                .iter()
                .map(|(text, kind)| Example::new(*text, *kind)),
        );

        tracing::info!(
            preset = self.name,
            total = ds.len(),
            expenses = ds.count(TransactionKind::Expense),
            incomes = ds.count(TransactionKind::Income),
            "synthesized training samples"
        );

        ds
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hand_lists_are_balanced() {
        let basic = basic_examples();
        assert_eq!(basic.len(), 20);
        assert_eq!(basic.count(TransactionKind::Expense), 10);

        let ctx = contextual_examples();
        assert_eq!(ctx.len(), 50);
        assert_eq!(ctx.examples[0].kind, TransactionKind::Income);
        assert_eq!(ctx.count(TransactionKind::Income), 25);
    }

    #[test]
    fn test_preset_pool_sizes() {
        let adv = TemplateSet::advanced();
        assert_eq!(adv.expense_templates.len(), 49);
        assert_eq!(adv.income_templates.len(), 22);
        assert_eq!(adv.categories.len(), 45);
        assert_eq!(adv.sources.len(), 17);
        assert_eq!(adv.challenging.len(), 40);

        let comp = TemplateSet::comprehensive();
        assert_eq!(comp.expense_templates.len(), 32);
        assert_eq!(comp.income_templates.len(), 18);
        assert_eq!(comp.challenging.len(), 8);
    }

    #[test]
    fn test_template_kind() {
        use TransactionKind::*;
        assert_eq!(TemplateKind::classify("Bought myself {item}", Expense), TemplateKind::Personal);
        assert_eq!(
            TemplateKind::classify("Purchased {item} as a personal item", Expense),
            TemplateKind::Personal
        );
        assert_eq!(TemplateKind::classify("Phone bill ${amount}", Expense), TemplateKind::Bill);
        assert_eq!(TemplateKind::classify("Taxi fare ${amount}", Expense), TemplateKind::Regular);
        assert_eq!(TemplateKind::classify("Phone bill ${amount}", Income), TemplateKind::Income);
    }

    #[test]
    fn test_render_fills_every_slot() {
        let text = render("Received ${amount} from {source} for {item}", 42, "coffee", "client");
        assert_eq!(text, "Received $42 from client for coffee");
    }

    #[test]
    fn test_synthesize_counts_and_labels() {
        let mut rng = StdRng::seed_from_u64(42);
        let set = TemplateSet::advanced();
        let ds = set.synthesize(200, &mut rng);

        assert_eq!(ds.len(), 200 + set.challenging.len());
        assert!(ds.labels().iter().all(|&l| l == 0 || l == 1));
        assert!(ds.examples.iter().all(|e| !e.text.contains('{')));
        // first half expenses, second half incomes
        assert!(ds.examples[..100].iter().all(|e| e.kind == TransactionKind::Expense));
        assert!(ds.examples[100..200].iter().all(|e| e.kind == TransactionKind::Income));
    }

    #[test]
    fn test_synthesize_is_deterministic_per_seed() {
        let set = TemplateSet::comprehensive();
        let a = set.synthesize(50, &mut StdRng::seed_from_u64(7));
        let b = set.synthesize(50, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.examples, b.examples);
    }
}
