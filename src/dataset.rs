// 📊 Dataset - Labeled transaction sentences
// Examples, splits and folds shared by every builder

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// TRANSACTION KIND
// ============================================================================

/// Binary label of a sentence: money going out (0) or coming in (1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    /// Numeric label used by the classifiers
    pub fn label(&self) -> u8 {
        match self {
            TransactionKind::Expense => 0,
            TransactionKind::Income => 1,
        }
    }

    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(TransactionKind::Expense),
            1 => Some(TransactionKind::Income),
            _ => None,
        }
    }

    /// Wire name understood by the mobile app
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "EXPENSE",
            TransactionKind::Income => "INCOME",
        }
    }

    /// Kind from a probability of income (>= 0.5 is income)
    pub fn from_probability(p_income: f64) -> Self {
        if p_income >= 0.5 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EXAMPLE + DATASET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    pub kind: TransactionKind,
}

impl Example {
    pub fn new(text: impl Into<String>, kind: TransactionKind) -> Self {
        Example {
            text: text.into(),
            kind,
        }
    }

    pub fn expense(text: impl Into<String>) -> Self {
        Example::new(text, TransactionKind::Expense)
    }

    pub fn income(text: impl Into<String>) -> Self {
        Example::new(text, TransactionKind::Income)
    }
}

/// In-memory list of examples for one build run
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub examples: Vec<Example>,
}

/// CSV row layout for dataset export
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    text: String,
    label: u8,
}

impl Dataset {
    pub fn new(examples: Vec<Example>) -> Self {
        Dataset { examples }
    }

    /// Build from parallel expense / income text lists (expenses first)
    pub fn from_lists(expenses: &[&str], incomes: &[&str]) -> Self {
        let mut examples = Vec::with_capacity(expenses.len() + incomes.len());
        examples.extend(expenses.iter().map(|t| Example::expense(*t)));
        examples.extend(incomes.iter().map(|t| Example::income(*t)));
        Dataset { examples }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn push(&mut self, example: Example) {
        self.examples.push(example);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Example>) {
        self.examples.extend(other);
    }

    pub fn texts(&self) -> Vec<String> {
        self.examples.iter().map(|e| e.text.clone()).collect()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.examples.iter().map(|e| e.kind.label()).collect()
    }

    pub fn count(&self, kind: TransactionKind) -> usize {
        self.examples.iter().filter(|e| e.kind == kind).count()
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.examples.shuffle(rng);
    }

    /// Subset by index, cloning the selected examples
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            examples: indices.iter().map(|&i| self.examples[i].clone()).collect(),
        }
    }

    /// Export as `text,label` CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open CSV for writing: {:?}", path))?;

        for example in &self.examples {
            writer.serialize(CsvRow {
                text: example.text.clone(),
                label: example.kind.label(),
            })?;
        }
        writer.flush().context("Failed to flush CSV writer")?;

        Ok(())
    }

    /// Load a dataset previously written with [`Dataset::write_csv`]
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open CSV: {:?}", path))?;

        let mut examples = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.with_context(|| format!("Malformed CSV row {}", line + 2))?;
            let kind = TransactionKind::from_label(row.label).with_context(|| {
                format!("Invalid label {} on CSV row {}", row.label, line + 2)
            })?;
            examples.push(Example::new(row.text, kind));
        }

        Ok(Dataset { examples })
    }
}

// ============================================================================
// SPLITS
// ============================================================================

/// Result of a train/test split (indices into the source dataset)
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle and split indices 0..labels.len() into train/test.
///
/// With `stratify`, each class contributes `ceil(n_class * test_fraction)`
/// examples to the test side so both sides keep the class balance.
pub fn train_test_split<R: Rng>(
    labels: &[u8],
    test_fraction: f64,
    rng: &mut R,
    stratify: bool,
) -> Split {
    let mut train = Vec::new();
    let mut test = Vec::new();

    if stratify {
        for class in [0u8, 1u8] {
            let mut indices: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == class)
                .map(|(i, _)| i)
                .collect();
            indices.shuffle(rng);
            let n_test = test_count(indices.len(), test_fraction);
            test.extend_from_slice(&indices[..n_test]);
            train.extend_from_slice(&indices[n_test..]);
        }
        train.shuffle(rng);
        test.shuffle(rng);
    } else {
        let mut indices: Vec<usize> = (0..labels.len()).collect();
        indices.shuffle(rng);
        let n_test = test_count(indices.len(), test_fraction);
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    Split { train, test }
}

fn test_count(n: usize, fraction: f64) -> usize {
    let n_test = (n as f64 * fraction).ceil() as usize;
    n_test.min(n)
}

/// Stratified k-fold without shuffling.
///
/// Each class's indices are cut into `k` contiguous chunks; fold `i` tests on
/// chunk `i` of every class. Returns (train, test) index pairs.
pub fn stratified_k_fold(labels: &[u8], k: usize) -> Vec<Split> {
    let k = k.max(2);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];

    for class in [0u8, 1u8] {
        let indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();

        let n = indices.len();
        let base = n / k;
        let extra = n % k;
        let mut start = 0;
        for (fold, bucket) in folds.iter_mut().enumerate() {
            let size = base + usize::from(fold < extra);
            bucket.extend_from_slice(&indices[start..start + size]);
            start += size;
        }
    }

    (0..k)
        .map(|fold| {
            let mut test = folds[fold].clone();
            test.sort_unstable();
            let mut train: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();
            train.sort_unstable();
            Split { train, test }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_kind_labels() {
        assert_eq!(TransactionKind::Expense.label(), 0);
        assert_eq!(TransactionKind::Income.label(), 1);
        assert_eq!(TransactionKind::from_label(1), Some(TransactionKind::Income));
        assert_eq!(TransactionKind::from_label(2), None);
        assert_eq!(TransactionKind::Income.to_string(), "INCOME");
    }

    #[test]
    fn test_from_lists_orders_expenses_first() {
        let ds = Dataset::from_lists(&["paid 5"], &["got 10", "salary 20"]);
        assert_eq!(ds.labels(), vec![0, 1, 1]);
        assert_eq!(ds.count(TransactionKind::Income), 2);
    }

    #[test]
    fn test_stratified_split_keeps_balance() {
        let labels: Vec<u8> = (0..100).map(|i| (i % 2) as u8).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let split = train_test_split(&labels, 0.2, &mut rng, true);

        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let income_in_test = split.test.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(income_in_test, 10);

        let all: HashSet<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        assert_eq!(all.len(), 100);
    }

    #[test]
    fn test_plain_split_rounds_test_up() {
        let labels = vec![0u8; 20];
        let mut rng = StdRng::seed_from_u64(1);
        let split = train_test_split(&labels, 0.25, &mut rng, false);
        assert_eq!(split.test.len(), 5);

        let split = train_test_split(&vec![0u8; 7], 0.2, &mut rng, false);
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_k_fold_covers_every_index_once() {
        let labels: Vec<u8> = (0..23).map(|i| u8::from(i < 9)).collect();
        let folds = stratified_k_fold(&labels, 5);
        assert_eq!(folds.len(), 5);

        let mut seen = vec![0usize; labels.len()];
        for fold in &folds {
            for &i in &fold.test {
                seen[i] += 1;
            }
            assert_eq!(fold.train.len() + fold.test.len(), labels.len());
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dataset.csv");
        let ds = Dataset::from_lists(&["Paid $50, for groceries"], &["Received \"bonus\" $500"]);

        ds.write_csv(&path).unwrap();
        let loaded = Dataset::read_csv(&path).unwrap();

        assert_eq!(loaded.examples, ds.examples);
    }
}
