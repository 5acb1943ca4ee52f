// ✅ Artifact Quality - Checks on what a build left behind
//
// Validates an assets directory (vocabulary, config, model file) and labeled
// datasets. Each rule yields a ValidationResult; failures also become
// QualityIssues with a recommendation.

use crate::artifacts::Vocabulary;
use crate::config::files;
use crate::dataset::{Dataset, TransactionKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const VOCAB_FILE: &str = files::VOCAB;
const CONFIG_FILE: &str = files::MODEL_CONFIG;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // artifact unusable by the app
    Warning,  // usable but suspicious
    Info,     // worth a look
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub artifact: String,
    pub message: String,
    pub confidence: f64,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, artifact: &str, message: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            artifact: artifact.to_string(),
            message: message.to_string(),
            confidence: 1.0,
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, artifact: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            artifact: artifact.to_string(),
            message: message.to_string(),
            confidence: if severity == Severity::Critical { 0.0 } else { 0.5 },
            severity,
        }
    }
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub artifact: String,
    pub issue: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub target: String,
    pub overall_quality: f64,
    pub overall_confidence: f64,
    pub validations: Vec<ValidationResult>,
    pub issues: Vec<QualityIssue>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub needs_review: bool,
}

impl QualityReport {
    pub fn summary(&self) -> String {
        format!(
            "Quality: {:.1}%, Confidence: {:.1}%, Issues: {} ({} critical)",
            self.overall_quality * 100.0,
            self.overall_confidence * 100.0,
            self.issues.len(),
            self.issues
                .iter()
                .filter(|i| i.severity == Severity::Critical)
                .count()
        )
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }
}

/// Collects results and issues while a target is checked
struct Checklist {
    validations: Vec<ValidationResult>,
    issues: Vec<QualityIssue>,
}

impl Checklist {
    fn new() -> Self {
        Checklist {
            validations: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn record(&mut self, result: ValidationResult, recommendation: &str) {
        if !result.passed {
            self.issues.push(QualityIssue {
                severity: result.severity.clone(),
                artifact: result.artifact.clone(),
                issue: result.message.clone(),
                recommendation: recommendation.to_string(),
            });
        }
        self.validations.push(result);
    }

    fn finish(self, target: String, review_threshold: f64) -> QualityReport {
        let total = self.validations.len().max(1) as f64;
        let passed_count = self.validations.iter().filter(|v| v.passed).count();
        let failed_count = self.validations.len() - passed_count;
        let overall_confidence = self.validations.iter().map(|v| v.confidence).sum::<f64>() / total;

        QualityReport {
            target,
            overall_quality: passed_count as f64 / total,
            overall_confidence,
            validations: self.validations,
            issues: self.issues,
            passed_count,
            failed_count,
            needs_review: overall_confidence < review_threshold,
        }
    }
}

// ============================================================================
// QUALITY ENGINE
// ============================================================================

pub struct QualityEngine {
    /// Minimum share of the smaller class before a dataset is flagged
    min_class_share: f64,

    /// Average confidence below this marks the report for review
    review_threshold: f64,
}

impl QualityEngine {
    pub fn new() -> Self {
        QualityEngine {
            min_class_share: 0.3,
            review_threshold: 0.7,
        }
    }

    /// Check vocabulary, model config and every `.tflite` file in `dir`
    pub fn validate_assets<P: AsRef<Path>>(&self, dir: P) -> QualityReport {
        let dir = dir.as_ref();
        let mut checks = Checklist::new();

        match Vocabulary::read(dir.join(VOCAB_FILE)) {
            Ok(vocab) => self.check_vocabulary(&vocab, &mut checks),
            Err(e) => checks.record(
                ValidationResult::fail(
                    "vocab_readable",
                    VOCAB_FILE,
                    &format!("{:#}", e),
                    Severity::Critical,
                ),
                "Rebuild the assets with any pipeline",
            ),
        }

        self.check_config(&dir.join(CONFIG_FILE), &mut checks);
        self.check_models(dir, &mut checks);

        checks.finish(dir.display().to_string(), self.review_threshold)
    }

    /// Check a labeled dataset (e.g. one exported as CSV)
    pub fn validate_dataset(&self, name: &str, dataset: &Dataset) -> QualityReport {
        let mut checks = Checklist::new();

        if dataset.is_empty() {
            checks.record(
                ValidationResult::fail("dataset_not_empty", name, "Dataset is empty", Severity::Critical),
                "Synthesize or export a non-empty dataset",
            );
            return checks.finish(name.to_string(), self.review_threshold);
        }
        checks.record(
            ValidationResult::pass("dataset_not_empty", name, &format!("{} examples", dataset.len())),
            "",
        );

        let blank = dataset.examples.iter().filter(|e| e.text.trim().is_empty()).count();
        checks.record(
            if blank == 0 {
                ValidationResult::pass("text_present", name, "Every example has text")
            } else {
                ValidationResult::fail(
                    "text_present",
                    name,
                    &format!("{} examples have empty text", blank),
                    Severity::Warning,
                )
            },
            "Drop examples without text",
        );

        let income = dataset.count(TransactionKind::Income);
        let expense = dataset.count(TransactionKind::Expense);
        if income == 0 || expense == 0 {
            checks.record(
                ValidationResult::fail(
                    "both_classes",
                    name,
                    &format!("Only one class present ({} expense, {} income)", expense, income),
                    Severity::Critical,
                ),
                "Add examples of the missing class",
            );
        } else {
            checks.record(ValidationResult::pass("both_classes", name, "Both classes present"), "");

            let share = income.min(expense) as f64 / dataset.len() as f64;
            checks.record(
                if share >= self.min_class_share {
                    ValidationResult::pass(
                        "class_balance",
                        name,
                        &format!("{} expense / {} income", expense, income),
                    )
                } else {
                    ValidationResult::fail(
                        "class_balance",
                        name,
                        &format!("Smaller class is only {:.1}% of the data", share * 100.0),
                        Severity::Info,
                    )
                },
                "Rebalance the classes",
            );
        }

        checks.finish(name.to_string(), self.review_threshold)
    }

    // ========================================================================
    // ASSET RULES
    // ========================================================================

    fn check_vocabulary(&self, vocab: &Vocabulary, checks: &mut Checklist) {
        checks.record(
            if vocab.is_empty() {
                ValidationResult::fail("vocab_not_empty", VOCAB_FILE, "Vocabulary is empty", Severity::Critical)
            } else {
                ValidationResult::pass("vocab_not_empty", VOCAB_FILE, &format!("{} tokens", vocab.len()))
            },
            "Rebuild the vocabulary",
        );

        // the forest vocabulary is feature-indexed and has no padding token
        if vocab.get("<PAD>").is_some() {
            checks.record(
                if vocab.get("<PAD>") == Some(0) {
                    ValidationResult::pass("pad_is_zero", VOCAB_FILE, "<PAD> maps to 0")
                } else {
                    ValidationResult::fail("pad_is_zero", VOCAB_FILE, "<PAD> does not map to 0", Severity::Critical)
                },
                "Padding must use id 0",
            );
        }

        let has_unknown = vocab.get("<UNK>").is_some() || vocab.get("<OOV>").is_some();
        checks.record(
            if has_unknown {
                ValidationResult::pass("unknown_token", VOCAB_FILE, "Unknown-word token present")
            } else {
                ValidationResult::fail("unknown_token", VOCAB_FILE, "No <UNK>/<OOV> token", Severity::Warning)
            },
            "Add an unknown-word token",
        );

        let mut seen = HashSet::new();
        let duplicates: Vec<u32> = vocab.iter().map(|(_, id)| id).filter(|id| !seen.insert(*id)).collect();
        checks.record(
            if duplicates.is_empty() {
                ValidationResult::pass("ids_unique", VOCAB_FILE, "Token ids are unique")
            } else {
                ValidationResult::fail(
                    "ids_unique",
                    VOCAB_FILE,
                    &format!("Duplicate ids: {:?}", duplicates),
                    Severity::Warning,
                )
            },
            "Give every token its own id",
        );
    }

    fn check_config(&self, path: &Path, checks: &mut Checklist) {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).map_err(|e| e.to_string()));

        let value = match parsed {
            Ok(v) if v.is_object() => v,
            Ok(_) => {
                checks.record(
                    ValidationResult::fail("config_object", CONFIG_FILE, "Config is not a JSON object", Severity::Critical),
                    "Write the config as a JSON object",
                );
                return;
            }
            Err(e) => {
                checks.record(
                    ValidationResult::fail("config_readable", CONFIG_FILE, &e, Severity::Critical),
                    "Rebuild the assets with any pipeline",
                );
                return;
            }
        };

        checks.record(ValidationResult::pass("config_object", CONFIG_FILE, "Config parses"), "");
        checks.record(
            match value.get("model_type").and_then(|v| v.as_str()) {
                Some(kind) => ValidationResult::pass("model_type", CONFIG_FILE, &format!("model_type: {}", kind)),
                None => ValidationResult::fail("model_type", CONFIG_FILE, "model_type missing", Severity::Warning),
            },
            "Record which builder produced the config",
        );
    }

    fn check_models(&self, dir: &Path, checks: &mut Checklist) {
        let mut models: Vec<_> = fs::read_dir(dir)
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.extension().map_or(false, |e| e == "tflite"))
            .collect();
        models.sort();

        if models.is_empty() {
            checks.record(
                ValidationResult::fail("model_present", "*.tflite", "No model file found", Severity::Critical),
                "Run a pipeline to write the model file",
            );
            return;
        }

        for model in models {
            let name = model
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let header_ok = fs::read(&model).map_or(false, |bytes| bytes.starts_with(b"TFL3"));
            checks.record(
                if header_ok {
                    ValidationResult::pass("model_header", &name, "TFL3 header present")
                } else {
                    ValidationResult::fail("model_header", &name, "Missing TFL3 header", Severity::Critical)
                },
                "Regenerate the model file",
            );
        }
    }
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactWriter, TFLITE_HEADER};
    use crate::keywords::basic_vocabulary;
    use tempfile::TempDir;

    fn write_assets(dir: &Path) {
        let mut writer = ArtifactWriter::new();
        writer.write_vocabulary(dir.join(VOCAB_FILE), &basic_vocabulary()).unwrap();
        writer
            .write_json(dir.join(CONFIG_FILE), &serde_json::json!({"model_type": "simple_transaction_classifier"}))
            .unwrap();
        writer.write_bytes(dir.join("model.tflite"), TFLITE_HEADER).unwrap();
    }

    #[test]
    fn test_clean_assets_pass() {
        let dir = TempDir::new().unwrap();
        write_assets(dir.path());

        let report = QualityEngine::new().validate_assets(dir.path());
        assert_eq!(report.failed_count, 0, "{:?}", report.issues);
        assert_eq!(report.overall_quality, 1.0);
        assert!(!report.needs_review);
    }

    #[test]
    fn test_missing_assets_are_critical() {
        let dir = TempDir::new().unwrap();
        let report = QualityEngine::new().validate_assets(dir.path());
        assert!(report.has_critical_issues());
        assert_eq!(report.passed_count, 0);
        assert!(report.needs_review);
    }

    #[test]
    fn test_bad_header_and_pad() {
        let dir = TempDir::new().unwrap();
        write_assets(dir.path());
        fs::write(dir.path().join("model.tflite"), b"NOPE").unwrap();
        fs::write(dir.path().join(VOCAB_FILE), r#"{"<PAD>": 3, "a": 3}"#).unwrap();

        let report = QualityEngine::new().validate_assets(dir.path());
        let failed: Vec<&str> = report
            .validations
            .iter()
            .filter(|v| !v.passed)
            .map(|v| v.rule_name.as_str())
            .collect();
        assert_eq!(failed, vec!["pad_is_zero", "unknown_token", "ids_unique", "model_header"]);
    }

    #[test]
    fn test_dataset_checks() {
        let engine = QualityEngine::new();

        let balanced = Dataset::from_lists(&["paid 5", "rent 9"], &["salary 10", "bonus 3"]);
        assert_eq!(engine.validate_dataset("ds", &balanced).failed_count, 0);

        let skewed = Dataset::from_lists(&["a", "b", "c", "d", "e"], &["f"]);
        let report = engine.validate_dataset("ds", &skewed);
        assert_eq!(report.failed_count, 1);
        assert!(!report.has_critical_issues());

        let one_class = Dataset::from_lists(&["a"], &[]);
        assert!(engine.validate_dataset("ds", &one_class).has_critical_issues());
        assert!(engine.validate_dataset("ds", &Dataset::default()).has_critical_issues());
    }
}
