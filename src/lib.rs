// SmartFinance Model Builder - Core Library
// Datasets, features, models and the artifact builders used by the CLI and tests

pub mod dataset;    // Examples, labels, splits, CSV export
pub mod synthesis;  // Hand-written lists + template synthesis
pub mod features;   // 28 semantic pattern features
pub mod tfidf;      // TF-IDF vectorizer (1-2 grams)
pub mod tokenizer;  // Word tokenizers for the networks
pub mod keywords;   // Keyword tables + vocabularies
pub mod metrics;    // Accuracy / precision / recall / F1
pub mod models;     // Logistic regression, forest, networks, rules
pub mod lookup;     // Precomputed lookup table for app code
pub mod codegen;    // Java / Kotlin emitters
pub mod amount;     // Amount + currency extraction
pub mod categories; // Title suggestion
pub mod artifacts;  // Vocabulary, writer, manifest
pub mod quality;    // Checks on built assets and datasets
pub mod config;     // Output folders + sample counts
pub mod pipelines;  // One builder per artifact set

// Re-export commonly used types
pub use dataset::{
    Dataset, Example, Split, TransactionKind,
    train_test_split, stratified_k_fold,
};
pub use synthesis::{TemplateSet, basic_examples, contextual_examples};
pub use features::{SemanticFeatures, SemanticFeatureInfo, FEATURE_COUNT, FEATURE_NAMES};
pub use tfidf::TfIdfVectorizer;
pub use tokenizer::{SimpleVocabulary, WordTokenizer};
pub use keywords::{KeywordEngine, KeywordRule, basic_vocabulary, enhanced_vocabulary};
pub use metrics::{BinaryMetrics, ConfusionMatrix};
pub use models::{
    Classifier, Prediction,
    LogisticRegression, RandomForest, ForestParams,
    SequenceNetwork, NetworkConfig, TrainingOptions,
    SemanticRuleClassifier,
};
pub use lookup::{LookupClassifier, LookupEntry, LookupTable};
pub use amount::{Currency, ExtractedAmount, extract_amount};
pub use categories::{Category, CategoryRegistry};
pub use artifacts::{ArtifactWriter, BuildManifest, Vocabulary, TFLITE_HEADER, TFLITE_PLACEHOLDER};
pub use quality::{QualityEngine, QualityIssue, QualityReport, Severity, ValidationResult};
pub use config::BuildConfig;
pub use pipelines::{Pipeline, PipelineReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
