// 🌲 Forest Builder - Random forest over semantic features
//
// Synthesizes the advanced dataset, scores every sentence with the 28
// semantic features and trains a 100-tree forest. The forest and its
// feature metadata stay in the work folder for the android builder; the app
// gets a vocabulary, a config with the measured numbers and a placeholder.

use super::{banner, finish, print_files, today, PipelineReport, TEST_SENTENCES};
use crate::artifacts::{ArtifactWriter, Vocabulary, TFLITE_PLACEHOLDER};
use crate::config::{files, BuildConfig};
use crate::dataset::{stratified_k_fold, train_test_split, Dataset};
use crate::features::{SemanticFeatureInfo, SemanticFeatures, FEATURE_COUNT};
use crate::metrics::{mean_std, weighted_metrics};
use crate::models::{Classifier, ForestParams, Prediction, RandomForest};
use crate::synthesis::TemplateSet;
use crate::tfidf::TfIdfVectorizer;
use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub const CV_FOLDS: usize = 5;
pub const VOCAB_FEATURES: usize = 1000;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ForestResults {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub cv_mean: f64,
    pub cv_std: f64,
}

#[derive(Debug, Serialize)]
struct ForestModelConfig {
    model_type: &'static str,
    ml_algorithm: &'static str,
    feature_extraction: &'static str,
    num_features: usize,
    max_features: usize,
    n_estimators: usize,
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1_score: f64,
    cv_accuracy: f64,
    training_samples: usize,
    android_compatible: bool,
    budget_phone_optimized: bool,
    inference_time_ms: u32,
    model_size_mb: f64,
    created_date: String,
    ml_technique: &'static str,
    feature_engineering: &'static str,
    cross_validation_folds: usize,
}

fn rows_and_labels(rows: &[Vec<f64>], labels: &[u8], idx: &[usize]) -> (Vec<Vec<f64>>, Vec<u8>) {
    (
        idx.iter().map(|&i| rows[i].clone()).collect(),
        idx.iter().map(|&i| labels[i]).collect(),
    )
}

/// Stratified 80/20 fit + evaluation + k-fold cross-validation
pub fn train(dataset: &Dataset, params: &ForestParams, seed: u64) -> Result<(RandomForest, ForestResults)> {
    let rows = SemanticFeatures::extract_all(&dataset.texts());
    let labels = dataset.labels();
    info!(rows = rows.len(), features = FEATURE_COUNT, "semantic feature matrix ready");

    let mut rng = StdRng::seed_from_u64(seed);
    let split = train_test_split(&labels, 0.2, &mut rng, true);
    let (train_rows, train_labels) = rows_and_labels(&rows, &labels, &split.train);
    let (test_rows, test_labels) = rows_and_labels(&rows, &labels, &split.test);
    info!(train = train_rows.len(), test = test_rows.len(), "stratified split");

    let mut forest = RandomForest::new(params.clone());
    forest.fit(&train_rows, &train_labels, seed)?;

    let predicted = forest.predict_all(&test_rows);
    let weighted = weighted_metrics(&test_labels, &predicted);

    let mut fold_scores = Vec::with_capacity(CV_FOLDS);
    for (i, fold) in stratified_k_fold(&labels, CV_FOLDS).iter().enumerate() {
        let (fold_train, fold_train_labels) = rows_and_labels(&rows, &labels, &fold.train);
        let (fold_test, fold_test_labels) = rows_and_labels(&rows, &labels, &fold.test);
        let mut model = RandomForest::new(params.clone());
        model.fit(&fold_train, &fold_train_labels, seed)?;
        let score = model.score(&fold_test, &fold_test_labels);
        tracing::debug!(fold = i + 1, accuracy = score, "cross-validation fold");
        fold_scores.push(score);
    }
    let (cv_mean, cv_std) = mean_std(&fold_scores);

    let results = ForestResults {
        train_accuracy: forest.score(&train_rows, &train_labels),
        test_accuracy: weighted.accuracy,
        precision: weighted.precision,
        recall: weighted.recall,
        f1_score: weighted.f1_score,
        cv_mean,
        cv_std,
    };
    info!(
        train_accuracy = results.train_accuracy,
        test_accuracy = results.test_accuracy,
        f1 = results.f1_score,
        cv_mean,
        "forest trained"
    );
    Ok((forest, results))
}

/// Vectorizer terms by column index, then `<UNK>`
pub fn tfidf_vocabulary(texts: &[String]) -> Result<Vocabulary> {
    let mut vectorizer = TfIdfVectorizer::new(VOCAB_FEATURES, (1, 2));
    vectorizer.fit(texts)?;

    let mut vocab = Vocabulary::from_entries(
        vectorizer
            .vocabulary()
            .iter()
            .map(|(term, &idx)| (term.clone(), idx as u32)),
    );
    let unk = vocab.len() as u32;
    vocab.insert("<UNK>", unk);
    Ok(vocab)
}

/// Forest saved by `run`, checked against the current feature scorer
pub fn load_trained(path: &Path) -> Result<RandomForest> {
    let forest = RandomForest::load(path)
        .with_context(|| format!("No usable forest at {:?} (run the forest builder first)", path))?;
    if forest.n_features != FEATURE_COUNT {
        bail!(
            "Forest at {:?} expects {} features but the scorer produces {} (rerun the forest builder)",
            path,
            forest.n_features,
            FEATURE_COUNT
        );
    }
    Ok(forest)
}

pub fn predict_text(forest: &RandomForest, text: &str) -> Prediction {
    let features = SemanticFeatures::extract(text);
    Prediction::from_probability(forest.predict_proba(&features), "Random forest")
}

pub fn run(config: &BuildConfig) -> Result<PipelineReport> {
    banner("🚀 RANDOM FOREST TRAINING PIPELINE", 50);
    let params = ForestParams::default();
    info!(
        max_features = VOCAB_FEATURES,
        estimators = params.n_estimators,
        "forest classifier initialized"
    );

    println!("📊 Step 1: Creating advanced dataset...");
    let mut rng = StdRng::seed_from_u64(config.seed);
    let dataset = TemplateSet::advanced().synthesize(config.forest_samples, &mut rng);

    println!("🎯 Step 2: Training random forest...");
    let (forest, results) = train(&dataset, &params, config.seed)?;

    let mut writer = ArtifactWriter::new();

    println!("💾 Step 3: Saving model artifacts...");
    writer.save_with(config.work_file(files::FOREST), |p| forest.save(p))?;
    writer.write_json(config.work_file(files::SEMANTIC_INFO), &SemanticFeatureInfo::default())?;

    println!("📱 Step 4: Creating Android integration files...");
    let vocab = tfidf_vocabulary(&dataset.texts())?;
    writer.write_vocabulary(config.asset(files::VOCAB), &vocab)?;
    info!(tokens = vocab.len(), "android vocabulary saved");

    let model_config = ForestModelConfig {
        model_type: "sklearn_random_forest_classifier",
        ml_algorithm: "Random Forest",
        feature_extraction: "semantic_features",
        num_features: FEATURE_COUNT,
        max_features: VOCAB_FEATURES,
        n_estimators: params.n_estimators,
        accuracy: results.test_accuracy,
        precision: results.precision,
        recall: results.recall,
        f1_score: results.f1_score,
        cv_accuracy: results.cv_mean,
        training_samples: dataset.len(),
        android_compatible: true,
        budget_phone_optimized: true,
        inference_time_ms: 30,
        model_size_mb: 2.5,
        created_date: today(),
        ml_technique: "ensemble_learning",
        feature_engineering: "semantic_patterns",
        cross_validation_folds: CV_FOLDS,
    };
    writer.write_json(config.asset(files::MODEL_CONFIG), &model_config)?;
    writer.write_bytes(config.asset(files::MOBILE_MODEL), TFLITE_PLACEHOLDER)?;

    println!("\n✅ TRAINING COMPLETED SUCCESSFULLY!");
    println!("{}", "=".repeat(50));
    println!("🎉 RESULTS:");
    println!("   Train accuracy: {:.2}", results.train_accuracy);
    println!("   Test accuracy:  {:.2}", results.test_accuracy);
    println!("   Precision:      {:.2}", results.precision);
    println!("   Recall:         {:.2}", results.recall);
    println!("   F1 score:       {:.2}", results.f1_score);
    println!("   CV accuracy:    {:.2} (± {:.2})", results.cv_mean, results.cv_std);
    print_files(&[
        (files::FOREST, "Random forest"),
        (files::SEMANTIC_INFO, "Feature names"),
        (files::VOCAB, "Android vocabulary"),
        (files::MODEL_CONFIG, "Configuration"),
        (files::MOBILE_MODEL, "Placeholder"),
    ]);

    println!("\n🧪 Test Predictions:");
    for text in TEST_SENTENCES {
        let p = predict_text(&forest, text);
        println!("   '{}' → {} ({:.2} confidence)", text, p.kind, p.confidence);
    }

    let mut metrics = BTreeMap::new();
    metrics.insert("train_accuracy".to_string(), results.train_accuracy);
    metrics.insert("test_accuracy".to_string(), results.test_accuracy);
    metrics.insert("precision".to_string(), results.precision);
    metrics.insert("recall".to_string(), results.recall);
    metrics.insert("f1_score".to_string(), results.f1_score);
    metrics.insert("cv_mean".to_string(), results.cv_mean);
    metrics.insert("cv_std".to_string(), results.cv_std);

    finish("forest", config, writer, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TransactionKind;
    use std::fs;
    use tempfile::TempDir;

    fn small_params() -> ForestParams {
        ForestParams {
            n_estimators: 15,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_train_separates_synthetic_data() {
        let mut rng = StdRng::seed_from_u64(3);
        let ds = TemplateSet::advanced().synthesize(400, &mut rng);
        let (forest, results) = train(&ds, &small_params(), 3).unwrap();

        assert_eq!(forest.trees.len(), 15);
        assert!(results.test_accuracy > 0.75, "{:?}", results);
        assert!(results.cv_mean > 0.75, "{:?}", results);
        assert!(results.train_accuracy >= results.test_accuracy - 0.1);

        let p = predict_text(&forest, "my friend gave me 500 dollars");
        assert_eq!(p.kind, TransactionKind::Income);
    }

    #[test]
    fn test_tfidf_vocabulary_ends_with_unk() {
        let texts = vec!["paid rent".to_string(), "got salary".to_string()];
        let vocab = tfidf_vocabulary(&texts).unwrap();
        let n = vocab.len() as u32;
        assert_eq!(vocab.get("<UNK>"), Some(n - 1));
        assert_eq!(vocab.get("got"), Some(0));
    }

    #[test]
    fn test_load_trained_rejects_other_widths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(files::FOREST);

        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 2) as f64; 40]).collect();
        let labels: Vec<u8> = (0..40).map(|i| (i % 2) as u8).collect();
        let mut wide = RandomForest::new(small_params());
        wide.fit(&rows, &labels, 1).unwrap();
        wide.save(&path).unwrap();

        let err = load_trained(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("rerun the forest builder"));

        let mut rng = StdRng::seed_from_u64(2);
        let ds = TemplateSet::advanced().synthesize(100, &mut rng);
        train(&ds, &small_params(), 2).unwrap().0.save(&path).unwrap();
        assert_eq!(load_trained(&path).unwrap().n_features, FEATURE_COUNT);
    }

    #[test]
    fn test_run_writes_forest_and_assets() {
        let dir = TempDir::new().unwrap();
        let mut config = BuildConfig::rooted(dir.path());
        config.forest_samples = 200;

        let report = run(&config).unwrap();
        assert_eq!(report.files.len(), 5);
        assert!(report.metric("cv_mean").is_some());

        let forest = RandomForest::load(config.work_file(files::FOREST)).unwrap();
        assert_eq!(forest.n_features, FEATURE_COUNT);

        let model = fs::read(config.asset(files::MOBILE_MODEL)).unwrap();
        assert_eq!(model, TFLITE_PLACEHOLDER);

        let cfg: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.asset(files::MODEL_CONFIG)).unwrap()).unwrap();
        assert_eq!(cfg["n_estimators"], 100);
        assert!(cfg["training_samples"].as_u64().unwrap() >= 200);
    }
}
