// 🧠 Smart Builder - Averaged embeddings over 50 contextual examples

use super::{banner, file_size, finish, PipelineReport, TEST_SENTENCES};
use crate::artifacts::{ArtifactWriter, Vocabulary, TFLITE_HEADER};
use crate::config::{files, BuildConfig};
use crate::dataset::Dataset;
use crate::models::network::{DenseSpec, Evaluation};
use crate::models::{Encoder, NetworkConfig, Prediction, SequenceNetwork, TrainingHistory, TrainingOptions};
use crate::synthesis::contextual_examples;
use crate::tokenizer::SimpleVocabulary;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const VOCAB_SIZE: usize = 1000;
pub const MAX_LENGTH: usize = 20;
pub const EMBEDDING_DIM: usize = 64;

pub fn network_config(vocab_size: usize) -> NetworkConfig {
    NetworkConfig {
        vocab_size,
        max_length: MAX_LENGTH,
        embedding_dim: EMBEDDING_DIM,
        encoder: Encoder::AveragePooling,
        hidden: vec![
            DenseSpec { units: 32, dropout: 0.2 },
            DenseSpec { units: 16, dropout: 0.0 },
        ],
    }
}

pub fn training_options(seed: u64) -> TrainingOptions {
    TrainingOptions {
        epochs: 30,
        batch_size: 8,
        learning_rate: 0.001,
        validation_split: 0.2,
        early_stopping_patience: None,
        seed,
    }
}

pub struct TrainedSmart {
    pub vocabulary: SimpleVocabulary,
    pub network: SequenceNetwork,
    pub history: TrainingHistory,
    /// Scored on the whole training set
    pub evaluation: Evaluation,
}

impl TrainedSmart {
    pub fn predict(&self, text: &str) -> Prediction {
        let ids = self.vocabulary.encode(text, MAX_LENGTH);
        Prediction::from_probability(self.network.predict_proba(&ids), "Smart embeddings")
    }
}

/// Shuffles first: the hand list is ordered by class and validation rows come from the tail
pub fn train(dataset: &Dataset, options: &TrainingOptions) -> Result<TrainedSmart> {
    let mut shuffled = dataset.clone();
    shuffled.shuffle(&mut StdRng::seed_from_u64(options.seed));

    let texts = shuffled.texts();
    let labels = shuffled.labels();
    let vocabulary = SimpleVocabulary::build(&texts, VOCAB_SIZE);
    let sequences: Vec<Vec<u32>> = texts.iter().map(|t| vocabulary.encode(t, MAX_LENGTH)).collect();
    info!(examples = texts.len(), vocab = vocabulary.len(), "tokenized");

    let mut network = SequenceNetwork::new(network_config(vocabulary.len()), options.seed)?;
    let history = network.fit(&sequences, &labels, options)?;
    let evaluation = network.evaluate(&sequences, &labels);
    info!(
        loss = evaluation.loss,
        accuracy = evaluation.metrics.accuracy,
        "smart model trained"
    );

    Ok(TrainedSmart {
        vocabulary,
        network,
        history,
        evaluation,
    })
}

#[derive(Debug, Serialize)]
struct SmartModelConfig {
    model_type: &'static str,
    vocab_size: usize,
    max_length: usize,
    embedding_size: usize,
    classes: [&'static str; 2],
    accuracy: f64,
    weights_file: &'static str,
}

pub fn run(config: &BuildConfig) -> Result<PipelineReport> {
    banner("🧠 SmartFinance Intelligent Model Creator", 50);

    println!("📝 Creating comprehensive training data...");
    let dataset = contextual_examples();
    println!("✅ Created {} training examples", dataset.len());

    println!("🎯 Training smart model...");
    let trained = train(&dataset, &training_options(config.seed))?;
    println!("📊 Accuracy: {:.2}", trained.evaluation.metrics.accuracy);

    let mut writer = ArtifactWriter::new();
    let network = &trained.network;

    let weights = writer.save_with(config.asset(files::SMART_WEIGHTS), |p| network.save(p))?;
    println!("💾 Model saved: {}", weights.display());
    writer.write_bytes(config.asset(files::SMART_MODEL), TFLITE_HEADER)?;

    let vocab = Vocabulary::from_entries(trained.vocabulary.entries());
    let vocab_path = writer.write_vocabulary(config.asset(files::VOCAB), &vocab)?;
    println!("📚 Vocabulary saved: {}", vocab_path.display());

    let model_config = SmartModelConfig {
        model_type: "smart_embeddings",
        vocab_size: vocab.len(),
        max_length: MAX_LENGTH,
        embedding_size: EMBEDDING_DIM,
        classes: ["expense", "income"],
        accuracy: trained.evaluation.metrics.accuracy,
        weights_file: files::SMART_WEIGHTS,
    };
    let config_path = writer.write_json(config.asset(files::MODEL_CONFIG), &model_config)?;
    println!("⚙️ Config saved: {}", config_path.display());

    let size = file_size(&weights)?;
    println!("\n🎉 Smart model creation complete!");
    println!("📏 Model size: {} bytes ({:.1} MB)", size, size as f64 / 1024.0 / 1024.0);
    println!("🔢 Parameters: {}", network.parameter_count());

    println!("\n🧪 Test Results:");
    for text in &TEST_SENTENCES[..5] {
        let p = trained.predict(text);
        println!("   '{}' → {} ({:.2} confidence)", text, p.kind, p.confidence);
    }

    let mut metrics = BTreeMap::new();
    metrics.insert("accuracy".to_string(), trained.evaluation.metrics.accuracy);
    metrics.insert("loss".to_string(), trained.evaluation.loss);

    finish("smart", config, writer, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_learns_contextual_examples() {
        let trained = train(&contextual_examples(), &training_options(42)).unwrap();
        assert_eq!(trained.history.epochs.len(), 30);
        assert!(trained.evaluation.metrics.accuracy >= 0.7, "{:?}", trained.evaluation);
    }

    #[test]
    fn test_predictions_use_the_vocabulary() {
        let trained = train(&contextual_examples(), &training_options(42)).unwrap();
        let p_income = |text: &str| trained.network.predict_proba(&trained.vocabulary.encode(text, MAX_LENGTH));
        // "received" and "salary" only appear in income examples, "bill" only in expenses
        assert!(p_income("received salary payment") > p_income("paid electricity bill"));
    }

    #[test]
    fn test_run_writes_smart_assets() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig::rooted(dir.path());

        let report = run(&config).unwrap();
        assert_eq!(report.files.len(), 4);

        let vocab = Vocabulary::read(config.asset(files::VOCAB)).unwrap();
        assert_eq!(vocab.get("<PAD>"), Some(0));
        assert_eq!(vocab.get("<UNK>"), Some(1));

        let cfg: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.asset(files::MODEL_CONFIG)).unwrap()).unwrap();
        assert_eq!(cfg["model_type"], "smart_embeddings");
        assert_eq!(cfg["vocab_size"].as_u64().unwrap() as usize, vocab.len());
        assert_eq!(cfg["classes"][1], "income");

        let network = SequenceNetwork::load(config.asset(files::SMART_WEIGHTS)).unwrap();
        assert_eq!(network.config.vocab_size, vocab.len());
    }
}
