// ⚙️ Build Configuration - Where artifacts go and how much data to make

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ASSETS_DIR: &str = "app/src/main/assets";
pub const DEFAULT_JAVA_DIR: &str = "app/src/main/java/com/aminafi/smartfinance/ai";

/// File names the app and the pipelines agree on
pub mod files {
    pub const VOCAB: &str = "vocab.json";
    pub const MODEL_CONFIG: &str = "model_config.json";
    pub const MOBILE_MODEL: &str = "mobilebert_transaction_classifier.tflite";
    pub const SMART_MODEL: &str = "transaction_model.tflite";
    pub const SMART_WEIGHTS: &str = "transaction_model.json";
    pub const TRAINING_METADATA: &str = "training_metadata.json";
    pub const FOREST: &str = "rf_model.json";
    pub const SEMANTIC_INFO: &str = "semantic_features.json";
    pub const MOBILE_WEIGHTS: &str = "mobile_classifier_weights.json";
    pub const MOBILE_CHECKPOINT: &str = "best_mobile_model.json";
    pub const MANIFEST: &str = "build_manifest.json";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// App asset folder (vocab, config, model)
    pub assets_dir: PathBuf,

    /// Package folder for generated Java/Kotlin
    pub java_dir: PathBuf,

    /// Intermediate models and the build manifest
    pub work_dir: PathBuf,

    pub seed: u64,
    pub forest_samples: usize,
    pub mobile_samples: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            java_dir: PathBuf::from(DEFAULT_JAVA_DIR),
            work_dir: PathBuf::from("."),
            seed: 42,
            forest_samples: 25_000,
            mobile_samples: 20_000,
        }
    }
}

impl BuildConfig {
    /// Default folder layout under `root`, with the work folder at `root` itself
    pub fn rooted<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        BuildConfig {
            assets_dir: root.join(DEFAULT_ASSETS_DIR),
            java_dir: root.join(DEFAULT_JAVA_DIR),
            work_dir: root.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn asset(&self, name: &str) -> PathBuf {
        self.assets_dir.join(name)
    }

    pub fn work_file(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    pub fn java_file(&self, name: &str) -> PathBuf {
        self.java_dir.join(name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.work_file(files::MANIFEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_app_layout() {
        let config = BuildConfig::default();
        assert_eq!(config.asset(files::VOCAB), PathBuf::from("app/src/main/assets/vocab.json"));
        assert_eq!(config.manifest_path(), PathBuf::from("./build_manifest.json"));
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_rooted_keeps_sizes() {
        let config = BuildConfig::rooted("/tmp/build");
        assert_eq!(
            config.java_file("A.java"),
            PathBuf::from("/tmp/build/app/src/main/java/com/aminafi/smartfinance/ai/A.java")
        );
        assert_eq!(config.work_file(files::FOREST), PathBuf::from("/tmp/build/rf_model.json"));
        assert_eq!(config.forest_samples, 25_000);
    }
}
