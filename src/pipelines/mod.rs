// 🏭 Pipelines - One builder per artifact set
//
// Every pipeline writes into the configured folders, overwrites whatever a
// previous run left there, and finishes by writing the build manifest.

pub mod android;
pub mod forest;
pub mod manual;
pub mod mobile;
pub mod simple;
pub mod smart;

use crate::artifacts::{ArtifactWriter, BuildManifest};
use crate::config::BuildConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Sentences every builder reports predictions (or expectations) for
pub const TEST_SENTENCES: [&str; 7] = [
    "I got myself a tshirt that cost 3000",
    "Received salary $5000 from work",
    "Paid electricity bill $75",
    "Got payment from client $1000",
    "Spent $25 on movie tickets",
    "Freelance income 2000",
    "Bought groceries for $45",
];

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub pipeline: String,
    /// Files written, in write order
    pub files: Vec<PathBuf>,
    /// Measured numbers (accuracy, cv_mean, ...) by name
    pub metrics: BTreeMap<String, f64>,
    pub manifest: PathBuf,
}

impl PipelineReport {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Write the manifest for everything `writer` produced
pub(crate) fn finish(
    pipeline: &str,
    config: &BuildConfig,
    writer: ArtifactWriter,
    metrics: BTreeMap<String, f64>,
) -> Result<PipelineReport> {
    let manifest = BuildManifest::from_writer(pipeline, &writer)?;
    let manifest_path = config.manifest_path();
    manifest.write(&manifest_path)?;

    tracing::info!(
        pipeline,
        run_id = %manifest.run_id,
        files = manifest.files.len(),
        "build manifest written"
    );

    Ok(PipelineReport {
        pipeline: pipeline.to_string(),
        files: writer.written().to_vec(),
        metrics,
        manifest: manifest_path,
    })
}

pub(crate) fn banner(title: &str, width: usize) {
    println!("{}", title);
    println!("{}", "=".repeat(width));
}

pub(crate) fn print_files(files: &[(&str, &str)]) {
    println!("📁 Files created:");
    for (name, what) in files {
        println!("   - {} ({})", name, what);
    }
}

/// Size in bytes of an artifact that was just written
pub(crate) fn file_size(path: &Path) -> Result<u64> {
    let meta = std::fs::metadata(path).with_context(|| format!("Failed to stat {:?}", path))?;
    Ok(meta.len())
}

/// Today's date as written into configs
pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

// ============================================================================
// PIPELINE SELECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Simple,
    Manual,
    Forest,
    Mobile,
    Smart,
    Android,
}

impl Pipeline {
    pub const ALL: [Pipeline; 6] = [
        Pipeline::Simple,
        Pipeline::Manual,
        Pipeline::Forest,
        Pipeline::Mobile,
        Pipeline::Smart,
        Pipeline::Android,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pipeline::Simple => "simple",
            Pipeline::Manual => "manual",
            Pipeline::Forest => "forest",
            Pipeline::Mobile => "mobile",
            Pipeline::Smart => "smart",
            Pipeline::Android => "android",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match Pipeline::ALL.iter().find(|p| p.name() == name) {
            Some(p) => Ok(*p),
            None => bail!("Unknown pipeline: {}", name),
        }
    }

    /// Trains a neural network (slow on the full sample counts)
    pub fn is_network(&self) -> bool {
        matches!(self, Pipeline::Mobile | Pipeline::Smart)
    }

    pub fn run(&self, config: &BuildConfig) -> Result<PipelineReport> {
        let _span = tracing::info_span!("pipeline", name = self.name()).entered();
        match self {
            Pipeline::Simple => simple::run(config),
            Pipeline::Manual => manual::run(config),
            Pipeline::Forest => forest::run(config),
            Pipeline::Mobile => mobile::run(config),
            Pipeline::Smart => smart::run(config),
            Pipeline::Android => android::run(config),
        }
    }

    /// Order used by `all`: android needs the forest model
    pub fn sequence(with_networks: bool) -> Vec<Pipeline> {
        let mut order = vec![Pipeline::Simple, Pipeline::Manual, Pipeline::Forest];
        if with_networks {
            order.push(Pipeline::Mobile);
            order.push(Pipeline::Smart);
        }
        order.push(Pipeline::Android);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_names_round_trip() {
        for p in Pipeline::ALL {
            assert_eq!(Pipeline::from_name(p.name()).unwrap(), p);
        }
        assert!(Pipeline::from_name("tflite").is_err());
    }

    #[test]
    fn test_file_size_reports_missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("weights.json");
        assert!(file_size(&path).is_err());

        std::fs::write(&path, b"12345").unwrap();
        assert_eq!(file_size(&path).unwrap(), 5);
    }

    #[test]
    fn test_sequence_puts_android_last() {
        let quick = Pipeline::sequence(false);
        assert_eq!(quick.len(), 4);
        assert_eq!(quick.last(), Some(&Pipeline::Android));
        assert!(!quick.iter().any(Pipeline::is_network));

        let full = Pipeline::sequence(true);
        assert_eq!(full.len(), 6);
        assert_eq!(full.last(), Some(&Pipeline::Android));
    }
}
