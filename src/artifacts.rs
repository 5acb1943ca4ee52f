// 📦 Artifacts - Files handed to the mobile app
// Vocabulary JSON, config JSON, model placeholders and the build manifest

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Minimal TFLite header the app treats as "model present"
pub const TFLITE_HEADER: &[u8] = b"TFL3\x00\x00\x00\x00";

/// Header plus marker text, written by the forest builder
pub const TFLITE_PLACEHOLDER: &[u8] = b"TFL3\x00\x00\x00\x00MINIMAL_MODEL_PLACEHOLDER";

// ============================================================================
// VOCABULARY
// ============================================================================

/// Ordered token → id mapping. Order is the order tokens were added and is
/// kept in the written JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    entries: Vec<(String, u32)>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary::default()
    }

    pub fn from_entries<S: Into<String>>(entries: impl IntoIterator<Item = (S, u32)>) -> Self {
        let mut vocab = Vocabulary::new();
        for (token, id) in entries {
            vocab.insert(token, id);
        }
        vocab
    }

    /// Add or replace a token; a replaced token keeps its position
    pub fn insert(&mut self, token: impl Into<String>, id: u32) {
        let token = token.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = id,
            None => self.entries.push((token, id)),
        }
    }

    pub fn get(&self, token: &str) -> Option<u32> {
        self.entries.iter().find(|(t, _)| t == token).map(|(_, id)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(t, id)| (t.as_str(), *id))
    }

    pub fn tokens(&self) -> Vec<&str> {
        self.entries.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(t, id)| (t.clone(), serde_json::Value::from(*id)))
            .collect();
        serde_json::Value::Object(map)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary: {:?}", path))?;
        Vocabulary::parse(&content).with_context(|| format!("Invalid vocabulary: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).context("Vocabulary is not valid JSON")?;
        let Some(map) = value.as_object() else {
            bail!("Vocabulary must be a JSON object of token → id");
        };

        let mut vocab = Vocabulary::new();
        for (token, id) in map {
            let Some(id) = id.as_u64().and_then(|v| u32::try_from(v).ok()) else {
                bail!("Token {:?} has a non-integer id: {}", token, id);
            };
            vocab.entries.push((token.clone(), id));
        }
        Ok(vocab)
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// Writes artifacts and remembers what it wrote
#[derive(Debug, Default)]
pub struct ArtifactWriter {
    written: Vec<PathBuf>,
}

impl ArtifactWriter {
    pub fn new() -> Self {
        ArtifactWriter::default()
    }

    fn prepare(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }
        Ok(())
    }

    pub fn write_bytes<P: AsRef<Path>>(&mut self, path: P, bytes: &[u8]) -> Result<PathBuf> {
        let path = path.as_ref();
        Self::prepare(path)?;
        fs::write(path, bytes).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        self.written.push(path.to_path_buf());
        Ok(path.to_path_buf())
    }

    pub fn write_text<P: AsRef<Path>>(&mut self, path: P, text: &str) -> Result<PathBuf> {
        self.write_bytes(path, text.as_bytes())
    }

    /// Pretty JSON, two-space indent, fields in declaration order
    pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(
        &mut self,
        path: P,
        value: &T,
    ) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {:?}", path.as_ref()))?;
        self.write_text(path, &json)
    }

    pub fn write_vocabulary<P: AsRef<Path>>(&mut self, path: P, vocab: &Vocabulary) -> Result<PathBuf> {
        self.write_json(path, &vocab.to_json())
    }

    /// Files written so far, in write order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Record a file produced elsewhere
    pub fn record<P: AsRef<Path>>(&mut self, path: P) {
        self.written.push(path.as_ref().to_path_buf());
    }

    /// Let a model write itself through its own `save`, then record the file
    pub fn save_with<P, F>(&mut self, path: P, save: F) -> Result<PathBuf>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<()>,
    {
        let path = path.as_ref();
        Self::prepare(path)?;
        save(path)?;
        self.record(path);
        Ok(path.to_path_buf())
    }
}

// ============================================================================
// BUILD MANIFEST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

/// What one pipeline run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    pub run_id: String,
    pub pipeline: String,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<ManifestEntry>,
}

pub fn sha256_file<P: AsRef<Path>>(path: P) -> Result<(u64, String)> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok((bytes.len() as u64, format!("{:x}", hasher.finalize())))
}

impl BuildManifest {
    /// Hash every file the writer produced (later writes of a path win)
    pub fn from_writer(pipeline: &str, writer: &ArtifactWriter) -> Result<Self> {
        let mut paths: Vec<&PathBuf> = Vec::new();
        for path in writer.written() {
            if let Some(pos) = paths.iter().position(|p| *p == path) {
                paths.remove(pos);
            }
            paths.push(path);
        }

        let files = paths
            .into_iter()
            .map(|path| {
                let (bytes, sha256) = sha256_file(path)?;
                Ok(ManifestEntry {
                    path: path.display().to_string(),
                    bytes,
                    sha256,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BuildManifest {
            run_id: uuid::Uuid::new_v4().to_string(),
            pipeline: pipeline.to_string(),
            generated_at: Utc::now(),
            files,
        })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        ArtifactWriter::prepare(path)?;
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, json).with_context(|| format!("Failed to write manifest: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_vocabulary_keeps_insertion_order() {
        let vocab = Vocabulary::from_entries([("<PAD>", 0), ("<UNK>", 1), ("<CLS>", 101), ("paid", 4)]);
        let json = serde_json::to_string(&vocab.to_json()).unwrap();
        assert_eq!(json, r#"{"<PAD>":0,"<UNK>":1,"<CLS>":101,"paid":4}"#);
        assert_eq!(vocab.get("<CLS>"), Some(101));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut vocab = Vocabulary::from_entries([("a", 0), ("b", 1)]);
        vocab.insert("a", 7);
        assert_eq!(vocab.tokens(), vec!["a", "b"]);
        assert_eq!(vocab.get("a"), Some(7));
    }

    #[test]
    fn test_vocabulary_write_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets").join("vocab.json");
        let vocab = Vocabulary::from_entries([("<PAD>", 0), ("₹", 44)]);

        let mut writer = ArtifactWriter::new();
        writer.write_vocabulary(&path, &vocab).unwrap();
        assert_eq!(Vocabulary::read(&path).unwrap(), vocab);
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        assert!(Vocabulary::parse(r#"{"a": "x"}"#).is_err());
        assert!(Vocabulary::parse(r#"{"a": -1}"#).is_err());
        assert!(Vocabulary::parse("[1, 2]").is_err());
    }

    #[test]
    fn test_manifest_hashes_written_files() {
        let dir = TempDir::new().unwrap();
        let mut writer = ArtifactWriter::new();
        let model = dir.path().join("model.tflite");
        writer.write_bytes(&model, TFLITE_HEADER).unwrap();
        writer.write_text(dir.path().join("a.txt"), "abc").unwrap();
        writer.write_bytes(&model, TFLITE_PLACEHOLDER).unwrap();

        let manifest = BuildManifest::from_writer("test", &writer).unwrap();
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.files[1].bytes, TFLITE_PLACEHOLDER.len() as u64);
        assert_eq!(
            manifest.files[0].sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_save_with_creates_parent_and_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("work").join("model.json");
        let mut writer = ArtifactWriter::new();

        writer
            .save_with(&path, |p| fs::write(p, "{}").map_err(Into::into))
            .unwrap();
        assert_eq!(writer.written(), &[path.clone()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }
}
