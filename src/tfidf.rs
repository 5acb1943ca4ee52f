//! TF-IDF vectorizer over word unigrams and bigrams.
//!
//! Tokenization keeps runs of two or more word characters, lowercased. The
//! vocabulary is capped at `max_features` by corpus term frequency and then
//! indexed alphabetically. IDF is smoothed as `ln((1 + n) / (1 + df)) + 1`
//! and every output row is L2-normalised.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    max_features: usize,
    ngram_range: (usize, usize),
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn new(max_features: usize, ngram_range: (usize, usize)) -> Self {
        TfIdfVectorizer {
            max_features,
            ngram_range,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    /// Lowercased tokens of at least two word characters
    pub fn tokenize(text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        lower
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
            .map(str::to_string)
            .collect()
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let tokens = Self::tokenize(text);
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();

        for n in min_n.max(1)..=max_n {
            if tokens.len() < n {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }

        terms
    }

    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        if documents.is_empty() {
            bail!("Cannot fit TF-IDF on an empty corpus");
        }

        let mut term_frequency: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = self.terms(doc.as_ref());
            let unique: HashSet<&String> = terms.iter().collect();
            for term in unique {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            for term in terms {
                *term_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if term_frequency.is_empty() {
            bail!("TF-IDF corpus contains no tokens");
        }

        // Keep the most frequent terms, ties alphabetical
        let mut ranked: Vec<(String, usize)> = term_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let mut kept: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        kept.sort();

        let n = documents.len() as f64;
        self.idf = kept
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = kept.into_iter().enumerate().map(|(i, t)| (t, i)).collect();

        Ok(())
    }

    pub fn transform(&self, document: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];

        for term in self.terms(document) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                row[idx] += 1.0;
            }
        }
        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }

        row
    }

    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> Vec<Vec<f64>> {
        documents.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<Vec<f64>>> {
        self.fit(documents)?;
        Ok(self.transform_all(documents))
    }

    /// Term → column index, alphabetical
    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.vocabulary.keys().cloned().collect()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}
