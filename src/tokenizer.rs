// 🔤 Tokenizers - Word → id mappings for the sequence networks
//
// WordTokenizer: punctuation-filtering, frequency-ranked index with an OOV id
// SimpleVocabulary: whitespace split, <PAD>/<UNK> reserved, capped size

use std::collections::HashMap;

const FILTERED: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

pub const PAD_ID: u32 = 0;

/// Sort words by descending count, first occurrence breaking ties
fn rank_words(texts: &[Vec<String>]) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0usize;

    for words in texts {
        for word in words {
            let entry = counts.entry(word.as_str()).or_insert_with(|| {
                order += 1;
                (0, order)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().map(|(w, _)| w.to_string()).collect()
}

/// Pad or cut a sequence to `max_length` (post padding, post truncation)
pub fn pad_sequence(mut ids: Vec<u32>, max_length: usize) -> Vec<u32> {
    ids.truncate(max_length);
    ids.resize(max_length, PAD_ID);
    ids
}

// ============================================================================
// WORD TOKENIZER (mobile builder)
// ============================================================================

#[derive(Debug, Clone)]
pub struct WordTokenizer {
    num_words: usize,
    oov_token: String,
    /// word → index; OOV is 1, words start at 2
    word_index: HashMap<String, u32>,
    /// words in index order (excluding OOV)
    ranked: Vec<String>,
}

impl WordTokenizer {
    pub fn new(num_words: usize, oov_token: &str) -> Self {
        WordTokenizer {
            num_words,
            oov_token: oov_token.to_string(),
            word_index: HashMap::new(),
            ranked: Vec::new(),
        }
    }

    pub fn split(text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| if FILTERED.contains(c) { ' ' } else { c })
            .collect();
        cleaned.split_whitespace().map(str::to_string).collect()
    }

    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) {
        let split: Vec<Vec<String>> = texts.iter().map(|t| Self::split(t.as_ref())).collect();
        self.ranked = rank_words(&split);

        self.word_index.clear();
        self.word_index.insert(self.oov_token.clone(), 1);
        for (i, word) in self.ranked.iter().enumerate() {
            self.word_index.insert(word.clone(), i as u32 + 2);
        }
    }

    pub fn oov_id(&self) -> u32 {
        1
    }

    /// Ids at or beyond `num_words` collapse to the OOV id
    pub fn encode(&self, text: &str) -> Vec<u32> {
        Self::split(text)
            .iter()
            .map(|w| match self.word_index.get(w) {
                Some(&id) if (id as usize) < self.num_words => id,
                _ => self.oov_id(),
            })
            .collect()
    }

    pub fn texts_to_padded<S: AsRef<str>>(&self, texts: &[S], max_length: usize) -> Vec<Vec<u32>> {
        texts
            .iter()
            .map(|t| pad_sequence(self.encode(t.as_ref()), max_length))
            .collect()
    }

    /// Distinct words seen during fit
    pub fn word_count(&self) -> usize {
        self.ranked.len()
    }

    /// Vocabulary as consumed on device: `<PAD>`, OOV, then every usable word
    pub fn export_entries(&self, pad_token: &str) -> Vec<(String, u32)> {
        let mut entries = vec![(pad_token.to_string(), PAD_ID), (self.oov_token.clone(), 1)];
        entries.extend(
            self.ranked
                .iter()
                .enumerate()
                .map(|(i, w)| (w.clone(), i as u32 + 2))
                .take_while(|(_, id)| (*id as usize) < self.num_words),
        );
        entries
    }
}

// ============================================================================
// SIMPLE VOCABULARY (embedding builder)
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimpleVocabulary {
    words: Vec<String>,
    index: HashMap<String, u32>,
}

impl SimpleVocabulary {
    pub const UNK_ID: u32 = 1;

    pub fn build<S: AsRef<str>>(texts: &[S], vocab_size: usize) -> Self {
        let split: Vec<Vec<String>> = texts
            .iter()
            .map(|t| {
                t.as_ref()
                    .to_lowercase()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .collect();

        let mut words = vec!["<PAD>".to_string(), "<UNK>".to_string()];
        words.extend(rank_words(&split).into_iter().take(vocab_size.saturating_sub(2)));

        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();

        SimpleVocabulary { words, index }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn encode(&self, text: &str, max_length: usize) -> Vec<u32> {
        let ids = text
            .to_lowercase()
            .split_whitespace()
            .take(max_length)
            .map(|w| self.index.get(w).copied().unwrap_or(Self::UNK_ID))
            .collect();
        pad_sequence(ids, max_length)
    }

    pub fn entries(&self) -> Vec<(String, u32)> {
        self.words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_filters_punctuation() {
        assert_eq!(
            WordTokenizer::split("Paid $50, for lunch!"),
            vec!["paid", "50", "for", "lunch"]
        );
    }

    #[test]
    fn test_word_index_ranks_by_frequency() {
        let mut tok = WordTokenizer::new(100, "<OOV>");
        tok.fit(&["paid rent", "paid bill", "salary"]);
        // paid=2 (most frequent), rent=3, bill=4, salary=5
        assert_eq!(tok.encode("paid rent salary"), vec![2, 3, 5]);
        assert_eq!(tok.encode("unknown"), vec![1]);
        assert_eq!(tok.word_count(), 4);
    }

    #[test]
    fn test_num_words_caps_ids() {
        let mut tok = WordTokenizer::new(4, "<OOV>");
        tok.fit(&["a a a b b c"]);
        // a=2, b=3, c=4 → c is out of range
        assert_eq!(tok.encode("a b c"), vec![2, 3, 1]);
        let entries = tok.export_entries("<PAD>");
        let names: Vec<&str> = entries.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(names, vec!["<PAD>", "<OOV>", "a", "b"]);
    }

    #[test]
    fn test_padding_and_truncation() {
        assert_eq!(pad_sequence(vec![5, 6], 4), vec![5, 6, 0, 0]);
        assert_eq!(pad_sequence(vec![1, 2, 3, 4, 5], 3), vec![1, 2, 3]);
    }

    #[test]
    fn test_simple_vocabulary_reserves_specials() {
        let vocab = SimpleVocabulary::build(&["got paid", "paid rent"], 1000);
        let entries = vocab.entries();
        assert_eq!(entries[0], ("<PAD>".to_string(), 0));
        assert_eq!(entries[1], ("<UNK>".to_string(), 1));
        assert_eq!(entries[2], ("paid".to_string(), 2));
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab.encode("paid tax", 4), vec![2, 1, 0, 0]);
    }

    #[test]
    fn test_simple_vocabulary_cap() {
        let vocab = SimpleVocabulary::build(&["a b c d e"], 4);
        assert_eq!(vocab.len(), 4);
    }
}
