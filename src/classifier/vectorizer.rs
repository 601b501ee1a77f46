//! TF-IDF text vectorization
//!
//! Sparse, L2-normalized term vectors over a vocabulary fitted on training
//! text. Shared by every model kind.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Default vocabulary cap.
pub const MAX_FEATURES: usize = 5000;

/// Words too common in commands to separate intents.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "to", "for", "of", "and", "or", "my", "me", "please", "can", "could", "would",
    "you", "it", "is", "be", "we", "our", "your", "this", "that", "with", "i", "am",
];

/// (feature index, weight), sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Lowercased word tokens of two or more characters, minus stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Dot product of two normalized sparse vectors.
///
/// Walks both index-sorted vectors in step, so it is linear in their
/// combined length.
pub fn cosine(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// Dot product of a sparse vector with a dense row.
pub fn dot_dense(x: &[(usize, f64)], row: &[f64]) -> f64 {
    x.iter()
        .map(|&(index, weight)| weight * row.get(index).copied().unwrap_or(0.0))
        .sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: AHashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit vocabulary and smoothed IDF weights on `documents`.
    ///
    /// When there are more distinct terms than `max_features`, the most
    /// frequent terms (by total count) are kept.
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: usize) -> Self {
        let mut doc_freq: AHashMap<String, usize> = AHashMap::new();
        let mut term_count: AHashMap<String, usize> = AHashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let unique: AHashSet<&String> = tokens.iter().collect();
            for token in unique {
                *doc_freq.entry(token.clone()).or_default() += 1;
            }
            for token in tokens {
                *term_count.entry(token).or_default() += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = term_count.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(max_features);
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let n = documents.len() as f64;
        let mut vocabulary = AHashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (index, (term, _)) in terms.into_iter().enumerate() {
            let df = doc_freq.get(&term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Every vocabulary index must have an IDF weight.
    pub fn check(&self) -> Result<(), String> {
        match self.vocabulary.iter().find(|(_, &index)| index >= self.idf.len()) {
            Some((term, index)) => Err(format!(
                "term `{term}` has index {index} but only {} idf weights",
                self.idf.len()
            )),
            None => Ok(()),
        }
    }

    /// TF-IDF vector of `text`; empty when no token is in the vocabulary.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: AHashMap<usize, f64> = AHashMap::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .filter_map(|(index, tf)| self.idf.get(index).map(|idf| (index, tf * idf)))
            .collect();
        vector.sort_by_key(|&(index, _)| index);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut vector {
                *w /= norm;
            }
        }
        vector
    }
}
