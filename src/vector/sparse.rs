//! BM25-style sparse encoder.
//!
//! Qdrant's sparse vectors take explicit (index, weight) pairs. Documents
//! are encoded with BM25 term-frequency weighting; the IDF factor is
//! applied server-side through the collection's `Modifier::Idf`, so query
//! terms carry unit weight. Token indices come from a deterministic 32-bit
//! hash of the lowercased token.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;
/// Average document length assumed for the length normalization term.
const AVG_DOC_LEN: f32 = 256.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 1)
        .map(String::from)
        .collect()
}

fn token_index(token: &str) -> u32 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    // Fold the 64-bit hash into the u32 index space Qdrant expects.
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}

/// Encode a document: BM25 tf weighting with length normalization.
pub fn encode_document(text: &str) -> SparseVector {
    let tokens = tokenize(text);
    let doc_len = tokens.len() as f32;

    let mut frequencies: HashMap<u32, f32> = HashMap::new();
    for token in &tokens {
        *frequencies.entry(token_index(token)).or_default() += 1.0;
    }

    let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / AVG_DOC_LEN);
    let mut pairs: Vec<(u32, f32)> = frequencies
        .into_iter()
        .map(|(index, tf)| (index, tf * (BM25_K1 + 1.0) / (tf + norm)))
        .collect();
    pairs.sort_unstable_by_key(|(index, _)| *index);

    let (indices, values) = pairs.into_iter().unzip();
    SparseVector { indices, values }
}

/// Encode a query: one unit-weight entry per unique token.
pub fn encode_query(text: &str) -> SparseVector {
    let mut indices: Vec<u32> = tokenize(text).iter().map(|t| token_index(t)).collect();
    indices.sort_unstable();
    indices.dedup();

    let values = vec![1.0; indices.len()];
    SparseVector { indices, values }
}
