//! Narrow interfaces to the external collaborators.
//!
//! Collaborator failures are opaque to the core, so these return
//! `anyhow::Result` and the callers decide how to degrade.

use crate::types::{Category, Language, SearchResult};

/// Text embedding model. Vectors need not be normalized; the index does that.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Pairwise (query, passage) relevance scorer such as a cross-encoder.
///
/// Scores are only comparable within one call; higher is more relevant.
/// Must return exactly one score per passage. Calls run on the blocking pool
/// and are not cancelled when the caller times out, so implementations
/// should bound their own latency.
pub trait Reranker: Send + Sync {
    fn model_id(&self) -> &str;
    fn score_pairs(&self, query: &str, passages: &[String]) -> anyhow::Result<Vec<f32>>;
}

/// Machine translation service.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: Language, target: Language) -> anyhow::Result<String>;
}

/// Bounded key/value cache owned by whoever injects it.
pub trait KeyValueCache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn insert(&self, key: K, value: V);
    fn capacity(&self) -> u64;
}

/// Everything the answer generator receives for one question.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRequest<'a> {
    pub query: &'a str,
    pub language: Language,
    /// Rank-ordered passages with category/source provenance.
    pub passages: &'a [SearchResult],
    pub category_hint: Option<&'a Category>,
}

/// Composes a natural-language answer from retrieved passages.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, request: &AnswerRequest<'_>) -> anyhow::Result<String>;
}
