//! Domain types shared by the index, lexical and hybrid crates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Position of a chunk inside its corpus snapshot.
pub type ChunkId = usize;

/// A category label from the closed set configured at build time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// The closed set of categories a snapshot may use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    labels: BTreeSet<Category>,
}

impl CategorySet {
    pub fn new<I, C>(labels: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        Self { labels: labels.into_iter().map(Into::into).collect() }
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.labels.contains(category)
    }

    /// Reject a chunk whose category is outside the set.
    pub fn check(&self, chunk_id: ChunkId, category: &Category) -> Result<()> {
        if self.contains(category) {
            Ok(())
        } else {
            Err(Error::UnknownCategory { chunk_id, category: category.to_string() })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-chunk metadata as supplied alongside the chunk texts.
///
/// Serialized with the `source_file` key used by the flat snapshot files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub category: Category,
    #[serde(rename = "source_file", alias = "source_id")]
    pub source_id: String,
}

impl ChunkMeta {
    pub fn new(category: impl Into<Category>, source_id: impl Into<String>) -> Self {
        Self { category: category.into(), source_id: source_id.into() }
    }
}

/// An immutable unit of retrievable text.
///
/// - `id`: position in the snapshot, stable for the snapshot's lifetime
/// - `text`: the passage content, shared with results without copying
/// - `title`: first non-empty line of `text`, used for lexical matching
/// - `category`/`source_id`: provenance handed to downstream consumers
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: Arc<str>,
    pub title: String,
    pub category: Category,
    pub source_id: String,
}

impl Chunk {
    pub fn new(id: ChunkId, text: impl Into<Arc<str>>, meta: ChunkMeta) -> Self {
        let text: Arc<str> = text.into();
        let title = title_of(&text).to_string();
        Self { id, text, title, category: meta.category, source_id: meta.source_id }
    }
}

/// First non-empty line of a passage, trimmed.
pub fn title_of(text: &str) -> &str {
    text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

/// Ranking order shared by every stage: higher score first, ties broken by
/// lower chunk id so repeated queries return identical lists.
pub fn rank_order(a: (f32, ChunkId), b: (f32, ChunkId)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}

/// Languages the pipeline distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Arabic,
    English,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::English => "en",
        }
    }
}

/// How the caller wants the search scoped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeRequest {
    /// Classify the query and restrict to the detected category when confident.
    #[default]
    Auto,
    Global,
    Category(Category),
}

/// The scope a search actually ran over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Global,
    Category(Category),
}

/// Whether the external reranker contributed to the final ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RerankStatus {
    /// No rerank stage was requested or no reranker is configured.
    Skipped,
    Reranked,
    /// The reranker failed or timed out; ranking fell back to fused scores.
    Unreranked { reason: String },
}

/// Degradation flags attached to every result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStatus {
    pub scope: SearchScope,
    /// Classifier output, absent when no category won outright.
    pub category_hint: Option<Category>,
    /// Two or more categories tied for the top classifier score.
    pub ambiguous_category: bool,
    /// The scope held fewer vectors than requested.
    pub scope_exhausted: bool,
    pub rerank: RerankStatus,
}

impl SearchStatus {
    pub fn global() -> Self {
        Self {
            scope: SearchScope::Global,
            category_hint: None,
            ambiguous_category: false,
            scope_exhausted: false,
            rerank: RerankStatus::Skipped,
        }
    }

    pub fn is_reranked(&self) -> bool {
        self.rerank == RerankStatus::Reranked
    }

    pub fn is_unreranked(&self) -> bool {
        matches!(self.rerank, RerankStatus::Unreranked { .. })
    }
}

/// One ranked passage. Transient, owned by the call that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// 1-based.
    pub rank: usize,
    pub chunk_id: ChunkId,
    pub semantic_score: f32,
    pub title_score: f32,
    pub keyword_score: f32,
    pub fused_score: f32,
    pub rerank_score: Option<f32>,
    pub category: Category,
    pub source_id: String,
    pub text: Arc<str>,
}

impl SearchResult {
    /// Score the final ordering was decided by.
    pub fn ranking_score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.fused_score)
    }
}

/// Rank-ordered results plus the status flags describing how they were produced.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResults {
    pub results: Vec<SearchResult>,
    pub status: SearchStatus,
}

impl RankedResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn top(&self) -> Option<&SearchResult> {
        self.results.first()
    }

    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        self.results.iter().map(|r| r.chunk_id).collect()
    }
}
