//! Typed retrieval settings extracted from [`crate::config::Config`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Language, ScopeRequest};

/// Weights of the three fused signals.
///
/// `fused = semantic * s + title * t + keyword * k`. All weights must be
/// non-negative so the fused score never decreases when a signal grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub semantic: f32,
    pub title: f32,
    pub keyword: f32,
}

impl FusionWeights {
    /// Semantic-led split with an additive keyword term.
    pub const DEFAULT: Self = Self { semantic: 0.50, title: 0.20, keyword: 0.30 };
    /// For corpora where one document per service makes the title decisive.
    pub const TITLE_FOCUSED: Self = Self { semantic: 0.40, title: 0.50, keyword: 0.10 };
    pub const BLENDED: Self = Self { semantic: 0.35, title: 0.40, keyword: 0.25 };

    pub fn new(semantic: f32, title: f32, keyword: f32) -> Result<Self> {
        let weights = Self { semantic, title, keyword };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.semantic, self.title, self.keyword];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidConfig(format!("fusion weights must be finite and non-negative: {self:?}")));
        }
        if all.iter().sum::<f32>() > 1.0 + 1e-4 {
            return Err(Error::InvalidConfig(format!("fusion weights sum above 1.0: {self:?}")));
        }
        Ok(())
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPreset {
    #[default]
    Default,
    TitleFocused,
    Blended,
}

impl FusionPreset {
    pub fn weights(self) -> FusionWeights {
        match self {
            Self::Default => FusionWeights::DEFAULT,
            Self::TitleFocused => FusionWeights::TITLE_FOCUSED,
            Self::Blended => FusionWeights::BLENDED,
        }
    }
}

/// Either a preset name (`fusion = "blended"`) or an explicit weight table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FusionConfig {
    Preset(FusionPreset),
    Weights(FusionWeights),
}

impl FusionConfig {
    pub fn weights(&self) -> FusionWeights {
        match self {
            Self::Preset(p) => p.weights(),
            Self::Weights(w) => *w,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::Preset(FusionPreset::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Directory holding `chunks.json`, `metadata.json` and `embeddings.json`.
    pub snapshot_dir: String,
    /// Curated keyword/synonym tables (TOML).
    pub tables_path: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { snapshot_dir: "data/snapshot".to_string(), tables_path: "config/tables.toml".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Shortlist size handed to the reranker.
    pub initial_k: usize,
    /// Results returned to the caller.
    pub final_k: usize,
    pub rerank_timeout_ms: u64,
    pub fusion: FusionConfig,
    /// Keyword score forced onto a directly named document.
    pub direct_match_boost: f32,
    pub expand_queries: bool,
    pub scope: ScopeRequest,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            initial_k: 20,
            final_k: 5,
            rerank_timeout_ms: 2_000,
            fusion: FusionConfig::default(),
            direct_match_boost: 10.0,
            expand_queries: true,
            scope: ScopeRequest::Auto,
        }
    }
}

impl RetrievalSettings {
    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_millis(self.rerank_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub enabled: bool,
    pub cache_capacity: u64,
    /// Language the corpus is written in; other queries are translated into it.
    pub corpus_language: Language,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self { enabled: true, cache_capacity: 1024, corpus_language: Language::Arabic }
    }
}

/// Parameters of the built-in hashing embedder used when no model is wired in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dim: usize,
    /// Tokens considered per text; the rest is ignored.
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { dim: 384, max_len: 256 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub retrieval: RetrievalSettings,
    pub translation: TranslationSettings,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.final_k == 0 {
            return Err(Error::InvalidConfig("retrieval.final_k must be at least 1".into()));
        }
        if r.initial_k < r.final_k {
            return Err(Error::InvalidConfig(format!(
                "retrieval.initial_k ({}) must not be smaller than final_k ({})",
                r.initial_k, r.final_k
            )));
        }
        if r.rerank_timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval.rerank_timeout_ms must be positive".into()));
        }
        if !r.direct_match_boost.is_finite() || r.direct_match_boost <= 0.0 {
            return Err(Error::InvalidConfig("retrieval.direct_match_boost must be positive".into()));
        }
        r.fusion.weights().validate()?;
        if self.translation.cache_capacity == 0 {
            return Err(Error::InvalidConfig("translation.cache_capacity must be positive".into()));
        }
        if self.embedding.dim == 0 || self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.dim and embedding.max_len must be positive".into()));
        }
        Ok(())
    }
}
