//! Hybrid retrieval over an atomically swappable index state.
//!
//! Queries load the current [`IndexState`] once and work on that `Arc` to
//! the end, so a concurrent [`RetrievalEngine::swap`] or
//! [`RetrievalEngine::rebuild`] is never observed half way through.

use std::sync::Arc;

use anyhow::Context;
use arc_swap::ArcSwap;
use govqa_core::error::{Error, Result};
use govqa_core::settings::{FusionWeights, RetrievalSettings, TranslationSettings};
use govqa_core::tables::CuratedTables;
use govqa_core::traits::{Embedder, Reranker, Translator};
use govqa_core::types::{
    Category, ChunkMeta, Language, RankedResults, RerankStatus, ScopeRequest, SearchResult, SearchScope,
    SearchStatus,
};
use govqa_lexical::{detect_language, normalize, Classification};
use govqa_vector::{top_k, CorpusStats, IndexScope};
use tracing::{debug, info, warn};

use crate::cascade::{CascadeState, RerankCascade};
use crate::fusion::fuse;
use crate::state::IndexState;
use crate::translate::CachedTranslator;

/// A query after normalization, language detection, translation and expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    pub original: String,
    pub normalized: String,
    pub language: Language,
    /// Corpus-language rendering, when the query was translated.
    pub translated: Option<String>,
    /// Texts that get embedded; the first is the primary form.
    pub variants: Vec<String>,
}

impl PreparedQuery {
    /// The query in the corpus language.
    pub fn primary(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.normalized)
    }

    /// Every form lexical signals are computed over.
    pub fn lexical_forms(&self) -> Vec<String> {
        let mut forms = vec![self.normalized.clone()];
        forms.extend(self.translated.iter().cloned());
        forms
    }
}

pub struct RetrievalEngine {
    state: ArcSwap<IndexState>,
    embedder: Arc<dyn Embedder>,
    settings: RetrievalSettings,
    weights: FusionWeights,
    reranker: Option<Arc<dyn Reranker>>,
    translator: Option<CachedTranslator>,
    corpus_language: Language,
}

impl RetrievalEngine {
    pub fn new(state: IndexState, embedder: Arc<dyn Embedder>, settings: RetrievalSettings) -> Result<Self> {
        let weights = settings.fusion.weights();
        weights.validate()?;
        if settings.final_k == 0 || settings.initial_k < settings.final_k {
            return Err(Error::InvalidConfig(format!(
                "need 0 < final_k <= initial_k, got final_k={} initial_k={}",
                settings.final_k, settings.initial_k
            )));
        }
        if state.snapshot().dim() != 0 && state.snapshot().dim() != embedder.dim() {
            return Err(Error::SchemaMismatch(format!(
                "corpus embeddings have dimension {}, embedder produces {}",
                state.snapshot().dim(),
                embedder.dim()
            )));
        }
        info!(chunks = state.snapshot().len(), ?weights, "retrieval engine ready");
        Ok(Self {
            state: ArcSwap::from_pointee(state),
            embedder,
            settings,
            weights,
            reranker: None,
            translator: None,
            corpus_language: Language::Arabic,
        })
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Translate queries not written in `corpus_language` before retrieval.
    pub fn with_translator(mut self, translator: CachedTranslator, corpus_language: Language) -> Self {
        self.translator = Some(translator);
        self.corpus_language = corpus_language;
        self
    }

    /// [`Self::with_translator`] driven by configuration; a no-op when
    /// translation is disabled.
    pub fn with_translation(self, inner: Arc<dyn Translator>, settings: &TranslationSettings) -> Self {
        if !settings.enabled {
            debug!("query translation disabled");
            return self;
        }
        let translator = CachedTranslator::with_capacity(inner, settings.cache_capacity);
        self.with_translator(translator, settings.corpus_language)
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn corpus_language(&self) -> Language {
        self.corpus_language
    }

    pub fn translator(&self) -> Option<&CachedTranslator> {
        self.translator.as_ref()
    }

    /// The state new queries will read.
    pub fn state(&self) -> Arc<IndexState> {
        self.state.load_full()
    }

    pub fn stats(&self) -> CorpusStats {
        self.state.load().snapshot().stats()
    }

    /// Publish a fully built state. In-flight queries finish on the old one.
    pub fn swap(&self, state: IndexState) {
        info!(chunks = state.snapshot().len(), tables = state.tables_version(), "publishing index state");
        self.state.store(Arc::new(state));
    }

    /// Build a new state from parallel inputs and swap it in. On error the
    /// current state stays in place.
    pub fn rebuild(
        &self,
        texts: Vec<String>,
        metadata: Vec<ChunkMeta>,
        embeddings: Vec<Vec<f32>>,
        tables: &CuratedTables,
    ) -> Result<()> {
        let state = IndexState::from_parts(texts, metadata, embeddings, tables, self.settings.direct_match_boost)
            .inspect_err(|err| warn!(%err, "rebuild rejected, keeping current index"))?;
        if state.snapshot().dim() != 0 && state.snapshot().dim() != self.embedder.dim() {
            return Err(Error::SchemaMismatch(format!(
                "rebuilt corpus has dimension {}, embedder produces {}",
                state.snapshot().dim(),
                self.embedder.dim()
            )));
        }
        self.swap(state);
        Ok(())
    }

    pub fn classify(&self, query: &str) -> Classification {
        self.state.load().classifier().classify_detailed(&normalize(query))
    }

    pub fn expand(&self, query: &str) -> Vec<String> {
        self.state.load().expander().expand(&normalize(query))
    }

    pub fn prepare(&self, query: &str) -> PreparedQuery {
        self.prepare_with(&self.state.load(), query)
    }

    fn prepare_with(&self, state: &IndexState, query: &str) -> PreparedQuery {
        let normalized = normalize(query);
        let language = detect_language(&normalized);
        let translated = match &self.translator {
            Some(t) if language != self.corpus_language && !normalized.is_empty() => {
                let out = normalize(&t.translate_or_original(&normalized, language, self.corpus_language));
                (out != normalized && !out.is_empty()).then_some(out)
            }
            _ => None,
        };
        let primary = translated.clone().unwrap_or_else(|| normalized.clone());
        let variants = if self.settings.expand_queries { state.expander().expand(&primary) } else { vec![primary] };
        debug!(language = language.code(), translated = translated.is_some(), variants = variants.len(), "prepared query");
        PreparedQuery { original: query.to_string(), normalized, language, translated, variants }
    }

    fn embed(&self, prepared: &PreparedQuery) -> anyhow::Result<Vec<Vec<f32>>> {
        let embeddings = self.embedder.embed_batch(&prepared.variants).context("embedding query")?;
        if embeddings.len() != prepared.variants.len() {
            return Err(Error::SchemaMismatch(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                prepared.variants.len()
            ))
            .into());
        }
        Ok(embeddings)
    }

    /// Rank with a caller-supplied query embedding. Without `query_text`
    /// the ranking is purely semantic.
    pub fn search_embedded(
        &self,
        query_embedding: &[f32],
        query_text: Option<&str>,
        scope: &ScopeRequest,
        k: usize,
    ) -> Result<RankedResults> {
        let forms: Vec<String> = query_text.map(normalize).filter(|t| !t.is_empty()).into_iter().collect();
        let (results, status) = retrieve(&self.state.load(), &self.weights, &[query_embedding.to_vec()], &forms, scope, k)?;
        Ok(RankedResults { results, status })
    }

    /// Fused ranking without the rerank stage, using the configured scope.
    pub fn search(&self, query: &str, k: usize) -> anyhow::Result<RankedResults> {
        self.search_scoped(query, &self.settings.scope, k)
    }

    pub fn search_scoped(&self, query: &str, scope: &ScopeRequest, k: usize) -> anyhow::Result<RankedResults> {
        let state = self.state.load_full();
        let prepared = self.prepare_with(&state, query);
        let embeddings = self.embed(&prepared)?;
        let (results, status) = retrieve(&state, &self.weights, &embeddings, &prepared.lexical_forms(), scope, k)?;
        Ok(RankedResults { results, status })
    }

    /// Full cascade: `initial_k` fused candidates, external rerank under the
    /// configured timeout, `final_k` results.
    pub async fn search_with_rerank(&self, query: &str) -> anyhow::Result<RankedResults> {
        self.search_with_rerank_scoped(query, &self.settings.scope).await
    }

    pub async fn search_with_rerank_scoped(&self, query: &str, scope: &ScopeRequest) -> anyhow::Result<RankedResults> {
        let state = self.state.load_full();
        let prepared = self.prepare_with(&state, query);
        let embeddings = self.embed(&prepared)?;
        debug!(state = ?CascadeState::CandidateRetrieval, k = self.settings.initial_k, "cascade transition");
        let (candidates, mut status) =
            retrieve(&state, &self.weights, &embeddings, &prepared.lexical_forms(), scope, self.settings.initial_k)?;
        drop(state);

        let cascade = RerankCascade::new(self.reranker.clone(), self.settings.rerank_timeout(), self.settings.final_k);
        let (results, rerank) = cascade.run(prepared.primary(), candidates).await;
        status.rerank = rerank;
        Ok(RankedResults { results, status })
    }
}

struct ScopeChoice {
    scope: SearchScope,
    hint: Option<Category>,
    ambiguous: bool,
}

fn choose_scope(state: &IndexState, forms: &[String], request: &ScopeRequest) -> Result<ScopeChoice> {
    let classification =
        if forms.is_empty() { Classification::NoMatch } else { state.classifier().classify_detailed(&forms.join("\n")) };
    let hint = classification.category().cloned();
    let ambiguous = classification.is_ambiguous();

    let scope = match request {
        ScopeRequest::Global => SearchScope::Global,
        ScopeRequest::Category(category) => {
            state.index().partition(category)?;
            SearchScope::Category(category.clone())
        }
        ScopeRequest::Auto => match &classification {
            Classification::Category { category, .. } => match state.index().partition(category) {
                Ok(partition) if !partition.is_empty() => SearchScope::Category(category.clone()),
                _ => {
                    warn!(category = %category, "detected category has no chunks, searching globally");
                    SearchScope::Global
                }
            },
            Classification::Ambiguous { tied, .. } => {
                let err = Error::AmbiguousCategory(tied.iter().map(ToString::to_string).collect());
                warn!(%err, "searching globally");
                SearchScope::Global
            }
            Classification::NoMatch => SearchScope::Global,
        },
    };
    Ok(ScopeChoice { scope, hint, ambiguous })
}

/// `CandidateRetrieval`: fuse semantic and lexical signals over the chosen
/// scope and keep the top `k`.
fn retrieve(
    state: &IndexState,
    weights: &FusionWeights,
    embeddings: &[Vec<f32>],
    forms: &[String],
    request: &ScopeRequest,
    k: usize,
) -> Result<(Vec<SearchResult>, SearchStatus)> {
    if embeddings.is_empty() {
        return Err(Error::SchemaMismatch("no query embedding supplied".into()));
    }
    let choice = choose_scope(state, forms, request)?;
    let index_scope = match &choice.scope {
        SearchScope::Global => IndexScope::Global,
        SearchScope::Category(category) => IndexScope::Category(category),
    };

    // best score over all query variants; every call yields the scope's ids in the same order
    let mut semantic = state.index().semantic_scores(&embeddings[0], index_scope)?;
    for embedding in &embeddings[1..] {
        for (slot, (_, score)) in semantic.iter_mut().zip(state.index().semantic_scores(embedding, index_scope)?) {
            slot.1 = slot.1.max(score);
        }
    }

    let snapshot = state.snapshot();
    let signals = if forms.is_empty() {
        None
    } else {
        let query = state.lexical().prepare(forms);
        Some(query.score_chunks(semantic.iter().filter_map(|(id, _)| snapshot.chunk(*id))))
    };

    let fused: Vec<f32> = semantic
        .iter()
        .enumerate()
        .map(|(pos, (_, s))| match &signals {
            Some(signals) => fuse(weights, *s, signals[pos].title, signals[pos].keyword),
            None => *s,
        })
        .collect();

    let available = semantic.len();
    let exhausted = k > available;
    if exhausted {
        let err = Error::EmptyIndex { requested: k, available };
        warn!(%err, scope = ?choice.scope, "returning every chunk in scope");
    }

    // positions ascend with chunk ids, so ties on position are ties on id
    let top = top_k(fused.iter().copied().enumerate(), k);
    let mut results = Vec::with_capacity(top.len());
    for (rank, hit) in top.iter().enumerate() {
        let pos = hit.chunk_id;
        let (chunk_id, semantic_score) = semantic[pos];
        let chunk = snapshot
            .chunk(chunk_id)
            .ok_or_else(|| Error::SchemaMismatch(format!("chunk {chunk_id} missing from snapshot")))?;
        let (title_score, keyword_score) = signals.as_ref().map_or((0.0, 0.0), |s| (s[pos].title, s[pos].keyword));
        results.push(SearchResult {
            rank: rank + 1,
            chunk_id,
            semantic_score,
            title_score,
            keyword_score,
            fused_score: hit.score,
            rerank_score: None,
            category: chunk.category.clone(),
            source_id: chunk.source_id.clone(),
            text: Arc::clone(&chunk.text),
        });
    }

    let status = SearchStatus {
        scope: choice.scope,
        category_hint: choice.hint,
        ambiguous_category: choice.ambiguous,
        scope_exhausted: exhausted,
        rerank: RerankStatus::Skipped,
    };
    Ok((results, status))
}
