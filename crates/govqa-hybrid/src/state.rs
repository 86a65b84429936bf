use govqa_core::error::Result;
use govqa_core::tables::CuratedTables;
use govqa_core::types::ChunkMeta;
use govqa_lexical::{CategoryClassifier, LexicalScorer, QueryExpander};
use govqa_vector::{CorpusIndex, CorpusSnapshot};
use tracing::info;

/// Everything a query reads: the indexed snapshot plus the compiled
/// curated tables. Built whole and published as one unit.
#[derive(Debug)]
pub struct IndexState {
    index: CorpusIndex,
    tables_version: String,
    classifier: CategoryClassifier,
    expander: QueryExpander,
    lexical: LexicalScorer,
}

impl IndexState {
    pub fn build(snapshot: CorpusSnapshot, tables: &CuratedTables, direct_match_boost: f32) -> Result<Self> {
        tables.validate()?;
        let index = CorpusIndex::build(snapshot)?;
        info!(
            chunks = index.snapshot().len(),
            tables = tables.version.as_str(),
            keywords = tables.keywords.len(),
            "index state built"
        );
        Ok(Self {
            index,
            tables_version: tables.version.clone(),
            classifier: CategoryClassifier::new(tables),
            expander: QueryExpander::new(tables),
            lexical: LexicalScorer::new(tables, direct_match_boost),
        })
    }

    /// Build from parallel inputs, using the tables' category set.
    pub fn from_parts(
        texts: Vec<String>,
        metadata: Vec<ChunkMeta>,
        embeddings: Vec<Vec<f32>>,
        tables: &CuratedTables,
        direct_match_boost: f32,
    ) -> Result<Self> {
        let snapshot = CorpusSnapshot::build(texts, metadata, embeddings, &tables.category_set())?;
        Self::build(snapshot, tables, direct_match_boost)
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn snapshot(&self) -> &CorpusSnapshot {
        self.index.snapshot()
    }

    pub fn tables_version(&self) -> &str {
        &self.tables_version
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn expander(&self) -> &QueryExpander {
        &self.expander
    }

    pub fn lexical(&self) -> &LexicalScorer {
        &self.lexical
    }
}
