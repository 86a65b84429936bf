use govqa_core::error::{Error, Result};
use govqa_core::types::{Category, ChunkId};
use tracing::{info, warn};

use crate::corpus::CorpusSnapshot;
use crate::index::{Neighbor, VectorIndex};
use crate::partition::{CategoryIndex, CategoryIndexes};

/// Which vectors a search runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexScope<'a> {
    Global,
    Category(&'a Category),
}

/// Neighbors plus whether the scope held fewer vectors than requested.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedHits {
    pub neighbors: Vec<Neighbor>,
    pub exhausted: bool,
}

/// A snapshot together with its global index and per-category partitions.
/// Built in one go; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    snapshot: CorpusSnapshot,
    global: VectorIndex,
    partitions: CategoryIndexes,
}

impl CorpusIndex {
    pub fn build(snapshot: CorpusSnapshot) -> Result<Self> {
        let global = VectorIndex::build(
            snapshot.dim(),
            (0..snapshot.len()).filter_map(|id| snapshot.embedding(id)),
        )?;
        if global.len() != snapshot.len() {
            return Err(Error::SchemaMismatch(format!(
                "global index holds {} rows for {} chunks",
                global.len(),
                snapshot.len()
            )));
        }
        let partitions = CategoryIndexes::build(&snapshot)?;
        info!(chunks = snapshot.len(), partitions = partitions.len(), "corpus index built");
        Ok(Self { snapshot, global, partitions })
    }

    pub fn snapshot(&self) -> &CorpusSnapshot {
        &self.snapshot
    }

    pub fn global(&self) -> &VectorIndex {
        &self.global
    }

    pub fn partitions(&self) -> &CategoryIndexes {
        &self.partitions
    }

    pub fn partition(&self, category: &Category) -> Result<&CategoryIndex> {
        self.partitions
            .get(category)
            .ok_or_else(|| Error::NotFound(format!("category '{category}' is not indexed")))
    }

    /// Number of vectors a scope covers.
    pub fn scope_len(&self, scope: IndexScope<'_>) -> Result<usize> {
        match scope {
            IndexScope::Global => Ok(self.global.len()),
            IndexScope::Category(category) => Ok(self.partition(category)?.len()),
        }
    }

    /// Top `k` global chunk ids in the scope. A scope smaller than `k`
    /// yields everything it has and reports itself exhausted.
    pub fn search(&self, query: &[f32], k: usize, scope: IndexScope<'_>) -> Result<ScopedHits> {
        let available = self.scope_len(scope)?;
        let exhausted = k > available;
        if exhausted {
            let err = Error::EmptyIndex { requested: k, available };
            warn!(%err, "returning every vector in scope");
        }
        let neighbors = match scope {
            IndexScope::Global => self.global.search(query, k)?,
            IndexScope::Category(category) => self.partition(category)?.search(query, k)?,
        };
        Ok(ScopedHits { neighbors, exhausted })
    }

    /// Semantic score of every chunk in the scope, keyed by global id, in id order.
    pub fn semantic_scores(&self, query: &[f32], scope: IndexScope<'_>) -> Result<Vec<(ChunkId, f32)>> {
        match scope {
            IndexScope::Global => Ok(self.global.score_all(query)?.into_iter().enumerate().collect()),
            IndexScope::Category(category) => self.partition(category)?.score_all(query),
        }
    }
}
