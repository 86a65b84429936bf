use std::collections::BTreeMap;

use govqa_core::error::{Error, Result};
use govqa_core::types::{Category, ChunkId};
use tracing::debug;

use crate::corpus::CorpusSnapshot;
use crate::index::{top_k, Neighbor, VectorIndex};

/// Index over the chunks of one category.
///
/// Rows are local; `global_ids[local]` maps each row back to its snapshot id.
/// Every neighbor this type returns already carries the global id.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    category: Category,
    index: VectorIndex,
    global_ids: Vec<ChunkId>,
}

impl CategoryIndex {
    fn build(snapshot: &CorpusSnapshot, category: &Category) -> Result<Self> {
        let global_ids: Vec<ChunkId> =
            snapshot.chunks().iter().filter(|c| &c.category == category).map(|c| c.id).collect();
        let rows = global_ids.iter().filter_map(|&id| snapshot.embedding(id));
        let index = VectorIndex::build(snapshot.dim(), rows)?;
        if index.len() != global_ids.len() {
            return Err(Error::SchemaMismatch(format!(
                "partition '{category}' holds {} rows for {} chunks",
                index.len(),
                global_ids.len()
            )));
        }
        Ok(Self { category: category.clone(), index, global_ids })
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn len(&self) -> usize {
        self.global_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global_ids.is_empty()
    }

    pub fn global_ids(&self) -> &[ChunkId] {
        &self.global_ids
    }

    /// Scores keyed by global chunk id.
    pub fn score_all(&self, query: &[f32]) -> Result<Vec<(ChunkId, f32)>> {
        let scores = self.index.score_all(query)?;
        Ok(self.global_ids.iter().copied().zip(scores).collect())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k > self.len() {
            debug!(category = %self.category, requested = k, available = self.len(), "partition exhausted");
        }
        Ok(top_k(self.score_all(query)?, k))
    }

    pub fn try_search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k > self.len() {
            return Err(Error::EmptyIndex { requested: k, available: self.len() });
        }
        self.search(query, k)
    }
}

/// One partition per category of the snapshot's category set, empty ones included.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndexes {
    partitions: BTreeMap<Category, CategoryIndex>,
}

impl CategoryIndexes {
    pub fn build(snapshot: &CorpusSnapshot) -> Result<Self> {
        let mut partitions = BTreeMap::new();
        for category in snapshot.categories().iter() {
            let partition = CategoryIndex::build(snapshot, category)?;
            debug!(category = %category, chunks = partition.len(), "built category partition");
            partitions.insert(category.clone(), partition);
        }
        let built = Self { partitions };
        built.check_partition(snapshot.len())?;
        Ok(built)
    }

    pub fn get(&self, category: &Category) -> Option<&CategoryIndex> {
        self.partitions.get(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryIndex> {
        self.partitions.values()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Every chunk id in `0..total` appears in exactly one partition.
    pub fn check_partition(&self, total: usize) -> Result<()> {
        let mut seen = vec![false; total];
        for partition in self.partitions.values() {
            for &id in partition.global_ids() {
                match seen.get_mut(id) {
                    Some(slot) if !*slot => *slot = true,
                    Some(_) => {
                        return Err(Error::SchemaMismatch(format!("chunk {id} appears in two partitions")));
                    }
                    None => {
                        return Err(Error::SchemaMismatch(format!("partition refers to chunk {id} of {total}")));
                    }
                }
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(Error::SchemaMismatch(format!("chunk {missing} is in no partition")));
        }
        Ok(())
    }
}
