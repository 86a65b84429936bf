use std::collections::{BTreeMap, HashSet};

use govqa_core::error::{Error, Result};
use govqa_core::types::{CategorySet, Chunk, ChunkId, ChunkMeta};
use serde::Serialize;
use tracing::info;

use crate::index::{check_vector, l2_normalize};

/// Immutable set of chunks and their normalized embeddings.
///
/// Built once from parallel inputs; ids are positions and stay valid for the
/// snapshot's lifetime. A changed corpus means a new snapshot.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    dim: usize,
    categories: CategorySet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total_chunks: usize,
    pub total_documents: usize,
    pub categories: BTreeMap<String, usize>,
    pub embedding_dim: usize,
}

impl CorpusSnapshot {
    /// Validate and assemble a snapshot.
    ///
    /// Fails with `SchemaMismatch` when the three inputs differ in length or
    /// any embedding's dimension differs from the first, and with
    /// `UnknownCategory` when a chunk's category is outside `categories`.
    pub fn build(
        texts: Vec<String>,
        metadata: Vec<ChunkMeta>,
        mut embeddings: Vec<Vec<f32>>,
        categories: &CategorySet,
    ) -> Result<Self> {
        if texts.len() != metadata.len() || texts.len() != embeddings.len() {
            return Err(Error::SchemaMismatch(format!(
                "{} texts, {} metadata entries, {} embeddings",
                texts.len(),
                metadata.len(),
                embeddings.len()
            )));
        }
        let dim = embeddings.first().map_or(0, Vec::len);
        if dim == 0 && !embeddings.is_empty() {
            return Err(Error::SchemaMismatch("embeddings have zero dimension".into()));
        }
        for (id, embedding) in embeddings.iter_mut().enumerate() {
            check_vector(embedding, dim, || format!("embedding {id}"))?;
            l2_normalize(embedding);
        }
        let mut chunks = Vec::with_capacity(texts.len());
        for (id, (text, meta)) in texts.into_iter().zip(metadata).enumerate() {
            categories.check(id, &meta.category)?;
            chunks.push(Chunk::new(id, text, meta));
        }
        info!(chunks = chunks.len(), dim, categories = categories.len(), "corpus snapshot built");
        Ok(Self { chunks, embeddings, dim, categories: categories.clone() })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Normalized embedding of a chunk.
    pub fn embedding(&self, id: ChunkId) -> Option<&[f32]> {
        self.embeddings.get(id).map(Vec::as_slice)
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn stats(&self) -> CorpusStats {
        let mut categories = BTreeMap::new();
        for chunk in &self.chunks {
            *categories.entry(chunk.category.to_string()).or_insert(0) += 1;
        }
        let documents: HashSet<&str> = self.chunks.iter().map(|c| c.source_id.as_str()).collect();
        CorpusStats {
            total_chunks: self.chunks.len(),
            total_documents: documents.len(),
            categories,
            embedding_dim: self.dim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> CategorySet {
        CategorySet::new(["health", "education"])
    }

    #[test]
    fn builds_and_derives_titles() {
        let snap = CorpusSnapshot::build(
            vec!["Doctor Licensing\nbody".into(), "University Admission\nbody".into()],
            vec![ChunkMeta::new("health", "doc_a.txt"), ChunkMeta::new("education", "doc_b.txt")],
            vec![vec![2.0, 0.0], vec![0.0, 3.0]],
            &categories(),
        )
        .unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.dim(), 2);
        assert_eq!(snap.chunk(1).unwrap().title, "University Admission");
        assert_eq!(snap.embedding(0).unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = CorpusSnapshot::build(
            vec!["a".into(), "b".into()],
            vec![ChunkMeta::new("health", "a")],
            vec![vec![1.0], vec![1.0]],
            &categories(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let err = CorpusSnapshot::build(
            vec!["a".into(), "b".into()],
            vec![ChunkMeta::new("health", "a"), ChunkMeta::new("health", "b")],
            vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
            &categories(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn unknown_category_rejected() {
        let err = CorpusSnapshot::build(
            vec!["a".into()],
            vec![ChunkMeta::new("sports", "a")],
            vec![vec![1.0]],
            &categories(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownCategory { chunk_id: 0, .. }));
    }

    #[test]
    fn stats_count_documents_and_categories() {
        let snap = CorpusSnapshot::build(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                ChunkMeta::new("health", "x.txt"),
                ChunkMeta::new("health", "x.txt"),
                ChunkMeta::new("education", "y.txt"),
            ],
            vec![vec![1.0], vec![1.0], vec![1.0]],
            &categories(),
        )
        .unwrap();
        let stats = snap.stats();
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.categories["health"], 2);
        assert_eq!(stats.embedding_dim, 1);
    }
}
