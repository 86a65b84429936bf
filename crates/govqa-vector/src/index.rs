//! Exact inner-product index over L2-normalized vectors.
//!
//! Rows are stored contiguously; search scores every row. At the corpus sizes
//! this serves (a few thousand chunks) a flat scan is both exact and fast.

use govqa_core::error::{Error, Result};
use govqa_core::types::{rank_order, ChunkId};
use serde::Serialize;
use tracing::debug;

/// A scored row. `chunk_id` is local to the index it came from until remapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub chunk_id: ChunkId,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build from rows of dimension `dim`. Rows are normalized on the way in.
    pub fn build<'a, I>(dim: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut data = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            check_vector(row, dim, || format!("row {i}"))?;
            let start = data.len();
            data.extend_from_slice(row);
            l2_normalize(&mut data[start..]);
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.len() {
            return None;
        }
        self.data.get(i * self.dim..(i + 1) * self.dim)
    }

    /// Inner product of the (normalized) query with every row, in row order.
    pub fn score_all(&self, query: &[f32]) -> Result<Vec<f32>> {
        if self.dim != 0 {
            check_vector(query, self.dim, || "query".to_string())?;
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut q = query.to_vec();
        l2_normalize(&mut q);
        Ok(self.data.chunks_exact(self.dim).map(|row| dot(row, &q)).collect())
    }

    /// Top `k` rows, failing with `EmptyIndex` when fewer than `k` exist.
    pub fn try_search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k > self.len() {
            return Err(Error::EmptyIndex { requested: k, available: self.len() });
        }
        self.search(query, k)
    }

    /// Top `k` rows by inner product, ties broken by lower row id.
    /// Returns every row when `k` exceeds the index size.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k > self.len() {
            debug!(requested = k, available = self.len(), "search capped at index size");
        }
        let scores = self.score_all(query)?;
        Ok(top_k(scores.into_iter().enumerate(), k))
    }
}

/// Select the `k` best `(id, score)` pairs in deterministic rank order.
pub fn top_k<I>(scored: I, k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = (ChunkId, f32)>,
{
    let mut all: Vec<Neighbor> = scored.into_iter().map(|(chunk_id, score)| Neighbor { chunk_id, score }).collect();
    let order = |a: &Neighbor, b: &Neighbor| rank_order((a.score, a.chunk_id), (b.score, b.chunk_id));
    if k < all.len() {
        if k == 0 {
            return Vec::new();
        }
        all.select_nth_unstable_by(k - 1, order);
        all.truncate(k);
    }
    all.sort_by(order);
    all
}

/// Scale to unit length in place. Zero vectors are left as they are.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `what` names the vector in the error and is only built on failure.
pub(crate) fn check_vector(v: &[f32], dim: usize, what: impl FnOnce() -> String) -> Result<()> {
    if v.len() != dim {
        return Err(Error::SchemaMismatch(format!("{} has dimension {}, expected {dim}", what(), v.len())));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::SchemaMismatch(format!("{} contains non-finite values", what())));
    }
    Ok(())
}
