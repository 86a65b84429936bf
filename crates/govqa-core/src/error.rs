use thiserror::Error;

use crate::types::ChunkId;

/// Failures raised by the retrieval core.
///
/// `SchemaMismatch` and `UnknownCategory` are integrity errors and abort the
/// operation they occur in. `EmptyIndex`, `AmbiguousCategory` and
/// `RerankUnavailable` are returned only by the strict entry points; the
/// query path recovers them into a [`crate::types::SearchStatus`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("chunk {chunk_id} has unknown category '{category}'")]
    UnknownCategory { chunk_id: ChunkId, category: String },

    #[error("search scope holds {available} vectors but {requested} were requested")]
    EmptyIndex { requested: usize, available: usize },

    #[error("ambiguous category, tied between {0:?}")]
    AmbiguousCategory(Vec<String>),

    #[error("reranker unavailable: {0}")]
    RerankUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors that must never be absorbed into a best-effort result.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::SchemaMismatch(_) | Self::UnknownCategory { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
