//! govqa-hybrid
//!
//! Score fusion, the retrieve-then-rerank cascade and the retrieval engine
//! that ties the vector and lexical crates together.

pub mod answer;
pub mod cascade;
pub mod engine;
pub mod fusion;
pub mod rerank;
pub mod state;
pub mod translate;

pub use answer::{Answer, Assistant, ANSWER_PASSAGES};
pub use cascade::{finalize, rerank_scores, CascadeState, RerankCascade};
pub use engine::{PreparedQuery, RetrievalEngine};
pub use fusion::fuse;
pub use rerank::TermOverlapReranker;
pub use state::IndexState;
pub use translate::{CachedTranslator, MokaTranslationCache, SharedTranslationCache, TranslationKey};
