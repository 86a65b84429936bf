//! govqa-lexical
//!
//! Query-side text handling: normalization and expansion, language
//! detection, keyword-count category classification, and the title /
//! keyword / direct-match signals fused with semantic similarity.

pub mod classify;
pub mod expand;
pub mod language;
pub mod normalize;
pub mod signals;

pub use classify::{CategoryClassifier, Classification};
pub use expand::QueryExpander;
pub use language::{detect_language, dominant_language};
pub use normalize::{fold, normalize, tokens};
pub use signals::{title_score, ChunkSignals, KeywordMatcher, LexicalScorer, QuerySignals};
