pub mod corpus;
pub mod corpus_index;
pub mod index;
pub mod partition;
pub mod snapshot_io;

pub use corpus::{CorpusSnapshot, CorpusStats};
pub use corpus_index::{CorpusIndex, IndexScope, ScopedHits};
pub use index::{l2_normalize, top_k, Neighbor, VectorIndex};
pub use partition::{CategoryIndex, CategoryIndexes};
pub use snapshot_io::{load_snapshot_files, save_snapshot_files};
