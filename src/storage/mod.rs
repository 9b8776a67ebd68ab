//! Cross-run storage: the file-backed result cache and the query
//! similarity index. Both are shared between concurrent research runs and
//! degrade to a miss on any failure.

/// File-backed JSON cache with TTL expiry.
pub mod cache;
/// Vector similarity index over past research queries.
pub mod similarity;

pub use cache::FileCache;
pub use similarity::{SimilarityHit, SimilarityIndex};
