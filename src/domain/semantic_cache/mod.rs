//! Semantic answer cache domain
//!
//! Matches semantically similar queries by embedding rather than by exact
//! text, so "hola" and "buenas" can share one generated answer.

mod config;
mod entry;
mod repository;

pub use config::SemanticCacheConfig;
pub use entry::{CacheEntry, CacheHit, SemanticCacheStats};
pub use repository::SemanticCache;
