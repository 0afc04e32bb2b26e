//! Semantic cache trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::{CacheEntry, CacheHit, SemanticCacheStats};
use crate::domain::DomainError;

/// Similarity-keyed answer cache
///
/// Lookups are best effort: any internal failure is reported as a miss.
#[async_trait]
pub trait SemanticCache: Send + Sync + Debug {
    /// Best live entry at or above the hit threshold; records the hit
    async fn lookup(&self, query_embedding: &[f32]) -> Option<CacheHit>;

    /// Store a freshly computed answer, evicting if at capacity
    async fn insert(&self, entry: CacheEntry) -> Result<(), DomainError>;

    /// Drop every stored copy of `entry`, returning how many were removed
    async fn remove(&self, entry: &CacheEntry) -> Result<usize, DomainError>;

    async fn stats(&self) -> SemanticCacheStats;

    async fn clear(&self) -> Result<(), DomainError>;

    /// Drop expired entries, returning how many were removed
    async fn cleanup_expired(&self) -> Result<usize, DomainError>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
