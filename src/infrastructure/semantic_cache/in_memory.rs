//! In-memory semantic cache implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::{debug, warn};

use crate::domain::embedding::{cosine_similarity, is_valid_vector};
use crate::domain::semantic_cache::{
    CacheEntry, CacheHit, SemanticCache, SemanticCacheConfig, SemanticCacheStats,
};
use crate::domain::DomainError;

/// One cached answer plus its mutable hit bookkeeping
///
/// Bookkeeping lives in atomics so a hit can be recorded while only the read
/// lock is held.
#[derive(Debug)]
pub(super) struct StoredEntry {
    pub(super) entry: CacheEntry,
    /// Insertion order; larger is newer
    pub(super) seq: u64,
    hit_count: AtomicU64,
    /// Millisecond timestamp of the last hit, 0 when never hit
    last_hit_ms: AtomicI64,
    /// Logical clock value of the last hit or of the insertion
    last_touch: AtomicU64,
}

impl StoredEntry {
    fn new(entry: CacheEntry, tick: u64) -> Self {
        let hit_count = entry.hit_count();
        let last_hit_ms = entry
            .last_hit_at()
            .map(|t| t.timestamp_millis())
            .unwrap_or(0);

        Self {
            entry,
            seq: tick,
            hit_count: AtomicU64::new(hit_count),
            last_hit_ms: AtomicI64::new(last_hit_ms),
            last_touch: AtomicU64::new(tick),
        }
    }

    fn record_hit(&self, now: DateTime<Utc>, tick: u64) -> (u64, DateTime<Utc>) {
        let count = self.hit_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.last_hit_ms.store(now.timestamp_millis(), Ordering::Relaxed);
        self.last_touch.fetch_max(tick, Ordering::Relaxed);
        (count, now)
    }

    /// Entry with the current hit bookkeeping folded in
    pub(super) fn materialize(&self) -> CacheEntry {
        let last_hit_ms = self.last_hit_ms.load(Ordering::Relaxed);
        let last_hit_at = if last_hit_ms == 0 {
            None
        } else {
            Utc.timestamp_millis_opt(last_hit_ms).single()
        };

        self.entry
            .clone()
            .with_hits(self.hit_count.load(Ordering::Relaxed), last_hit_at)
    }

    fn recency_key(&self) -> (u64, DateTime<Utc>) {
        (self.last_touch.load(Ordering::Relaxed), self.entry.created_at())
    }
}

/// In-memory semantic cache using linear search
///
/// Lookups share a read lock and never serialise against each other. Inserts,
/// eviction and sweeps take the write lock.
#[derive(Debug)]
pub struct InMemorySemanticCache {
    pub(super) entries: RwLock<HashMap<u64, StoredEntry>>,
    pub(super) config: SemanticCacheConfig,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    /// Sum of hit similarities in millionths
    similarity_sum: AtomicU64,
}

impl InMemorySemanticCache {
    pub fn new(config: SemanticCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            clock: AtomicU64::new(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            similarity_sum: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    pub(super) fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn ttl(&self) -> Duration {
        Duration::seconds(self.config.ttl_secs as i64)
    }

    pub(super) fn read_entries(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<u64, StoredEntry>>, DomainError> {
        self.entries
            .read()
            .map_err(|e| DomainError::cache(format!("Failed to acquire read lock: {}", e)))
    }

    pub(super) fn write_entries(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<u64, StoredEntry>>, DomainError> {
        self.entries
            .write()
            .map_err(|e| DomainError::cache(format!("Failed to acquire write lock: {}", e)))
    }

    pub(super) fn stored(entry: CacheEntry, tick: u64) -> StoredEntry {
        StoredEntry::new(entry, tick)
    }

    fn record_miss(&self) -> Option<CacheHit> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn purge_expired(&self, entries: &mut HashMap<u64, StoredEntry>) -> usize {
        let ttl = self.ttl();
        let now = Utc::now();
        let before = entries.len();

        entries.retain(|_, stored| !stored.entry.is_expired(ttl, now));

        let removed = before - entries.len();
        self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Evict least recently used entries until there is room for one more
    pub(super) fn evict_for_insert(&self, entries: &mut HashMap<u64, StoredEntry>) {
        while entries.len() >= self.config.max_entries {
            let victim = entries
                .iter()
                .min_by_key(|(_, stored)| stored.recency_key())
                .map(|(key, _)| *key);

            match victim {
                Some(key) => {
                    entries.remove(&key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(seq = key, "Evicted least recently used cache entry");
                }
                None => break,
            }
        }
    }

    fn avg_hit_similarity(&self) -> f32 {
        let hits = self.hits.load(Ordering::Relaxed);

        if hits == 0 {
            return 0.0;
        }

        (self.similarity_sum.load(Ordering::Relaxed) as f64 / 1_000_000.0 / hits as f64) as f32
    }
}

#[async_trait]
impl SemanticCache for InMemorySemanticCache {
    async fn lookup(&self, query_embedding: &[f32]) -> Option<CacheHit> {
        if !is_valid_vector(query_embedding) {
            return self.record_miss();
        }

        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Semantic cache unavailable, treating as miss");
                return self.record_miss();
            }
        };

        let ttl = self.ttl();
        let now = Utc::now();

        let best = entries
            .values()
            .filter(|stored| !stored.entry.is_expired(ttl, now))
            .map(|stored| {
                (
                    stored,
                    cosine_similarity(query_embedding, stored.entry.query_embedding()),
                )
            })
            .max_by(|(a, sim_a), (b, sim_b)| {
                sim_a
                    .partial_cmp(sim_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.seq.cmp(&b.seq))
            });

        match best {
            Some((stored, similarity)) if similarity >= self.config.similarity_threshold => {
                let (hit_count, last_hit_at) = stored.record_hit(now, self.tick());
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.similarity_sum
                    .fetch_add((similarity as f64 * 1_000_000.0) as u64, Ordering::Relaxed);

                debug!(similarity, hit_count, "Semantic cache hit");

                let entry = stored.entry.clone().with_hits(hit_count, Some(last_hit_at));
                Some(CacheHit::new(entry, similarity))
            }
            _ => self.record_miss(),
        }
    }

    async fn insert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        if !is_valid_vector(entry.query_embedding()) {
            return Err(DomainError::cache("refusing to cache an invalid embedding"));
        }

        let mut entries = self.write_entries()?;

        self.purge_expired(&mut entries);
        self.evict_for_insert(&mut entries);

        let tick = self.tick();
        entries.insert(tick, StoredEntry::new(entry, tick));

        Ok(())
    }

    async fn remove(&self, entry: &CacheEntry) -> Result<usize, DomainError> {
        let mut entries = self.write_entries()?;
        let before = entries.len();

        entries.retain(|_, stored| {
            stored.entry.query_embedding() != entry.query_embedding()
                || stored.entry.answer_text() != entry.answer_text()
        });

        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Cache entry removed");
        }

        Ok(removed)
    }

    async fn stats(&self) -> SemanticCacheStats {
        SemanticCacheStats {
            total_entries: self.len().await,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            avg_hit_similarity: self.avg_hit_similarity(),
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut entries = self.write_entries()?;

        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
        self.similarity_sum.store(0, Ordering::Relaxed);

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<usize, DomainError> {
        let mut entries = self.write_entries()?;
        let removed = self.purge_expired(&mut entries);

        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Expired cache entries removed");
        }

        Ok(removed)
    }

    async fn len(&self) -> usize {
        let ttl = self.ttl();
        let now = Utc::now();

        match self.read_entries() {
            Ok(entries) => entries
                .values()
                .filter(|stored| !stored.entry.is_expired(ttl, now))
                .count(),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::faq::FaqId;
    use std::sync::Arc;

    fn cache(max_entries: usize) -> InMemorySemanticCache {
        InMemorySemanticCache::new(SemanticCacheConfig::new().with_max_entries(max_entries))
    }

    fn entry(text: &str, embedding: Vec<f32>) -> CacheEntry {
        CacheEntry::new(embedding, text, format!("answer for {}", text), vec![])
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let cache = cache(10);
        cache
            .insert(
                CacheEntry::new(vec![1.0, 0.0, 0.0], "hola", "¡Hola!", vec![FaqId::new("faq-1")]),
            )
            .await
            .unwrap();

        let hit = cache.lookup(&[1.0, 0.0, 0.0]).await.unwrap();

        assert_eq!(hit.entry.answer_text(), "¡Hola!");
        assert_eq!(hit.entry.source_faq_ids(), &[FaqId::new("faq-1")]);
        assert!((hit.similarity - 1.0).abs() < 0.001);
        assert_eq!(hit.entry.hit_count(), 1);
        assert!(hit.entry.last_hit_at().is_some());
    }

    #[tokio::test]
    async fn test_below_threshold_is_miss() {
        let cache = cache(10);
        cache.insert(entry("a", vec![1.0, 0.0])).await.unwrap();

        // cos = 0.8
        assert!(cache.lookup(&[0.8, 0.6]).await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_hit_is_idempotent_apart_from_bookkeeping() {
        let cache = cache(10);
        cache.insert(entry("a", vec![0.3, 0.4, 0.5])).await.unwrap();

        let first = cache.lookup(&[0.3, 0.4, 0.5]).await.unwrap();
        let second = cache.lookup(&[0.3, 0.4, 0.5]).await.unwrap();

        assert_eq!(first.entry.answer_text(), second.entry.answer_text());
        assert_eq!(first.entry.source_faq_ids(), second.entry.source_faq_ids());
        assert_eq!(second.entry.hit_count(), first.entry.hit_count() + 1);
        assert!(second.entry.last_hit_at() >= first.entry.last_hit_at());
    }

    #[tokio::test]
    async fn test_tie_goes_to_most_recent_insert() {
        let cache = cache(10);
        cache.insert(entry("older", vec![1.0, 0.0])).await.unwrap();
        cache.insert(entry("newer", vec![2.0, 0.0])).await.unwrap();

        let hit = cache.lookup(&[1.0, 0.0]).await.unwrap();
        assert_eq!(hit.entry.normalized_query_text(), "newer");
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = cache(3);
        cache.insert(entry("a", vec![1.0, 0.0, 0.0])).await.unwrap();
        cache.insert(entry("b", vec![0.0, 1.0, 0.0])).await.unwrap();
        cache.insert(entry("c", vec![0.0, 0.0, 1.0])).await.unwrap();

        // touch "a" so "b" becomes least recently used
        assert!(cache.lookup(&[1.0, 0.0, 0.0]).await.is_some());

        cache.insert(entry("d", vec![1.0, 1.0, 0.0])).await.unwrap();

        assert_eq!(cache.len().await, 3);
        assert!(cache.lookup(&[0.0, 1.0, 0.0]).await.is_none());
        assert!(cache.lookup(&[1.0, 0.0, 0.0]).await.is_some());
        assert!(cache.lookup(&[0.0, 0.0, 1.0]).await.is_some());
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_capacity_plus_one_inserts() {
        let capacity = 5;
        let cache = cache(capacity);

        for i in 0..=capacity {
            let mut v = vec![0.0; capacity + 1];
            v[i] = 1.0;
            cache.insert(entry(&format!("q{}", i), v)).await.unwrap();
        }

        assert_eq!(cache.len().await, capacity);

        let mut first = vec![0.0; capacity + 1];
        first[0] = 1.0;
        assert!(cache.lookup(&first).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_never_hit() {
        let cache = cache(10);
        let stale = entry("old", vec![1.0, 0.0]).with_created_at(Utc::now() - Duration::hours(2));
        cache.insert(stale).await.unwrap();

        assert!(cache.lookup(&[1.0, 0.0]).await.is_none());
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.cleanup_expired().await.unwrap(), 1);
        assert_eq!(cache.stats().await.expirations, 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_and_invalid_vectors_are_misses() {
        let cache = cache(10);
        cache.insert(entry("a", vec![1.0, 0.0])).await.unwrap();

        assert!(cache.lookup(&[1.0, 0.0, 0.0]).await.is_none());
        assert!(cache.lookup(&[f32::NAN, 0.0]).await.is_none());
        assert!(cache.lookup(&[]).await.is_none());
        assert!(cache.insert(entry("bad", vec![f32::INFINITY])).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let cache = cache(10);
        cache.insert(entry("a", vec![1.0])).await.unwrap();
        cache.lookup(&[1.0]).await;

        cache.clear().await.unwrap();

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.hits, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_average_similarity() {
        let cache = cache(10);
        cache.insert(entry("a", vec![1.0, 0.0])).await.unwrap();

        cache.lookup(&[1.0, 0.0]).await;
        cache.lookup(&[0.0, 1.0]).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.avg_hit_similarity - 1.0).abs() < 0.001);
        assert!((stats.hit_rate() - 0.5).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_remove_drops_only_matching_entry() {
        let cache = cache(10);
        cache.insert(entry("a", vec![1.0, 0.0])).await.unwrap();
        cache.insert(entry("b", vec![0.0, 1.0])).await.unwrap();

        let hit = cache.lookup(&[1.0, 0.0]).await.unwrap();
        assert_eq!(cache.remove(&hit.entry).await.unwrap(), 1);

        assert!(cache.lookup(&[1.0, 0.0]).await.is_none());
        assert!(cache.lookup(&[0.0, 1.0]).await.is_some());
        assert_eq!(cache.remove(&hit.entry).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_hits_are_all_counted() {
        let cache = Arc::new(cache(10));
        cache.insert(entry("a", vec![1.0, 1.0])).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.lookup(&[1.0, 1.0]).await.is_some() })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let hit = cache.lookup(&[1.0, 1.0]).await.unwrap();
        assert_eq!(hit.entry.hit_count(), 17);
    }
}
