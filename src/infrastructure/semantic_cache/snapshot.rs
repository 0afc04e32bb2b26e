//! JSON persistence for the in-memory semantic cache

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::InMemorySemanticCache;
use crate::domain::embedding::is_valid_vector;
use crate::domain::semantic_cache::CacheEntry;
use crate::domain::DomainError;

const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// On-disk layout; entries are read as raw JSON so one bad record is skipped alone
#[derive(Debug, Serialize, Deserialize)]
struct CacheSnapshotFile<E = CacheEntry> {
    version: u32,
    saved_at: DateTime<Utc>,
    entries: Vec<E>,
}

/// Outcome of loading a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotLoad {
    pub loaded: usize,
    pub skipped: usize,
}

impl InMemorySemanticCache {
    /// Write every live entry to `path` as JSON, returning how many were saved
    pub async fn save_snapshot(&self, path: &Path) -> Result<usize, DomainError> {
        let ttl = self.ttl();
        let now = Utc::now();

        let entries: Vec<CacheEntry> = {
            let entries = self.read_entries()?;
            let mut stored: Vec<_> = entries
                .values()
                .filter(|stored| !stored.entry.is_expired(ttl, now))
                .collect();
            stored.sort_by_key(|stored| stored.seq);
            stored.into_iter().map(|stored| stored.materialize()).collect()
        };

        let file = CacheSnapshotFile {
            version: SNAPSHOT_FORMAT_VERSION,
            saved_at: now,
            entries,
        };

        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| DomainError::storage(format!("Failed to serialize cache: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(path, json).await.map_err(|e| {
            DomainError::storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), entries = file.entries.len(), "Semantic cache saved");
        Ok(file.entries.len())
    }

    /// Load entries from a snapshot written by [`save_snapshot`](Self::save_snapshot)
    ///
    /// Entries that fail to parse, are expired, carry an unusable embedding or
    /// do not match `expected_dimensions` are skipped. Loading stops adding
    /// once the cache is full; the most recently used entries win. A missing
    /// file loads nothing.
    pub async fn load_snapshot(
        &self,
        path: &Path,
        expected_dimensions: Option<usize>,
    ) -> Result<SnapshotLoad, DomainError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No cache snapshot found");
                return Ok(SnapshotLoad::default());
            }
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let file: CacheSnapshotFile<serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|e| {
                DomainError::storage(format!("Corrupt cache snapshot {}: {}", path.display(), e))
            })?;

        if file.version != SNAPSHOT_FORMAT_VERSION {
            return Err(DomainError::storage(format!(
                "Unsupported cache snapshot version {}",
                file.version
            )));
        }

        let ttl = self.ttl();
        let now = Utc::now();
        let total = file.entries.len();

        let mut malformed = 0;
        let parsed: Vec<CacheEntry> = file
            .entries
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<CacheEntry>(raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    malformed += 1;
                    debug!(error = %e, "Malformed cache snapshot entry");
                    None
                }
            })
            .collect();

        if malformed > 0 {
            warn!(path = %path.display(), malformed, "Cache snapshot contained malformed entries");
        }

        let mut usable: Vec<CacheEntry> = parsed
            .into_iter()
            .filter(|entry| !entry.is_expired(ttl, now))
            .filter(|entry| is_valid_vector(entry.query_embedding()))
            .filter(|entry| {
                expected_dimensions.is_none_or(|dims| entry.query_embedding().len() == dims)
            })
            .collect();

        // Most recently used last so they receive the newest ticks
        usable.sort_by_key(|entry| entry.last_hit_at().unwrap_or(entry.created_at()));

        let mut entries = self.write_entries()?;
        let room = self.config.max_entries.saturating_sub(entries.len());
        let keep_from = usable.len().saturating_sub(room);
        let loaded = usable.len() - keep_from;

        for entry in usable.into_iter().skip(keep_from) {
            let tick = self.tick();
            entries.insert(tick, Self::stored(entry, tick));
        }

        let skipped = total - loaded;
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "Skipped unusable cache snapshot entries");
        }

        info!(path = %path.display(), loaded, "Semantic cache restored");
        Ok(SnapshotLoad { loaded, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::faq::FaqId;
    use crate::domain::semantic_cache::{SemanticCache, SemanticCacheConfig};
    use chrono::Duration;

    fn cache(max_entries: usize) -> InMemorySemanticCache {
        InMemorySemanticCache::new(SemanticCacheConfig::new().with_max_entries(max_entries))
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("snapshot.json");

        let source = cache(10);
        source
            .insert(CacheEntry::new(
                vec![1.0, 0.0],
                "hola",
                "¡Hola!",
                vec![FaqId::new("faq-greeting")],
            ))
            .await
            .unwrap();
        source.lookup(&[1.0, 0.0]).await.unwrap();

        assert_eq!(source.save_snapshot(&path).await.unwrap(), 1);

        let restored = cache(10);
        let load = restored.load_snapshot(&path, Some(2)).await.unwrap();
        assert_eq!(load, SnapshotLoad { loaded: 1, skipped: 0 });

        let hit = restored.lookup(&[1.0, 0.0]).await.unwrap();
        assert_eq!(hit.entry.answer_text(), "¡Hola!");
        assert_eq!(hit.entry.source_faq_ids(), &[FaqId::new("faq-greeting")]);
        assert_eq!(hit.entry.hit_count(), 2);
    }

    #[tokio::test]
    async fn test_load_skips_unusable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let file = CacheSnapshotFile {
            version: SNAPSHOT_FORMAT_VERSION,
            saved_at: Utc::now(),
            entries: vec![
                CacheEntry::new(vec![1.0, 0.0], "ok", "a", vec![]),
                CacheEntry::new(vec![1.0, 0.0, 0.0], "wrong dims", "b", vec![]),
                CacheEntry::new(vec![], "empty", "c", vec![]),
                CacheEntry::new(vec![0.0, 1.0], "old", "d", vec![])
                    .with_created_at(Utc::now() - Duration::days(1)),
            ],
        };
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        let cache = cache(10);
        let load = cache.load_snapshot(&path, Some(2)).await.unwrap();

        assert_eq!(load, SnapshotLoad { loaded: 1, skipped: 3 });
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_load_respects_capacity_keeping_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let now = Utc::now();

        let file = CacheSnapshotFile {
            version: SNAPSHOT_FORMAT_VERSION,
            saved_at: now,
            entries: vec![
                CacheEntry::new(vec![1.0, 0.0], "older", "a", vec![])
                    .with_created_at(now - Duration::minutes(10)),
                CacheEntry::new(vec![0.0, 1.0], "newer", "b", vec![])
                    .with_created_at(now - Duration::minutes(1)),
            ],
        };
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        let cache = cache(1);
        let load = cache.load_snapshot(&path, None).await.unwrap();

        assert_eq!(load.loaded, 1);
        assert!(cache.lookup(&[0.0, 1.0]).await.is_some());
        assert!(cache.lookup(&[1.0, 0.0]).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(10);

        let load = cache
            .load_snapshot(&dir.path().join("absent.json"), None)
            .await
            .unwrap();

        assert_eq!(load, SnapshotLoad::default());
    }

    #[tokio::test]
    async fn test_malformed_entry_skipped_alongside_valid_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let valid = serde_json::to_value(CacheEntry::new(vec![1.0, 0.0], "hola", "¡Hola!", vec![]))
            .unwrap();
        let file = serde_json::json!({
            "version": SNAPSHOT_FORMAT_VERSION,
            "saved_at": Utc::now(),
            "entries": [{"bogus": 1}, valid],
        });
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        let cache = cache(10);
        let load = cache.load_snapshot(&path, Some(2)).await.unwrap();

        assert_eq!(load, SnapshotLoad { loaded: 1, skipped: 1 });
        let hit = cache.lookup(&[1.0, 0.0]).await.unwrap();
        assert_eq!(hit.entry.answer_text(), "¡Hola!");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, b"{not json").unwrap();

        let result = cache(10).load_snapshot(&path, None).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
