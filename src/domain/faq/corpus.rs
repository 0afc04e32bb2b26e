//! Read-only corpus snapshots and the corpus store boundary

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use super::{FaqEntry, FaqId};
use crate::domain::DomainError;

/// Immutable view of the FAQ corpus at one point in time
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    entries: Vec<FaqEntry>,
    index: HashMap<FaqId, usize>,
    version: u64,
    latest_update: Option<DateTime<Utc>>,
}

impl CorpusSnapshot {
    /// Build a snapshot; later duplicates of an id replace earlier ones
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self::with_version(entries, 1)
    }

    fn with_version(entries: Vec<FaqEntry>, version: u64) -> Self {
        let mut by_id: HashMap<FaqId, FaqEntry> = HashMap::with_capacity(entries.len());

        for entry in entries {
            by_id.insert(entry.id.clone(), entry);
        }

        let mut entries: Vec<FaqEntry> = by_id.into_values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let index = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.id.clone(), idx))
            .collect();

        let latest_update = entries.iter().map(|e| e.updated_at).max();

        Self {
            entries,
            index,
            version,
            latest_update,
        }
    }

    /// Apply an incremental batch of changed entries on top of this snapshot
    pub fn merged_with(&self, updates: Vec<FaqEntry>) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(updates);
        Self::with_version(entries, self.version + 1)
    }

    pub fn get(&self, id: &FaqId) -> Option<&FaqEntry> {
        self.index.get(id).map(|&idx| &self.entries[idx])
    }

    /// All entries, sorted by id
    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn active(&self) -> impl Iterator<Item = &FaqEntry> {
        self.entries.iter().filter(|e| e.is_active)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn latest_update(&self) -> Option<DateTime<Utc>> {
        self.latest_update
    }
}

/// Read-only source of FAQ records
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Fetch every record, active or not
    async fn fetch_all(&self) -> Result<Vec<FaqEntry>, DomainError>;

    /// Fetch records changed after the given instant
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<FaqEntry>, DomainError>;
}

/// Shared handle to the current corpus snapshot
///
/// Readers clone the inner `Arc` and never hold the lock across an await.
/// `refresh` swaps in a new snapshot atomically.
#[derive(Debug)]
pub struct CorpusHandle {
    current: RwLock<Arc<CorpusSnapshot>>,
}

impl CorpusHandle {
    pub fn new(snapshot: CorpusSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn empty() -> Self {
        Self::new(CorpusSnapshot::default())
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the snapshot wholesale
    pub fn replace(&self, snapshot: CorpusSnapshot) {
        let snapshot = Arc::new(snapshot);

        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// Pull changes from the store and swap the snapshot
    ///
    /// Performs a full load when the current snapshot is empty, otherwise an
    /// incremental fetch since the newest `updated_at` seen so far. Returns the
    /// number of records received.
    pub async fn refresh(&self, store: &dyn CorpusStore) -> Result<usize, DomainError> {
        let current = self.snapshot();

        let (next, received) = match current.latest_update() {
            Some(since) if !current.is_empty() => {
                let updates = store.fetch_since(since).await?;
                let received = updates.len();

                if received == 0 {
                    debug!(version = current.version(), "Corpus unchanged");
                    return Ok(0);
                }

                (current.merged_with(updates), received)
            }
            _ => {
                let entries = store.fetch_all().await?;
                let received = entries.len();
                (CorpusSnapshot::with_version(entries, current.version() + 1), received)
            }
        };

        info!(
            version = next.version(),
            entries = next.len(),
            received,
            "Corpus snapshot refreshed"
        );

        self.replace(next);
        Ok(received)
    }
}

impl Default for CorpusHandle {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(id: &str, answer: &str) -> FaqEntry {
        FaqEntry::new(id, format!("question {}", id), answer)
    }

    #[test]
    fn test_snapshot_sorted_and_deduplicated() {
        let snapshot = CorpusSnapshot::new(vec![
            entry("b", "first b"),
            entry("a", "a"),
            entry("b", "second b"),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.entries()[0].id.as_str(), "a");
        assert_eq!(snapshot.get(&FaqId::new("b")).unwrap().answer, "second b");
    }

    #[test]
    fn test_active_filter() {
        let snapshot = CorpusSnapshot::new(vec![
            entry("a", "a"),
            entry("b", "b").with_active(false),
        ]);

        let active: Vec<_> = snapshot.active().map(|e| e.id.as_str()).collect();
        assert_eq!(active, vec!["a"]);
    }

    #[tokio::test]
    async fn test_refresh_full_then_incremental() {
        let base = Utc::now() - Duration::hours(1);
        let handle = CorpusHandle::empty();

        let mut store = MockCorpusStore::new();
        store
            .expect_fetch_all()
            .times(1)
            .returning(move || Ok(vec![entry("a", "a").with_updated_at(base)]));
        store
            .expect_fetch_since()
            .times(1)
            .returning(move |_| {
                Ok(vec![
                    entry("a", "a v2").with_updated_at(base + Duration::minutes(5)),
                    entry("c", "c").with_updated_at(base + Duration::minutes(5)),
                ])
            });

        assert_eq!(handle.refresh(&store).await.unwrap(), 1);
        assert_eq!(handle.snapshot().len(), 1);

        assert_eq!(handle.refresh(&store).await.unwrap(), 2);
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&FaqId::new("a")).unwrap().answer, "a v2");
        assert_eq!(snapshot.version(), 2);
    }

    #[tokio::test]
    async fn test_refresh_error_keeps_snapshot() {
        let handle = CorpusHandle::new(CorpusSnapshot::new(vec![entry("a", "a")]));

        let mut store = MockCorpusStore::new();
        store
            .expect_fetch_since()
            .returning(|_| Err(DomainError::storage("unreachable")));

        assert!(handle.refresh(&store).await.is_err());
        assert_eq!(handle.snapshot().len(), 1);
    }
}
