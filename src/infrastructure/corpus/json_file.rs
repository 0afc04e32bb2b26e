//! JSON file corpus store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::faq::{CorpusStore, FaqEntry};
use crate::domain::DomainError;

/// Accepted file layouts: a bare array or an object with an `faqs` array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Entries(Vec<FaqEntry>),
    Wrapped { faqs: Vec<FaqEntry> },
}

impl CorpusFile {
    fn into_entries(self) -> Vec<FaqEntry> {
        match self {
            Self::Entries(entries) | Self::Wrapped { faqs: entries } => entries,
        }
    }
}

/// Corpus store reading FAQ records from a JSON file
///
/// The file is re-read on every fetch so edits are picked up by the next
/// refresh. Entries without `updated_at` are stamped with the file's
/// modification time, so they only count as changed after the file is edited.
#[derive(Debug, Clone)]
pub struct JsonFileCorpusStore {
    path: PathBuf,
}

impl JsonFileCorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn modified_at(&self) -> Option<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }

    async fn read_entries(&self) -> Result<Vec<FaqEntry>, DomainError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::storage(format!("Failed to read corpus {}: {}", self.path.display(), e))
        })?;

        let file: CorpusFile = serde_json::from_str(&content).map_err(|e| {
            DomainError::storage(format!("Invalid corpus {}: {}", self.path.display(), e))
        })?;

        let mut entries = file.into_entries();

        if let Some(modified) = self.modified_at().await {
            entries
                .iter_mut()
                .filter(|entry| entry.is_unstamped())
                .for_each(|entry| entry.updated_at = modified);
        }

        debug!(path = %self.path.display(), entries = entries.len(), "Corpus file read");

        Ok(entries)
    }
}

#[async_trait]
impl CorpusStore for JsonFileCorpusStore {
    async fn fetch_all(&self) -> Result<Vec<FaqEntry>, DomainError> {
        let entries = self.read_entries().await?;
        info!(path = %self.path.display(), entries = entries.len(), "Loaded FAQ corpus");
        Ok(entries)
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<FaqEntry>, DomainError> {
        let entries = self.read_entries().await?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.updated_at > since)
            .collect())
    }
}
