//! Cached answers and cache statistics

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::faq::FaqId;

/// A previously computed answer keyed by its query embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    query_embedding: Vec<f32>,
    normalized_query_text: String,
    answer_text: String,
    #[serde(default)]
    source_faq_ids: Vec<FaqId>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    last_hit_at: Option<DateTime<Utc>>,
    #[serde(default)]
    hit_count: u64,
}

impl CacheEntry {
    pub fn new(
        query_embedding: Vec<f32>,
        normalized_query_text: impl Into<String>,
        answer_text: impl Into<String>,
        source_faq_ids: Vec<FaqId>,
    ) -> Self {
        Self {
            query_embedding,
            normalized_query_text: normalized_query_text.into(),
            answer_text: answer_text.into(),
            source_faq_ids,
            created_at: Utc::now(),
            last_hit_at: None,
            hit_count: 0,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Overwrite hit bookkeeping, used when materialising a stored entry
    pub fn with_hits(mut self, hit_count: u64, last_hit_at: Option<DateTime<Utc>>) -> Self {
        self.hit_count = hit_count;
        self.last_hit_at = last_hit_at;
        self
    }

    pub fn query_embedding(&self) -> &[f32] {
        &self.query_embedding
    }

    pub fn normalized_query_text(&self) -> &str {
        &self.normalized_query_text
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn source_faq_ids(&self) -> &[FaqId] {
        &self.source_faq_ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_hit_at(&self) -> Option<DateTime<Utc>> {
        self.last_hit_at
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Expiry is measured from creation; hits never extend it
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at >= ttl
    }
}

/// A lookup hit with the similarity that produced it
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub entry: CacheEntry,
    pub similarity: f32,
}

impl CacheHit {
    pub fn new(entry: CacheEntry, similarity: f32) -> Self {
        Self { entry, similarity }
    }
}

/// Statistics for the semantic cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticCacheStats {
    pub total_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub avg_hit_similarity: f32,
}

impl SemanticCacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits as f32 / total as f32
    }
}
