//! Engine metrics
//!
//! Counters go through the `metrics` facade. The library never installs a
//! recorder, so they are no-ops unless the host application installs one.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::domain::guard::ViolationKind;
use crate::domain::retrieval::AnswerSource;

/// Outcome of one semantic cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookupResult {
    Hit,
    Miss,
    /// Caching disabled by configuration
    Skipped,
}

impl CacheLookupResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Skipped => "skipped",
        }
    }
}

/// Record a completed answer
pub fn record_answer(source: AnswerSource, degraded: bool, duration: Duration) {
    let labels = [
        ("source", source.as_str().to_string()),
        ("degraded", degraded.to_string()),
    ];

    counter!("faq_answers_total", &labels).increment(1);
    histogram!("faq_answer_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn record_cache_lookup(result: CacheLookupResult) {
    counter!("faq_cache_lookups_total", "result" => result.as_str()).increment(1);
}

pub fn record_guard_violation(kind: ViolationKind) {
    counter!("faq_guard_violations_total", "kind" => kind.as_str()).increment(1);
}

/// Record a match served by keyword overlap after the vector store failed
pub fn record_degraded_match() {
    counter!("faq_degraded_matches_total").increment(1);
}
