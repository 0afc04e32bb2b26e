//! Observability infrastructure - engine metrics

mod metrics;

pub use metrics::{
    record_answer, record_cache_lookup, record_degraded_match, record_guard_violation,
    CacheLookupResult,
};
