//! Background sweep of expired semantic cache entries

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::domain::semantic_cache::SemanticCache;

/// Spawn a task that purges expired entries every `interval`
///
/// The task runs until the returned handle is aborted.
pub fn spawn_cache_cleanup(cache: Arc<dyn SemanticCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match cache.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Expired cache entries purged"),
                Err(e) => warn!(error = %e, "Cache cleanup failed"),
            }
        }
    })
}
