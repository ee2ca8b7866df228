//! Compaction Task
//!
//! Background task that periodically sweeps expired entries out of the cache
//! and brings it back under its size limit.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheService;

/// Spawns a background task that compacts the cache every `interval_secs`.
///
/// Returns the task's JoinHandle so graceful shutdown can abort it.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheService::new(&CacheSettings::default()));
/// let handle = spawn_compaction_task(cache.clone(), 3600);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_compaction_task(cache: Arc<CacheService>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache compaction task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.compact().await;
            if removed > 0 {
                info!("Cache compaction: removed {} entries", removed);
            } else {
                debug!("Cache compaction: nothing to remove");
            }
        }
    })
}
