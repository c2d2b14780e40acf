//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries, so keys
//! that are never read again still get reclaimed.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The task loops forever; abort the returned handle (or drop the
/// [`SweepGuard`](crate::cache::SweepGuard) that owns it) to stop it.
///
/// # Example
/// ```ignore
/// let cache = SharedCache::new(1000);
/// let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(5));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting TTL sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
