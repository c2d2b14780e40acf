//! Shared Cache Handle
//!
//! Lock discipline around [`CacheStore`] for concurrent request handlers and
//! the background sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::cache::{CacheStats, CacheStore};
use crate::tasks::spawn_cleanup_task;

// == Shared Cache ==
/// Cloneable handle to one node's cache shard.
///
/// Read-only queries (`stats`, `len`) share the lock. Lookups take it
/// exclusively because a hit reorders the recency list. No caller holds the
/// lock across an await on anything but the lock itself.
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<RwLock<CacheStore>>,
}

impl SharedCache {
    /// Wraps a fresh store of the given capacity without a sweeper.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheStore::new(capacity))),
        }
    }

    /// Creates the cache and starts its periodic expiry sweep.
    ///
    /// The sweep runs until the returned guard is stopped or dropped. Must be
    /// called from within a Tokio runtime.
    pub fn with_sweeper(capacity: usize, sweep_interval: Duration) -> (Self, SweepGuard) {
        let cache = Self::new(capacity);
        let handle = spawn_cleanup_task(cache.clone(), sweep_interval);
        (cache, SweepGuard { handle })
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.write().await.get(key)
    }

    pub async fn set(&self, key: String, value: String, ttl: Duration) {
        self.inner.write().await.set(key, value, ttl);
    }

    /// Removes every expired entry, returning how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.write().await.cleanup_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn capacity(&self) -> usize {
        self.inner.read().await.capacity()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Whether `key` holds an unexpired value, without touching recency or
    /// hit counters.
    pub async fn contains_live(&self, key: &str) -> bool {
        self.inner.read().await.peek(key).is_some()
    }
}

// == Sweep Guard ==
/// Owns the background expiry sweep; aborts it when stopped or dropped.
#[derive(Debug)]
pub struct SweepGuard {
    handle: JoinHandle<()>,
}

impl SweepGuard {
    /// Stops the sweep task.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
