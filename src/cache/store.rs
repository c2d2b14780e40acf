//! Cache Store Module
//!
//! The unsynchronised core of a node's cache shard: a key map paired with an
//! LRU tracker, with TTL expiry checked lazily on read and eagerly on sweep.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Store ==
/// Bounded key-value storage with LRU eviction and TTL expiry.
///
/// Every key in `entries` is tracked by `lru` and vice versa; all mutating
/// methods keep the two in step and leave `entries.len() <= capacity`.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
    capacity: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity: capacity.max(1),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// An existing entry for `key` is dropped first so an overwrite never
    /// counts twice toward capacity. If the store is still full, exactly one
    /// entry (the least recently used) is evicted. The new entry becomes the
    /// most recently used.
    pub fn set(&mut self, key: String, value: String, ttl: Duration) {
        self.remove_entry(&key);

        if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the live value for `key`, marking it most recently used.
    ///
    /// An expired entry is removed on the spot and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.lru.touch(key);
        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Peek ==
    /// Returns the live entry for `key` without touching recency or stats.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    // == Cleanup Expired ==
    /// Removes every expired entry regardless of recency.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the key map and the recency order hold exactly the same keys.
    pub fn is_consistent(&self) -> bool {
        self.entries.len() == self.lru.len()
            && self.entries.keys().all(|key| self.lru.contains(key))
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }
}
