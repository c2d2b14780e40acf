//! Cache Statistics Module
//!
//! Counters describing how the local cache shard is being used.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Lookups that returned a live value
    pub hits: u64,
    /// Lookups for absent or expired keys
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed (lazy or swept)
    pub expirations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
