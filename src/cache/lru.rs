//! LRU Tracker Module
//!
//! Recency ordering for capacity eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch stamps the key with a fresh, strictly increasing tick. The
/// `order` map sorts keys by tick, so its last entry is the most recently
/// used key and its first entry is the eviction candidate. `ticks` is the
/// reverse index that lets a key be moved or removed without scanning.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// tick -> key, oldest first
    order: BTreeMap<u64, String>,
    /// key -> tick currently held in `order`
    ticks: HashMap<String, u64>,
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unseen.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(old) => {
                if let Some(owned) = self.order.remove(old) {
                    self.order.insert(tick, owned);
                }
                *old = tick;
            }
            None => {
                self.order.insert(tick, key.to_string());
                self.ticks.insert(key.to_string(), tick);
            }
        }
    }

    // == Remove ==
    /// Removes a key from the tracker. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }

    /// Keys from least to most recently used.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &String> {
        self.order.values()
    }
}
