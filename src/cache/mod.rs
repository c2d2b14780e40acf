//! Cache Module
//!
//! The node-local cache shard: bounded storage with TTL expiration and LRU
//! eviction. Knows nothing about the cluster.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use shared::{SharedCache, SweepGuard};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
