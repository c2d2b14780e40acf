//! Shardcache - a sharded, replicated in-memory cache node
//!
//! Every node holds a bounded cache with TTL expiry and LRU eviction. A
//! consistent hash ring, built from the node itself plus a static peer list,
//! decides which node owns each key: owned keys are served locally and their
//! writes replicated to peers in the background, everything else is
//! forwarded to the owner.

pub mod api;
pub mod cache;
pub mod cluster;
pub mod config;
pub mod error;
pub mod models;
pub mod ring;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cluster::CacheNode;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
