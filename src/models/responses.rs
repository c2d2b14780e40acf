//! Response DTOs for the cache node API

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for a locally stored write (POST /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub message: String,
    pub key: String,
    /// Node that stored the key
    pub node: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, node: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            node: node.into(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
///
/// Describes this node only; stats are never aggregated across the cluster.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub node: String,
    pub ring_nodes: usize,
    pub peers: Vec<String>,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(
        node: impl Into<String>,
        ring_nodes: usize,
        peers: Vec<String>,
        capacity: usize,
        stats: &CacheStats,
    ) -> Self {
        Self {
            node: node.into(),
            ring_nodes,
            peers,
            capacity,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(node: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            node: node.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
