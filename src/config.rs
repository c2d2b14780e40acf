//! Configuration Module
//!
//! Node settings from command-line flags, falling back to environment
//! variables and then to defaults. Fixed for the lifetime of the process.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::cluster::{normalize_peer, parse_peer_list};

/// Cache node configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "shardcache", version)]
#[command(about = "Sharded in-memory cache node with TTL expiry, LRU eviction and peer replication", long_about = None)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long = "listen", env = "LISTEN_ADDR", default_value = "0.0.0.0:8083")]
    pub listen_addr: SocketAddr,

    /// Comma separated `host:port` list of the other cluster nodes
    #[arg(long, env = "PEERS", default_value = "")]
    pub peers: String,

    /// This node's identity on the ring, as peers address it
    /// (defaults to the listen address)
    #[arg(long = "self-id", env = "SELF_ID")]
    pub self_id: Option<String>,

    /// Maximum number of entries held by this node
    #[arg(long, env = "CACHE_CAPACITY", default_value_t = 1000)]
    pub capacity: usize,

    /// TTL applied to every write, in seconds
    #[arg(long = "write-ttl", env = "WRITE_TTL_SECS", default_value_t = 600)]
    pub write_ttl_secs: u64,

    /// Interval between expiry sweeps, in seconds
    #[arg(long = "sweep-interval", env = "SWEEP_INTERVAL_SECS", default_value_t = 5)]
    pub sweep_interval_secs: u64,

    /// Bound on forwarded and replicated calls, in seconds
    #[arg(long = "forward-timeout", env = "FORWARD_TIMEOUT_SECS", default_value_t = 5)]
    pub forward_timeout_secs: u64,

    /// Ring positions per node
    #[arg(long = "virtual-nodes", env = "VIRTUAL_NODES", default_value_t = 64)]
    pub virtual_nodes: usize,
}

impl Config {
    /// This node's ring identifier.
    pub fn node_id(&self) -> String {
        match &self.self_id {
            Some(id) if !id.trim().is_empty() => normalize_peer(id),
            _ => self.listen_addr.to_string(),
        }
    }

    /// Normalized peers, excluding blanks, duplicates and this node itself.
    pub fn peer_list(&self) -> Vec<String> {
        let self_id = self.node_id();
        parse_peer_list(&self.peers)
            .into_iter()
            .filter(|peer| *peer != self_id)
            .collect()
    }

    pub fn write_ttl(&self) -> Duration {
        Duration::from_secs(self.write_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8083)),
            peers: String::new(),
            self_id: None,
            capacity: 1000,
            write_ttl_secs: 600,
            sweep_interval_secs: 5,
            forward_timeout_secs: 5,
            virtual_nodes: 64,
        }
    }
}
