//! Cluster Module
//!
//! Request routing across nodes: which node owns a key, serving it locally,
//! forwarding to the owner, and replicating local writes to peers.

mod node;
mod peer;

pub use node::{CacheNode, InboundRequest, ReplicaTasks, Routed};
pub use peer::{
    is_replica_write, normalize_peer, parse_peer_list, peer_url, PeerClient, PeerResponse,
    DEFAULT_PEER_TIMEOUT, REPLICATION_HEADER,
};
