//! Cache node: ownership decisions, local execution, forwarding and
//! replication.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::SharedCache;
use crate::cluster::peer::{is_replica_write, normalize_peer, PeerClient, PeerResponse};
use crate::config::Config;
use crate::error::Result;
use crate::models::SetRequest;
use crate::ring::{HashRing, Node};

/// A client request as received, kept intact so it can be relayed verbatim
/// to the owning node.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path plus query string, e.g. `/get?key=foo`
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Where a request was served.
#[derive(Debug)]
pub enum Routed<T> {
    /// This node owns the key.
    Local(T),
    /// Another node owns the key; this is its answer.
    Forwarded { owner: Node, response: PeerResponse },
}

/// Fire-and-forget replica deliveries launched by a local write, one per
/// peer. Dropping the handles detaches the tasks.
pub type ReplicaTasks = Vec<JoinHandle<()>>;

// == Cache Node ==
/// One member of the cache cluster.
///
/// Owns this node's cache shard and the ring built from its own id plus the
/// static peer list. Membership never changes after construction.
#[derive(Debug)]
pub struct CacheNode {
    self_id: String,
    peers: Vec<String>,
    cache: SharedCache,
    ring: HashRing,
    client: PeerClient,
    write_ttl: Duration,
}

impl CacheNode {
    /// Builds a node, registering itself on the ring before any peer.
    ///
    /// Peers are normalized; blanks, duplicates and this node's own id are
    /// skipped.
    pub fn new(
        self_id: &str,
        peers: &[String],
        cache: SharedCache,
        client: PeerClient,
        write_ttl: Duration,
        virtual_nodes: usize,
    ) -> Self {
        let self_id = normalize_peer(self_id);
        let mut ring = HashRing::new(virtual_nodes);
        ring.add_node(Node::from_peer(self_id.clone()));

        let mut unique: Vec<String> = Vec::new();
        for peer in peers.iter().map(|p| normalize_peer(p)) {
            if peer.is_empty() || peer == self_id || unique.contains(&peer) {
                continue;
            }
            ring.add_node(Node::from_peer(peer.clone()));
            unique.push(peer);
        }

        info!(
            node = %self_id,
            peers = ?unique,
            ring_positions = ring.point_count(),
            "Cache node initialized"
        );

        Self {
            self_id,
            peers: unique,
            cache,
            ring,
            client,
            write_ttl,
        }
    }

    /// Builds a node from configuration around an existing cache.
    pub fn from_config(config: &Config, cache: SharedCache) -> Self {
        Self::new(
            &config.node_id(),
            &config.peer_list(),
            cache,
            PeerClient::new(config.forward_timeout()),
            config.write_ttl(),
            config.virtual_nodes,
        )
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn write_ttl(&self) -> Duration {
        self.write_ttl
    }

    // == Ownership ==
    /// The node responsible for `key`.
    pub fn owner_of(&self, key: &str) -> &Node {
        // The constructor always registers this node, so the ring is never empty
        self.ring
            .get_node(key)
            .expect("hash ring must contain the local node")
    }

    pub fn is_local(&self, node: &Node) -> bool {
        node.address == self.self_id
    }

    // == Local Operations ==
    pub async fn store_local(&self, key: String, value: String) {
        self.cache.set(key, value, self.write_ttl).await;
    }

    pub async fn lookup_local(&self, key: &str) -> Option<String> {
        self.cache.get(key).await
    }

    // == Replication ==
    /// Launches one independent replica write per peer and returns without
    /// waiting. Failures are logged inside each task and never reported back.
    pub fn replicate(&self, key: &str, value: &str) -> ReplicaTasks {
        self.peers
            .iter()
            .map(|peer| {
                let client = self.client.clone();
                let peer = peer.clone();
                let key = key.to_string();
                let value = value.to_string();

                tokio::spawn(async move {
                    match client.replicate(&peer, &key, &value).await {
                        Ok(status) if status.is_success() => {
                            info!(%peer, %key, "Replication successful");
                        }
                        Ok(status) => {
                            warn!(%peer, %key, %status, "Replica write rejected");
                        }
                        Err(e) => {
                            warn!(%peer, %key, error = %e, "Replica write failed");
                        }
                    }
                })
            })
            .collect()
    }

    // == Forwarding ==
    /// Relays `request` to `owner` and waits for its answer.
    pub async fn forward(&self, owner: &Node, request: &InboundRequest) -> Result<PeerResponse> {
        self.client
            .forward(
                &owner.address,
                request.method.clone(),
                &request.path_and_query,
                &request.headers,
                request.body.clone(),
            )
            .await
            .inspect_err(|e| warn!(owner = %owner, error = %e, "Forwarding failed"))
    }

    // == Routed Operations ==
    /// Handles a parsed write.
    ///
    /// A replica write is stored here whoever owns the key and is never copied
    /// further. Otherwise, if this node owns the key the value is stored and
    /// copied to every peer in the background; if not, the original request
    /// goes to the owner. The marker is trusted only because it is set by
    /// cluster members; the API is not meant to face untrusted clients.
    pub async fn write(
        &self,
        request: SetRequest,
        inbound: &InboundRequest,
    ) -> Result<Routed<ReplicaTasks>> {
        let owner = self.owner_of(&request.key);
        let replica = is_replica_write(&inbound.headers);

        info!(
            key = %request.key,
            owner = %owner,
            node = %self.self_id,
            replica,
            "SET"
        );

        if !replica && !self.is_local(owner) {
            let owner = owner.clone();
            let response = self.forward(&owner, inbound).await?;
            return Ok(Routed::Forwarded { owner, response });
        }

        let SetRequest { key, value } = request;
        self.store_local(key.clone(), value.clone()).await;

        let tasks = if replica {
            Vec::new()
        } else {
            self.replicate(&key, &value)
        };

        Ok(Routed::Local(tasks))
    }

    /// Handles a read; `Local(None)` is a miss on this node, the owner.
    pub async fn read(&self, key: &str, inbound: &InboundRequest) -> Result<Routed<Option<String>>> {
        let owner = self.owner_of(key);

        info!(key = %key, owner = %owner, node = %self.self_id, "GET");

        if self.is_local(owner) {
            return Ok(Routed::Local(self.lookup_local(key).await));
        }

        let owner = owner.clone();
        let response = self.forward(&owner, inbound).await?;
        Ok(Routed::Forwarded { owner, response })
    }
}
