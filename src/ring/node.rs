//! Cluster node identity.

use std::fmt;

use serde::Serialize;

/// A cluster member as seen by the ring.
///
/// `id` is what gets hashed onto the ring; `address` is where requests for
/// the node's keys are sent. Both are normally the node's `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Node {
    pub id: String,
    pub address: String,
}

impl Node {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }

    /// A node whose identifier doubles as its network address.
    pub fn from_peer(peer: impl Into<String>) -> Self {
        let peer = peer.into();
        Self {
            id: peer.clone(),
            address: peer,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id == self.address {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}@{}", self.id, self.address)
        }
    }
}
