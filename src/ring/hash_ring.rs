//! Consistent hash ring.
//!
//! Each node is hashed onto a `u32` circle at several virtual positions. A key
//! belongs to the node holding the first position at or after the key's own
//! hash, wrapping past `u32::MAX` back to the smallest position.

use std::collections::BTreeMap;

use crate::ring::Node;

/// Default number of positions each node occupies on the ring.
pub const DEFAULT_VIRTUAL_NODES: usize = 64;

/// Maps keys to nodes by consistent hashing.
///
/// Built once at startup; lookups are pure functions of the key and the set of
/// registered nodes, independent of the order nodes were added in.
#[derive(Debug, Clone)]
pub struct HashRing {
    virtual_nodes: usize,
    /// ring position -> owning node
    points: BTreeMap<u32, Node>,
    /// node id -> node, every registered member
    members: BTreeMap<String, Node>,
}

impl HashRing {
    /// Creates an empty ring placing each node at `virtual_nodes` positions
    /// (at least one).
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            virtual_nodes: virtual_nodes.max(1),
            points: BTreeMap::new(),
            members: BTreeMap::new(),
        }
    }

    /// Registers `node` at all of its positions.
    ///
    /// Adding the same node twice is a no-op. When two different nodes land on
    /// the same position the one with the smaller id keeps it, so the final
    /// ring does not depend on insertion order.
    pub fn add_node(&mut self, node: Node) {
        for replica in 0..self.virtual_nodes {
            let point = Self::point_hash(&node.id, replica);
            match self.points.get(&point) {
                Some(existing) if existing.id <= node.id => {}
                _ => {
                    self.points.insert(point, node.clone());
                }
            }
        }
        self.members.insert(node.id.clone(), node);
    }

    /// Returns the node owning `key`, or `None` if the ring is empty.
    pub fn get_node(&self, key: &str) -> Option<&Node> {
        let hash = Self::key_hash(key);
        self.points
            .range(hash..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, node)| node)
    }

    /// Position of `key` on the ring.
    pub fn key_hash(key: &str) -> u32 {
        hash_bytes(key.as_bytes())
    }

    fn point_hash(node_id: &str, replica: usize) -> u32 {
        hash_bytes(format!("{node_id}#{replica}").as_bytes())
    }

    /// Number of distinct registered nodes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Registered nodes ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.members.values()
    }

    /// Total positions occupied on the ring.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUAL_NODES)
    }
}

/// First four bytes of the BLAKE3 digest, big-endian. Stable across
/// processes and platforms.
fn hash_bytes(bytes: &[u8]) -> u32 {
    let digest = blake3::hash(bytes);
    let b = digest.as_bytes();
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}
