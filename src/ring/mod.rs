//! Hash Ring Module
//!
//! Consistent hashing that maps every key to exactly one owning node.

mod hash_ring;
mod node;

pub use hash_ring::{HashRing, DEFAULT_VIRTUAL_NODES};
pub use node::Node;
