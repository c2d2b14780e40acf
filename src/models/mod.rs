//! Request and Response models for the cache node API
//!
//! DTOs used for serializing/deserializing HTTP bodies, both from clients
//! and between nodes.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{GetQuery, SetRequest};
pub use responses::{HealthResponse, SetResponse, StatsResponse};
