//! API Module
//!
//! HTTP handlers and routing for the cache node.
//!
//! # Endpoints
//! - `POST /set` - Store a key-value pair (JSON body `{key, value}`)
//! - `GET /get?key=<key>` - Retrieve a value
//! - `GET /stats` - Statistics for this node
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
