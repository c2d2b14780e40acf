//! Error types for the cache node
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Node Error Enum ==
/// Failures a client request can end in.
///
/// A cache miss is `NotFound`; an owner that cannot be reached is
/// `PeerUnavailable`. The two must never be conflated.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Key not found on the owning node
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Malformed body, missing field or bad query
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Owning peer refused the connection or did not answer in time
    #[error("Peer {peer} unavailable: {reason}")]
    PeerUnavailable { peer: String, reason: String },

    /// Any other failure while talking to the owning peer
    #[error("Peer {peer} request failed: {reason}")]
    PeerFailure { peer: String, reason: String },
}

impl NodeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NodeError::NotFound(_) => StatusCode::NOT_FOUND,
            NodeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            NodeError::PeerUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            NodeError::PeerFailure { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache node.
pub type Result<T> = std::result::Result<T, NodeError>;
