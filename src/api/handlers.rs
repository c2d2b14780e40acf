//! API Handlers
//!
//! HTTP request handlers for each cache node endpoint. Parsing and validation
//! happen here; ownership and replication decisions belong to [`CacheNode`].

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::cluster::{CacheNode, InboundRequest, PeerResponse, Routed};
use crate::error::{NodeError, Result};
use crate::models::{GetQuery, HealthResponse, SetRequest, SetResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<CacheNode>,
}

impl AppState {
    pub fn new(node: CacheNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }
}

/// Handler for POST /set
///
/// The body is taken as raw bytes so a write owned by another node can be
/// relayed exactly as it arrived.
pub async fn set_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let req: SetRequest = serde_json::from_slice(&body)
        .map_err(|e| NodeError::InvalidRequest(format!("Malformed body: {e}")))?;

    if let Some(error_msg) = req.validate() {
        return Err(NodeError::InvalidRequest(error_msg));
    }

    let key = req.key.clone();
    let inbound = InboundRequest {
        method,
        path_and_query: path_and_query(&uri, "/set"),
        headers,
        body,
    };

    match state.node.write(req, &inbound).await? {
        Routed::Local(_replicas) => {
            Ok(Json(SetResponse::new(key, state.node.self_id())).into_response())
        }
        Routed::Forwarded { response, .. } => Ok(relay(response)),
    }
}

/// Handler for GET /get?key=<key>
///
/// Answers with the raw value as plain text when this node owns the key.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<GetQuery>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    let key = query.require_key().map_err(NodeError::InvalidRequest)?;

    let inbound = InboundRequest {
        method,
        path_and_query: path_and_query(&uri, "/get"),
        headers,
        body: Bytes::new(),
    };

    match state.node.read(&key, &inbound).await? {
        Routed::Local(Some(value)) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            value,
        )
            .into_response()),
        Routed::Local(None) => Err(NodeError::NotFound(key)),
        Routed::Forwarded { response, .. } => Ok(relay(response)),
    }
}

/// Handler for GET /stats
///
/// Statistics for this node's shard only.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let node = &state.node;
    let stats = node.cache().stats().await;
    let capacity = node.cache().capacity().await;

    Json(StatsResponse::new(
        node.self_id(),
        node.ring().len(),
        node.peers().to_vec(),
        capacity,
        &stats,
    ))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.node.self_id()))
}

/// Rebuilds the owner's answer as our own response: same status, headers
/// and body.
fn relay(peer: PeerResponse) -> Response {
    let mut response = Response::new(Body::from(peer.body));
    *response.status_mut() = peer.status;
    *response.headers_mut() = peer.headers;
    response
}

fn path_and_query(uri: &Uri, fallback: &str) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| fallback.to_string())
}
