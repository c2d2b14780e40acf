//! Peer addressing and the HTTP client used to talk to other nodes.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use tracing::debug;

use crate::error::{NodeError, Result};
use crate::models::SetRequest;

/// Header marking a write as a replica of one already stored elsewhere.
pub const REPLICATION_HEADER: &str = "x-replication-request";

/// Default bound on every forwarded or replicated call.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

// == Addressing ==

/// Canonical form of a peer identifier: trimmed, without trailing slashes.
pub fn normalize_peer(peer: &str) -> String {
    peer.trim().trim_end_matches('/').to_string()
}

/// Base URL for a peer, defaulting to plain HTTP when no scheme is given.
pub fn peer_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

/// Splits a comma-separated peer list, dropping blanks and duplicates while
/// keeping first-seen order.
pub fn parse_peer_list(raw: &str) -> Vec<String> {
    let mut peers: Vec<String> = Vec::new();
    for peer in raw.split(',').map(normalize_peer) {
        if !peer.is_empty() && !peers.contains(&peer) {
            peers.push(peer);
        }
    }
    peers
}

/// Whether the inbound headers carry the replica marker.
pub fn is_replica_write(headers: &HeaderMap) -> bool {
    headers
        .get(REPLICATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

// == Peer Response ==
/// What an owning peer answered, ready to be relayed unchanged.
#[derive(Debug, Clone)]
pub struct PeerResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

// == Peer Client ==
/// Outbound HTTP to other cache nodes.
///
/// One pooled client is shared by all requests; every call is bounded by
/// `timeout` and attempted exactly once.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Re-issues a client request against `address` and collects the reply.
    pub async fn forward(
        &self,
        address: &str,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<PeerResponse> {
        let url = format!("{}{}", peer_url(address), path_and_query);
        let mut outbound = headers.clone();
        strip_hop_headers(&mut outbound);

        debug!(%method, %url, "Forwarding request to owner");

        let response = self
            .http
            .request(method, url)
            .headers(outbound)
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify(address, e))?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_headers(&mut headers);
        let body = response.bytes().await.map_err(|e| classify(address, e))?;

        Ok(PeerResponse {
            status,
            headers,
            body,
        })
    }

    /// Sends a replica write of `key` to `address`, marked so the receiver
    /// does not replicate it again.
    pub async fn replicate(&self, address: &str, key: &str, value: &str) -> Result<StatusCode> {
        let url = format!("{}/set", peer_url(address));
        let payload = SetRequest {
            key: key.to_string(),
            value: value.to_string(),
        };

        let response = self
            .http
            .post(url)
            .header(REPLICATION_HEADER, HeaderValue::from_static("true"))
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify(address, e))?;

        Ok(response.status())
    }
}

impl Default for PeerClient {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_TIMEOUT)
    }
}

/// Drops headers that describe one hop rather than the message; the client
/// and the server recompute them.
fn strip_hop_headers(headers: &mut HeaderMap) {
    for name in [
        header::HOST,
        header::CONTENT_LENGTH,
        header::CONNECTION,
        header::TRANSFER_ENCODING,
    ] {
        headers.remove(name);
    }
}

/// Connection failures and timeouts mean the shard is unreachable; anything
/// else is a failed exchange with a reachable peer.
fn classify(peer: &str, err: reqwest::Error) -> NodeError {
    if err.is_connect() || err.is_timeout() {
        NodeError::PeerUnavailable {
            peer: peer.to_string(),
            reason: err.to_string(),
        }
    } else {
        NodeError::PeerFailure {
            peer: peer.to_string(),
            reason: err.to_string(),
        }
    }
}
