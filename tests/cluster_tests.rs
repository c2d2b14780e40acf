//! Multi-node Integration Tests
//!
//! Real nodes on ephemeral localhost ports talking over HTTP: forwarding to
//! the owner, replication with the loop-prevention marker, and failure
//! reporting for unreachable owners.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use shardcache::{
    cache::SharedCache,
    cluster::{PeerClient, REPLICATION_HEADER},
    create_router, AppState, CacheNode,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

// == Helpers ==

struct TestNode {
    addr: String,
    state: AppState,
}

impl TestNode {
    fn owns(&self, key: &str) -> bool {
        self.state.node.is_local(self.state.node.owner_of(key))
    }

    async fn holds(&self, key: &str) -> bool {
        self.state.node.cache().contains_live(key).await
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

fn serve(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

fn start_node(listener: TcpListener, addr: &str, peers: &[String]) -> TestNode {
    start_node_with_timeout(listener, addr, peers, Duration::from_secs(2))
}

fn start_node_with_timeout(
    listener: TcpListener,
    addr: &str,
    peers: &[String],
    peer_timeout: Duration,
) -> TestNode {
    let node = CacheNode::new(
        addr,
        peers,
        SharedCache::new(100),
        PeerClient::new(peer_timeout),
        Duration::from_secs(600),
        16,
    );
    let state = AppState::new(node);
    serve(listener, create_router(state.clone()));
    TestNode {
        addr: addr.to_string(),
        state,
    }
}

/// Two nodes that know about each other.
async fn start_pair() -> (TestNode, TestNode) {
    let (listener_a, addr_a) = bind().await;
    let (listener_b, addr_b) = bind().await;
    let a = start_node(listener_a, &addr_a, &[addr_b.clone()]);
    let b = start_node(listener_b, &addr_b, &[addr_a.clone()]);
    (a, b)
}

/// A port nobody is listening on.
fn dead_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

/// Accepts connections and never answers on them.
async fn start_silent_peer() -> String {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    addr
}

fn key_where(pred: impl Fn(&str) -> bool) -> String {
    (0..10_000)
        .map(|i| format!("key{i}"))
        .find(|k| pred(k))
        .expect("some key satisfies the ownership predicate")
}

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
}

type Recorder = Arc<Mutex<Vec<Recorded>>>;

async fn record(
    State(log): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    log.lock().await.push(Recorded {
        method,
        uri: uri.to_string(),
        headers,
        body,
    });
    (StatusCode::CREATED, [("x-served-by", "recorder")], "recorded")
}

/// A stand-in peer that logs every request it receives.
async fn start_recorder() -> (String, Recorder) {
    let (listener, addr) = bind().await;
    let log: Recorder = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/set", post(record))
        .route("/get", get(record))
        .with_state(log.clone());
    serve(listener, app);
    (addr, log)
}

async fn wait_for_len(log: &Recorder, expected: usize) {
    for _ in 0..100 {
        if log.lock().await.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn post_set(
    client: &reqwest::Client,
    addr: &str,
    key: &str,
    value: &str,
) -> reqwest::Response {
    client
        .post(format!("http://{addr}/set"))
        .json(&serde_json::json!({ "key": key, "value": value }))
        .send()
        .await
        .unwrap()
}

// == Forwarding and Replication Between Real Nodes ==

#[tokio::test]
async fn test_write_forwarded_to_owner_then_replicated_back() {
    let (a, b) = start_pair().await;
    let client = reqwest::Client::new();
    let key = key_where(|k| b.owns(k));
    assert!(!a.owns(&key), "both nodes agree on the owner");

    let response = post_set(&client, &a.addr, &key, "bar").await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["node"], b.addr.as_str(), "response relayed from the owner");
    assert!(b.holds(&key).await, "owner stores the key");

    // B replicates to A with the marker; A stores without re-replicating
    for _ in 0..100 {
        if a.holds(&key).await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(a.holds(&key).await, "replica should reach the non-owner");
}

#[tokio::test]
async fn test_read_forwarded_to_owner() {
    let (a, b) = start_pair().await;
    let client = reqwest::Client::new();
    let key = key_where(|k| b.owns(k));

    let response = post_set(&client, &b.addr, &key, "value from b").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .get(format!("http://{}/get?key={key}", a.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "value from b");

    // A miss on the owner is relayed as the owner's 404
    let missing = key_where(|k| b.owns(k) && k != key);
    let response = client
        .get(format!("http://{}/get?key={missing}", a.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

// == Replication Fan-out ==

#[tokio::test]
async fn test_local_write_replicates_once_per_peer_with_marker() {
    let (peer_1, log_1) = start_recorder().await;
    let (peer_2, log_2) = start_recorder().await;
    let (listener, addr) = bind().await;
    let node = start_node(listener, &addr, &[peer_1, peer_2, addr.clone()]);
    let client = reqwest::Client::new();
    let key = key_where(|k| node.owns(k));

    let response = post_set(&client, &node.addr, &key, "v1").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(node.holds(&key).await);

    wait_for_len(&log_1, 1).await;
    wait_for_len(&log_2, 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    for log in [&log_1, &log_2] {
        let calls = log.lock().await;
        assert_eq!(calls.len(), 1, "exactly one replica call per peer");
        let call = &calls[0];
        assert_eq!(call.method, Method::POST);
        assert_eq!(call.uri, "/set");
        assert_eq!(call.headers[REPLICATION_HEADER], "true");
        let body: serde_json::Value = serde_json::from_slice(&call.body).unwrap();
        assert_eq!(body["key"], key.as_str());
        assert_eq!(body["value"], "v1");
    }
}

#[tokio::test]
async fn test_replica_write_is_not_replicated_again() {
    let (peer, log) = start_recorder().await;
    let (listener, addr) = bind().await;
    let node = start_node(listener, &addr, &[peer]);
    let client = reqwest::Client::new();
    let key = key_where(|k| node.owns(k));

    let response = client
        .post(format!("http://{}/set", node.addr))
        .header(REPLICATION_HEADER, "true")
        .json(&serde_json::json!({ "key": key, "value": "replica" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(node.holds(&key).await);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(log.lock().await.is_empty(), "replica writes must not fan out");
}

#[tokio::test]
async fn test_unreachable_peer_does_not_block_other_replicas() {
    let (peer, log) = start_recorder().await;
    let dead = dead_address();
    let (listener, addr) = bind().await;
    let node = start_node(listener, &addr, &[dead, peer]);
    let client = reqwest::Client::new();
    let key = key_where(|k| node.owns(k));

    let response = post_set(&client, &node.addr, &key, "v").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    wait_for_len(&log, 1).await;
    assert_eq!(log.lock().await.len(), 1);
}

// == Verbatim Relay ==

#[tokio::test]
async fn test_forward_relays_request_and_response_verbatim() {
    let (peer, log) = start_recorder().await;
    let (listener, addr) = bind().await;
    let node = start_node(listener, &addr, &[peer.clone()]);
    let client = reqwest::Client::new();
    let key = key_where(|k| !node.owns(k));
    let body = format!(r#"{{"key":"{key}","value":"v"}}"#);

    let response = client
        .post(format!("http://{}/set", node.addr))
        .header("content-type", "application/json")
        .header("x-trace-id", "abc123")
        .body(body.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    assert_eq!(response.headers()["x-served-by"], "recorder");
    assert_eq!(response.text().await.unwrap(), "recorded");
    assert!(!node.holds(&key).await, "non-owner must not store the key");

    let calls = log.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(calls[0].uri, "/set");
    assert_eq!(calls[0].headers["x-trace-id"], "abc123");
    assert!(calls[0].headers.get(REPLICATION_HEADER).is_none());
    assert_eq!(calls[0].body, Bytes::from(body));
}

// == Owner Unreachable ==

#[tokio::test]
async fn test_unreachable_owner_is_service_unavailable_not_not_found() {
    let dead = dead_address();
    let (listener, addr) = bind().await;
    let node = start_node(listener, &addr, &[dead]);
    let client = reqwest::Client::new();
    let key = key_where(|k| !node.owns(k));

    let response = client
        .get(format!("http://{}/get?key={key}", node.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("unavailable"));

    let response = post_set(&client, &node.addr, &key, "v").await;
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert!(node.state.node.cache().is_empty().await);
}

#[tokio::test]
async fn test_owner_that_never_answers_times_out_as_unavailable() {
    let silent = start_silent_peer().await;
    let (listener, addr) = bind().await;
    let node = start_node_with_timeout(listener, &addr, &[silent], Duration::from_millis(500));
    let client = reqwest::Client::new();
    let key = key_where(|k| !node.owns(k));

    let started = std::time::Instant::now();
    let response = client
        .get(format!("http://{}/get?key={key}", node.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert!(started.elapsed() >= Duration::from_millis(500));
    let json: serde_json::Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("unavailable"));

    let response = post_set(&client, &node.addr, &key, "v").await;
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert!(node.state.node.cache().is_empty().await);
}

#[tokio::test]
async fn test_ownership_is_identical_on_every_node() {
    let (a, b) = start_pair().await;

    for i in 0..200 {
        let key = format!("key{i}");
        assert_eq!(a.state.node.owner_of(&key), b.state.node.owner_of(&key));
        assert_ne!(a.owns(&key), b.owns(&key));
    }
}
