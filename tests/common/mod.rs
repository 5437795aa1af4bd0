//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use chain_rpc_proxy::config::{ChainConfig, HealthCheckConfig};
use chain_rpc_proxy::{Application, Chain, ChainRegistry, EndpointConfig, ProxyConfig, Shutdown};

struct MockState {
    name: String,
    healthy: AtomicBool,
    slow_calls: AtomicBool,
    block: AtomicU64,
    probes: AtomicU32,
    calls: AtomicU32,
}

/// An upstream JSON-RPC node on an ephemeral port.
///
/// `eth_blockNumber` answers with the configured block; every other call
/// answers with `{"result": "<name>"}` so tests can tell upstreams apart.
#[derive(Clone)]
pub struct MockUpstream {
    pub url: String,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start(name: &str) -> Self {
        let state = Arc::new(MockState {
            name: name.to_string(),
            healthy: AtomicBool::new(true),
            slow_calls: AtomicBool::new(false),
            block: AtomicU64::new(0x10),
            probes: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/", post(handle))
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{addr}/"),
            state,
        }
    }

    /// Unhealthy upstreams answer every request with 503.
    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Delay non-probe calls long enough to trip any forward timeout.
    pub fn set_slow_calls(&self, slow: bool) {
        self.state.slow_calls.store(slow, Ordering::SeqCst);
    }

    pub fn set_block(&self, block: u64) {
        self.state.block.store(block, Ordering::SeqCst);
    }

    pub fn probes(&self) -> u32 {
        self.state.probes.load(Ordering::SeqCst)
    }

    /// Non-probe calls received.
    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn endpoint(&self, weight: u32) -> EndpointConfig {
        EndpointConfig::new(self.state.name.clone(), self.url.clone()).with_weight(weight)
    }
}

async fn handle(State(state): State<Arc<MockState>>, Json(call): Json<Value>) -> Response {
    let id = call.get("id").cloned().unwrap_or(Value::Null);
    let is_probe = call.get("method").and_then(Value::as_str) == Some("eth_blockNumber");

    if is_probe {
        state.probes.fetch_add(1, Ordering::SeqCst);
    } else {
        state.calls.fetch_add(1, Ordering::SeqCst);
    }

    if !state.healthy.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response();
    }

    if is_probe {
        let block = state.block.load(Ordering::SeqCst);
        return Json(json!({"jsonrpc": "2.0", "id": id, "result": format!("{block:#x}")}))
            .into_response();
    }

    if state.slow_calls.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    Json(json!({"jsonrpc": "2.0", "id": id, "result": state.name})).into_response()
}

/// Fast probing so state changes show up within a second.
pub fn fast_health_config() -> HealthCheckConfig {
    HealthCheckConfig {
        interval_ms: 100,
        timeout_ms: 500,
        retries: 1,
        retry_backoff_ms: 10,
        unhealthy_threshold: 3,
    }
}

/// Config with ephemeral ports, admin enabled, and the given chains.
pub fn test_config(chains: Vec<ChainConfig>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.admin.enabled = true;
    config.admin.bind_address = "127.0.0.1:0".into();
    config.admin.api_key = "test-key".into();
    config.health_check = fast_health_config();
    config.proxy.timeout_ms = 300;
    config.chains = chains;
    config
}

pub fn chain(name: &str, chain_id: u64, endpoints: Vec<EndpointConfig>) -> ChainConfig {
    ChainConfig::new(Chain::new(chain_id, name), endpoints)
}

/// A running proxy.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub registry: Arc<ChainRegistry>,
    pub shutdown: Arc<Shutdown>,
    pub task: tokio::task::JoinHandle<()>,
    pub client: reqwest::Client,
}

impl TestProxy {
    pub async fn start(config: ProxyConfig) -> Self {
        Self::start_with_path(config, None).await
    }

    /// Start with a config file path so file edits hot-reload.
    pub async fn start_with_path(config: ProxyConfig, path: Option<PathBuf>) -> Self {
        let app = Application::bootstrap(config, path).await.unwrap();
        let addr = app.local_addr().unwrap();
        let admin_addr = app.admin_addr().unwrap();
        let registry = app.registry();
        let shutdown = app.shutdown();
        let task = tokio::spawn(async move {
            app.run().await.unwrap();
        });

        Self {
            addr,
            admin_addr,
            registry,
            shutdown,
            task,
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }

    /// POST a JSON-RPC call and return the parsed body.
    pub async fn rpc(&self, path: &str, method: &str) -> Value {
        let res = self
            .client
            .post(self.url(path))
            .json(&json!({"jsonrpc": "2.0", "method": method, "params": [], "id": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        res.json().await.unwrap()
    }

    /// Whether endpoint `endpoint` of `chain` is currently selectable.
    pub fn is_healthy(&self, chain: &str, endpoint: &str) -> bool {
        self.registry
            .healthy_endpoints(chain)
            .iter()
            .any(|e| e.name() == endpoint)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("proxy did not shut down")
            .unwrap();
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
