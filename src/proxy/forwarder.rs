//! Weighted failover forwarder.
//!
//! # Responsibilities
//! - Reject bodies that are not JSON before touching any upstream
//! - Try healthy endpoints in weight order, one at a time
//! - Fall through on transport errors only; any HTTP answer is final
//!
//! # Design Decisions
//! - Never writes endpoint health; a failed forward waits for the prober
//! - Dropping the returned future aborts the attempt in flight
//! - Attempts share one overall budget, so a set of hung upstreams ends in
//!   a JSON-RPC error before the inbound request deadline

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::load_balancer::LoadBalancer;
use crate::observability::metrics;
use crate::proxy::jsonrpc::{describe_call, JsonRpcErrorResponse};
use crate::registry::ChainRegistry;

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForwardError {
    #[error("request body is not valid JSON: {0}")]
    Parse(String),

    #[error("no healthy endpoints for chain '{chain}'")]
    NoHealthyEndpoints { chain: String },

    #[error("all {attempts} endpoints of chain '{chain}' failed: {last_error}")]
    AllEndpointsFailed {
        chain: String,
        attempts: usize,
        last_error: String,
    },
}

impl ForwardError {
    pub fn to_jsonrpc(&self) -> JsonRpcErrorResponse {
        match self {
            Self::Parse(_) => JsonRpcErrorResponse::parse_error(),
            Self::NoHealthyEndpoints { chain } => JsonRpcErrorResponse::no_healthy_endpoints(chain),
            Self::AllEndpointsFailed { last_error, .. } => {
                JsonRpcErrorResponse::all_endpoints_failed(last_error)
            }
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::NoHealthyEndpoints { .. } => "no_healthy_endpoints",
            Self::AllEndpointsFailed { .. } => "exhausted",
        }
    }
}

/// Per-attempt timeout plus the budget shared by every attempt of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardTimeouts {
    pub attempt: Duration,
    pub total: Duration,
}

/// `last_error` when the budget runs out before any attempt reports one.
pub const DEADLINE_EXCEEDED: &str = "request deadline exceeded";

/// The first upstream answer, body not yet read.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub endpoint: String,
    pub response: reqwest::Response,
}

impl UpstreamResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }
}

pub struct Forwarder {
    registry: Arc<ChainRegistry>,
    client: reqwest::Client,
    balancer: Arc<dyn LoadBalancer>,
}

impl Forwarder {
    pub fn new(
        registry: Arc<ChainRegistry>,
        client: reqwest::Client,
        balancer: Arc<dyn LoadBalancer>,
    ) -> Self {
        Self {
            registry,
            client,
            balancer,
        }
    }

    /// Relay one call for `chain`.
    pub async fn forward(
        &self,
        chain: &str,
        body: Bytes,
        headers: &HeaderMap,
        timeouts: ForwardTimeouts,
    ) -> Result<UpstreamResponse, ForwardError> {
        let started = Instant::now();
        let result = self.try_forward(chain, body, headers, timeouts).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::record_forward(chain, outcome, started.elapsed());
        result
    }

    async fn try_forward(
        &self,
        chain: &str,
        body: Bytes,
        headers: &HeaderMap,
        timeouts: ForwardTimeouts,
    ) -> Result<UpstreamResponse, ForwardError> {
        let deadline = Instant::now() + timeouts.total;
        let call: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| ForwardError::Parse(e.to_string()))?;
        let method = describe_call(&call);

        let candidates = self.registry.healthy_endpoints(chain);
        if candidates.is_empty() {
            tracing::warn!(chain = %chain, method = %method, "No healthy RPC endpoints available");
            return Err(ForwardError::NoHealthyEndpoints {
                chain: chain.to_string(),
            });
        }

        let ordered = self.balancer.order(&candidates);
        let upstream_headers = upstream_headers(headers);
        let total = ordered.len();
        let mut last_error = String::new();
        let mut attempts = 0;

        for endpoint in &ordered {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(
                    chain = %chain,
                    method = %method,
                    attempts,
                    total,
                    "Forward budget exhausted"
                );
                if last_error.is_empty() {
                    last_error = DEADLINE_EXCEEDED.to_string();
                }
                break;
            }
            attempts += 1;
            let attempt = attempts;
            let sent = self
                .client
                .post(endpoint.url())
                .headers(upstream_headers.clone())
                .timeout(timeouts.attempt.min(remaining))
                .body(body.clone())
                .send()
                .await;

            match sent {
                Ok(response) => {
                    metrics::record_forward_attempt(chain, endpoint.name(), true);
                    tracing::debug!(
                        chain = %chain,
                        endpoint = %endpoint.name(),
                        weight = endpoint.weight(),
                        method = %method,
                        attempt,
                        status = response.status().as_u16(),
                        "Request forwarded"
                    );
                    return Ok(UpstreamResponse {
                        endpoint: endpoint.name().to_string(),
                        response,
                    });
                }
                Err(e) => {
                    metrics::record_forward_attempt(chain, endpoint.name(), false);
                    tracing::warn!(
                        chain = %chain,
                        endpoint = %endpoint.name(),
                        url = %endpoint.url(),
                        attempt,
                        total,
                        error = %e,
                        "Upstream request failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        tracing::error!(
            chain = %chain,
            method = %method,
            attempts,
            last_error = %last_error,
            "All RPC endpoints failed"
        );
        Err(ForwardError::AllEndpointsFailed {
            chain: chain.to_string(),
            attempts,
            last_error,
        })
    }
}

/// Inbound headers minus `Host`, `Content-Length` and hop-by-hop headers,
/// with the JSON content type forced.
fn upstream_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if name == header::HOST || name == header::CONTENT_LENGTH || is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthCheckConfig;
    use crate::load_balancer::WeightedPriority;
    use crate::persistence::TracingSink;

    fn forwarder() -> Forwarder {
        let registry = Arc::new(ChainRegistry::new(
            HealthCheckConfig::default(),
            reqwest::Client::new(),
            Arc::new(TracingSink),
        ));
        Forwarder::new(registry, reqwest::Client::new(), Arc::new(WeightedPriority))
    }

    #[test]
    fn test_upstream_headers_filtered() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("proxy.local"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        inbound.insert("x-api-key", HeaderValue::from_static("secret"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("application/json"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("*/*"));

        let out = upstream_headers(&inbound);
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONTENT_LENGTH).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert_eq!(out[header::CONTENT_TYPE], "application/json");
        assert_eq!(out["x-api-key"], "secret");
        assert_eq!(out.get_all(header::ACCEPT).iter().count(), 2);
    }

    fn timeouts(total: Duration) -> ForwardTimeouts {
        ForwardTimeouts {
            attempt: Duration::from_secs(1),
            total,
        }
    }

    fn call() -> Bytes {
        Bytes::from_static(br#"{"jsonrpc":"2.0","method":"eth_chainId","params":[],"id":1}"#)
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let err = forwarder()
            .forward(
                "ethereum",
                Bytes::from_static(b"{not json"),
                &HeaderMap::new(),
                timeouts(Duration::from_secs(1)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Parse(_)));
        assert_eq!(err.to_jsonrpc().error.code, -32700);
    }

    #[tokio::test]
    async fn test_unknown_chain_has_no_healthy_endpoints() {
        let err = forwarder()
            .forward(
                "nowhere",
                call(),
                &HeaderMap::new(),
                timeouts(Duration::from_secs(1)),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ForwardError::NoHealthyEndpoints {
                chain: "nowhere".into()
            }
        );
        assert_eq!(
            err.to_jsonrpc().error.message,
            "No healthy RPC endpoints available for chain: nowhere"
        );
    }

    #[tokio::test]
    async fn test_spent_budget_ends_in_exhaustion_error() {
        let forwarder = forwarder();
        let state = forwarder
            .registry
            .add_chain(
                crate::chain::Chain::new(1, "ethereum"),
                vec![crate::chain::EndpointConfig::new("a", "http://127.0.0.1:9")],
            )
            .await
            .unwrap();
        state.endpoints()[0].record_success(1, 1);

        let err = forwarder
            .forward("ethereum", call(), &HeaderMap::new(), timeouts(Duration::ZERO))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ForwardError::AllEndpointsFailed {
                chain: "ethereum".into(),
                attempts: 0,
                last_error: DEADLINE_EXCEEDED.into(),
            }
        );
        let envelope = err.to_jsonrpc();
        assert_eq!(envelope.error.code, -32000);
        assert_eq!(envelope.error.message, "All RPC endpoints failed");
    }
}
