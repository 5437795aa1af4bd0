//! Public health routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::chain::{EndpointStatus, ProxyHealth};
use crate::http::server::AppState;

/// Single-chain view kept compatible with older clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyHealthStatus {
    pub proxy: ProxyHealth,
    #[serde(rename = "currentRPC")]
    pub current_rpc: Option<String>,
    pub rpc_endpoints: Vec<EndpointStatus>,
    pub chain: String,
}

/// `GET /health`: every chain, 503 when none has a healthy endpoint.
pub async fn health_all(State(state): State<AppState>) -> Response {
    let status = state.registry.status();
    let code = match status.proxy {
        ProxyHealth::Healthy => StatusCode::OK,
        ProxyHealth::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(status)).into_response()
}

/// `GET /health/{chain}`: 404 for unknown chains, 503 when the chain has
/// no healthy endpoint.
pub async fn health_chain(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Response {
    let snapshot = state
        .registry
        .resolve_path(&segment)
        .and_then(|name| state.registry.snapshot(&name));
    let Some(snapshot) = snapshot else {
        return (StatusCode::NOT_FOUND, format!("Chain {segment} not found")).into_response();
    };

    let (proxy, code) = if snapshot.healthy_count > 0 {
        (ProxyHealth::Healthy, StatusCode::OK)
    } else {
        (ProxyHealth::Unhealthy, StatusCode::SERVICE_UNAVAILABLE)
    };

    let mut rpc_endpoints = snapshot.healthy_endpoints;
    rpc_endpoints.extend(snapshot.unhealthy_endpoints);
    let body = LegacyHealthStatus {
        proxy,
        current_rpc: snapshot.current_rpc,
        rpc_endpoints,
        chain: snapshot.chain.name,
    };
    (code, Json(body)).into_response()
}
