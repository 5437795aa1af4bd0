//! JSON-RPC forwarding routes.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::chain::is_valid_path_segment;
use crate::http::response::{jsonrpc_error, upstream_response};
use crate::http::server::AppState;
use crate::proxy::{ForwardTimeouts, JsonRpcErrorResponse};

/// `/rpc/{chain}`. The segment is matched against rpc paths, then names.
pub async fn rpc_for_chain(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if !is_valid_path_segment(&segment) {
        tracing::warn!(segment = %segment, "Invalid multi-chain RPC path");
        return jsonrpc_error(JsonRpcErrorResponse::invalid_path());
    }
    let chain = state.registry.resolve_path(&segment).unwrap_or(segment);
    forward(&state, &chain, headers, body).await
}

/// Legacy `/rpc` and `/`, served by the default chain.
pub async fn rpc_default(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let default_chain = state.settings.load().default_chain.clone();
    match default_chain {
        Some(chain) => forward(&state, &chain, headers, body).await,
        None => jsonrpc_error(JsonRpcErrorResponse::invalid_path()),
    }
}

async fn forward(
    state: &AppState,
    chain: &str,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(chain = %chain, error = %rejection, "Failed to read request body");
            return jsonrpc_error(JsonRpcErrorResponse::parse_error());
        }
    };

    let timeouts = ForwardTimeouts {
        attempt: state.settings.load().forward_timeout,
        total: state.forward_budget,
    };
    match state.forwarder.forward(chain, body, &headers, timeouts).await {
        Ok(upstream) => upstream_response(upstream),
        Err(e) => jsonrpc_error(e.to_jsonrpc()),
    }
}
