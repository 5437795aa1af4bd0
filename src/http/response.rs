//! Response construction.
//!
//! # Design Decisions
//! - Upstream bodies are streamed, never buffered
//! - Upstream status and headers are kept; hop-by-hop headers are stripped
//! - Proxy-generated JSON-RPC errors always use HTTP 200

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::proxy::forwarder::is_hop_by_hop;
use crate::proxy::{JsonRpcErrorResponse, UpstreamResponse};

/// Relay an upstream answer to the client.
pub fn upstream_response(upstream: UpstreamResponse) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    // The body is re-framed by our server.
    headers.remove(header::CONTENT_LENGTH);
    let names: Vec<_> = headers.keys().filter(|n| is_hop_by_hop(n)).cloned().collect();
    for name in names {
        headers.remove(name);
    }

    let mut response = Response::new(Body::from_stream(upstream.response.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Proxy-generated JSON-RPC error with HTTP 200.
pub fn jsonrpc_error(error: JsonRpcErrorResponse) -> Response {
    let mut response = (StatusCode::OK, Json(error)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
