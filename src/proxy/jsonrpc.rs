//! JSON-RPC 2.0 envelopes produced by the proxy itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound body is not valid JSON.
pub const PARSE_ERROR: i64 = -32700;
/// The request path does not name a usable chain.
pub const INVALID_REQUEST: i64 = -32600;
/// No endpoint could serve the call.
pub const SERVER_ERROR: i64 = -32000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Error response. The id is always `null` since the proxy does not
/// correlate its own errors with inbound ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: String,
    pub error: JsonRpcError,
    pub id: Value,
}

impl JsonRpcErrorResponse {
    pub fn new(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            error: JsonRpcError {
                code,
                message: message.into(),
                data,
            },
            id: Value::Null,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "Parse error", None)
    }

    pub fn invalid_path() -> Self {
        Self::new(
            INVALID_REQUEST,
            "Invalid request path. Use /rpc/{chainName}",
            None,
        )
    }

    pub fn no_healthy_endpoints(chain: &str) -> Self {
        Self::new(
            SERVER_ERROR,
            format!("No healthy RPC endpoints available for chain: {chain}"),
            None,
        )
    }

    pub fn all_endpoints_failed(last_error: &str) -> Self {
        Self::new(
            SERVER_ERROR,
            "All RPC endpoints failed",
            Some(Value::String(last_error.to_string())),
        )
    }
}

/// Method name(s) of an inbound call, for logging.
pub fn describe_call(body: &Value) -> String {
    match body {
        Value::Object(obj) => obj
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("<none>")
            .to_string(),
        Value::Array(batch) => format!("batch[{}]", batch.len()),
        _ => "<invalid>".to_string(),
    }
}
