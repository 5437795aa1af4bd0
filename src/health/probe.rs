//! Single `eth_blockNumber` probe against one endpoint.

use serde_json::{json, Value};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a probe attempt failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid block number: {0}")]
    InvalidBlockNumber(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSuccess {
    pub block_number: u64,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub error: ProbeError,
    /// Set when the endpoint answered at all.
    pub response_time_ms: Option<u64>,
}

/// Issue one `eth_blockNumber` call with a bounded timeout.
pub async fn probe_block_number(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<ProbeSuccess, ProbeFailure> {
    let started = Instant::now();
    let body = json!({
        "jsonrpc": "2.0",
        "method": "eth_blockNumber",
        "params": [],
        "id": 1,
    });

    let response = client
        .post(url)
        .timeout(timeout)
        .json(&body)
        .send()
        .await
        .map_err(|e| ProbeFailure {
            error: classify(&e, timeout),
            response_time_ms: None,
        })?;

    let status = response.status();
    let bytes = response.bytes().await;
    let response_time_ms = elapsed_ms(started);
    let fail = |error| ProbeFailure {
        error,
        response_time_ms: Some(response_time_ms),
    };

    if status != reqwest::StatusCode::OK {
        return Err(fail(ProbeError::HttpStatus(status.as_u16())));
    }
    let bytes = bytes.map_err(|e| fail(classify(&e, timeout)))?;

    let block_number = parse_response(&bytes).map_err(fail)?;
    Ok(ProbeSuccess {
        block_number,
        response_time_ms,
    })
}

fn classify(error: &reqwest::Error, timeout: Duration) -> ProbeError {
    if error.is_timeout() {
        ProbeError::Timeout(timeout.as_millis() as u64)
    } else {
        ProbeError::Transport(error.to_string())
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Validate a JSON-RPC envelope and extract the block number.
fn parse_response(bytes: &[u8]) -> Result<u64, ProbeError> {
    let envelope: Value =
        serde_json::from_slice(bytes).map_err(|e| ProbeError::MalformedBody(e.to_string()))?;
    let obj = envelope
        .as_object()
        .ok_or_else(|| ProbeError::MalformedBody("expected a JSON object".into()))?;

    if let Some(error) = obj.get("error").filter(|e| !e.is_null()) {
        return Err(ProbeError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    match obj.get("result") {
        Some(Value::String(hex)) => parse_block_number(hex),
        Some(other) => Err(ProbeError::InvalidBlockNumber(other.to_string())),
        None => Err(ProbeError::MalformedBody("missing result".into())),
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_block_number(value: &str) -> Result<u64, ProbeError> {
    let invalid = || ProbeError::InvalidBlockNumber(value.to_string());
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u64::from_str_radix(digits, 16).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_number() {
        assert_eq!(parse_block_number("0x10"), Ok(16));
        assert_eq!(parse_block_number("0x0"), Ok(0));
        assert_eq!(parse_block_number("0x1b4"), Ok(436));
        assert!(parse_block_number("10").is_err());
        assert!(parse_block_number("0x").is_err());
        assert!(parse_block_number("0xzz").is_err());
        assert!(parse_block_number("0x-1").is_err());
        assert!(parse_block_number("0x+1").is_err());
        assert!(parse_block_number("0x10000000000000000").is_err());
    }

    #[test]
    fn test_parse_response_success() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#;
        assert_eq!(parse_response(body), Ok(16));
    }

    #[test]
    fn test_parse_response_rpc_error() {
        let body =
            br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit exceeded"}}"#;
        assert_eq!(
            parse_response(body),
            Err(ProbeError::Rpc {
                code: -32005,
                message: "limit exceeded".into()
            })
        );
    }

    #[test]
    fn test_parse_response_rejects_malformed() {
        assert!(matches!(
            parse_response(b"<html>"),
            Err(ProbeError::MalformedBody(_))
        ));
        assert!(matches!(
            parse_response(br#"{"jsonrpc":"2.0","id":1}"#),
            Err(ProbeError::MalformedBody(_))
        ));
        assert!(matches!(
            parse_response(br#"{"jsonrpc":"2.0","id":1,"result":16}"#),
            Err(ProbeError::InvalidBlockNumber(_))
        ));
        assert!(matches!(
            parse_response(br#"[1,2]"#),
            Err(ProbeError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let client = reqwest::Client::new();
        // Port 9 on loopback is expected to refuse connections.
        let failure = probe_block_number(&client, "http://127.0.0.1:9", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(failure.response_time_ms.is_none());
        assert!(matches!(
            failure.error,
            ProbeError::Transport(_) | ProbeError::Timeout(_)
        ));
    }
}
