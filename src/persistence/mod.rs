//! Health-check history.
//!
//! # Data Flow
//! ```text
//! ChainProber (one record per endpoint per completed pass)
//!     → HealthSink::record (non-blocking)
//!     → TracingSink: debug log line
//!     → JsonlSink: bounded channel → writer task → append JSON line
//! ```
//!
//! # Design Decisions
//! - Recording never blocks or fails the probe loop
//! - A full buffer drops the record and counts it

pub mod jsonl;

use serde::Serialize;
use std::time::SystemTime;

use crate::chain::snapshot::unix_millis;

pub use jsonl::{JsonlSink, SinkWriter};

/// Outcome of probing one endpoint during one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub endpoint_id: u64,
    pub endpoint_name: String,
    pub chain: String,
    pub success: bool,
    pub response_time_ms: Option<u64>,
    pub block_number: Option<String>,
    pub error: Option<String>,
    pub checked_at_ms: u64,
}

impl HealthRecord {
    pub fn success(
        endpoint_id: u64,
        endpoint_name: &str,
        chain: &str,
        response_time_ms: u64,
        block_number: u64,
        at: SystemTime,
    ) -> Self {
        Self {
            endpoint_id,
            endpoint_name: endpoint_name.to_string(),
            chain: chain.to_string(),
            success: true,
            response_time_ms: Some(response_time_ms),
            block_number: Some(block_number.to_string()),
            error: None,
            checked_at_ms: unix_millis(at),
        }
    }

    pub fn failure(
        endpoint_id: u64,
        endpoint_name: &str,
        chain: &str,
        response_time_ms: Option<u64>,
        error: impl ToString,
        at: SystemTime,
    ) -> Self {
        Self {
            endpoint_id,
            endpoint_name: endpoint_name.to_string(),
            chain: chain.to_string(),
            success: false,
            response_time_ms,
            block_number: None,
            error: Some(error.to_string()),
            checked_at_ms: unix_millis(at),
        }
    }
}

/// Destination for health-check records.
pub trait HealthSink: Send + Sync + 'static {
    /// Must return immediately.
    fn record(&self, record: HealthRecord);
}

/// Logs each record at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl HealthSink for TracingSink {
    fn record(&self, record: HealthRecord) {
        tracing::debug!(
            chain = %record.chain,
            endpoint = %record.endpoint_name,
            endpoint_id = record.endpoint_id,
            success = record.success,
            response_time_ms = ?record.response_time_ms,
            block_number = ?record.block_number,
            error = ?record.error,
            "Health check recorded"
        );
    }
}
