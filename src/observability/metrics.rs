//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_proxy_probes_total` (counter): probe results by chain, endpoint, outcome
//! - `rpc_proxy_probe_duration_ms` (histogram): probe latency
//! - `rpc_proxy_endpoint_healthy` (gauge): 1=healthy, 0=not healthy
//! - `rpc_proxy_forwards_total` (counter): forward results by chain, outcome
//! - `rpc_proxy_forward_attempts_total` (counter): upstream attempts by chain, endpoint
//! - `rpc_proxy_forward_duration_ms` (histogram): end-to-end forward latency
//! - `rpc_proxy_health_records_dropped_total` (counter): sink overflow
//!
//! Without an installed recorder every macro is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

pub fn record_probe(chain: &str, endpoint: &str, success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "rpc_proxy_probes_total",
        "chain" => chain.to_string(),
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "rpc_proxy_probe_duration_ms",
        "chain" => chain.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(duration.as_secs_f64() * 1_000.0);
}

pub fn record_endpoint_health(chain: &str, endpoint: &str, healthy: bool) {
    gauge!(
        "rpc_proxy_endpoint_healthy",
        "chain" => chain.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_forward_attempt(chain: &str, endpoint: &str, success: bool) {
    let outcome = if success { "success" } else { "transport_error" };
    counter!(
        "rpc_proxy_forward_attempts_total",
        "chain" => chain.to_string(),
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_forward(chain: &str, outcome: &'static str, duration: Duration) {
    counter!("rpc_proxy_forwards_total", "chain" => chain.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("rpc_proxy_forward_duration_ms", "chain" => chain.to_string())
        .record(duration.as_secs_f64() * 1_000.0);
}

pub fn record_dropped_health_record() {
    counter!("rpc_proxy_health_records_dropped_total").increment(1);
}
