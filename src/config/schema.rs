//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chain::{Chain, EndpointConfig};

/// Root configuration for the RPC proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Forwarding behaviour.
    pub proxy: ForwardConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    pub persistence: PersistenceConfig,

    /// Chains and their endpoints. Empty means "use the built-in fallback set".
    pub chains: Vec<ChainConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8888").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8888".to_string(),
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Upstream request timeout in milliseconds (per attempt).
    pub timeout_ms: u64,

    /// Overall inbound request deadline in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum concurrent inbound RPC requests.
    pub max_connections: usize,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,

    /// Chain used by the legacy `/rpc` and `/` routes.
    pub default_chain: Option<String>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            max_connections: 1_000,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            default_chain: Some("ethereum".to_string()),
        }
    }
}

impl ForwardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Time all upstream attempts of one call may take together. Ends
    /// before the inbound request deadline so the caller still gets a
    /// JSON-RPC error instead of a bare timeout.
    pub fn forward_budget(&self) -> Duration {
        let request_timeout = self.request_timeout();
        let margin = (request_timeout / 10).min(FORWARD_BUDGET_MARGIN);
        request_timeout.saturating_sub(margin)
    }
}

const FORWARD_BUDGET_MARGIN: Duration = Duration::from_millis(500);

/// Health check configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Interval between probe passes in milliseconds.
    pub interval_ms: u64,

    /// Timeout of a single probe request in milliseconds.
    pub timeout_ms: u64,

    /// Attempts per endpoint within one pass.
    pub retries: u32,

    /// Fixed wait between attempts in milliseconds.
    pub retry_backoff_ms: u64,

    /// Number of consecutive failed passes before marking unhealthy.
    pub unhealthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            timeout_ms: 5_000,
            retries: 3,
            retry_backoff_ms: 1_000,
            unhealthy_threshold: 3,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Health-check history sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Append health-check records as JSON lines to this file.
    /// When unset, records are only logged.
    pub health_log_path: Option<String>,

    /// Records buffered before new ones are dropped.
    pub buffer_size: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            health_log_path: None,
            buffer_size: 1024,
        }
    }
}

/// One chain and its endpoints as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    #[serde(flatten)]
    pub chain: Chain,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl ChainConfig {
    pub fn new(chain: Chain, endpoints: Vec<EndpointConfig>) -> Self {
        Self { chain, endpoints }
    }
}
