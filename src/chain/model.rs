//! Static chain and endpoint definitions.
//!
//! These come from the config file or the admin API and never change for
//! the lifetime of a registered chain. Config keys are snake_case; JSON
//! output is camelCase to match the status endpoints.

use serde::{Deserialize, Serialize};

/// A blockchain network served by the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Chain {
    /// Numeric chain id (e.g. 1 for Ethereum mainnet).
    pub chain_id: u64,

    /// Unique short name, used as the registry key.
    pub name: String,

    /// Human readable name.
    #[serde(default)]
    pub display_name: String,

    /// Path segment under `/rpc/`. Defaults to `name` when empty.
    #[serde(default)]
    pub rpc_path: String,

    #[serde(default)]
    pub is_testnet: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_currency_symbol")]
    pub native_currency_symbol: String,

    #[serde(default = "default_currency_decimals")]
    pub native_currency_decimals: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_url: Option<String>,
}

impl Chain {
    /// Minimal chain definition; metadata takes defaults.
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            chain_id,
            display_name: name.clone(),
            rpc_path: name.clone(),
            name,
            is_testnet: false,
            enabled: true,
            native_currency_symbol: default_currency_symbol(),
            native_currency_decimals: default_currency_decimals(),
            block_explorer_url: None,
        }
    }

    /// The routable path segment, falling back to the name.
    pub fn path(&self) -> &str {
        if self.rpc_path.is_empty() {
            &self.name
        } else {
            &self.rpc_path
        }
    }
}

/// Static configuration of one upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Identifier used in health-check records. 0 when not assigned.
    #[serde(default)]
    pub id: u64,

    pub name: String,

    pub url: String,

    /// Relative preference among healthy endpoints (higher first).
    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            url: url.into(),
            weight: default_weight(),
            enabled: true,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

fn default_enabled() -> bool {
    true
}

fn default_weight() -> u32 {
    1
}

fn default_currency_symbol() -> String {
    "ETH".to_string()
}

fn default_currency_decimals() -> u8 {
    18
}
