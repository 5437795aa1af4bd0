//! Chain and endpoint model.
//!
//! # Data Flow
//! ```text
//! ChainConfig (config file / admin API)
//!     → model.rs (static Chain + EndpointConfig)
//!     → ChainState::new (validation)
//!     → endpoint.rs (static config + locked runtime state)
//!     → snapshot.rs (read-only views for status queries)
//! ```
//!
//! # Design Decisions
//! - Static config and runtime health live in separate structures
//! - A chain's endpoint list is fixed once registered; changes go through
//!   a remove/add or a full reconfigure of the registry

pub mod endpoint;
pub mod model;
pub mod snapshot;

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub use endpoint::Endpoint;
pub use model::{Chain, EndpointConfig};
pub use snapshot::{ChainHealthSnapshot, EndpointStatus, MultiChainStatus, ProxyHealth};

/// Rejected chain definitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain name must not be empty")]
    EmptyName,

    #[error("chain '{chain}' has invalid rpc path '{path}' (allowed: letters, digits, '-', '_')")]
    InvalidPath { chain: String, path: String },

    #[error("chain '{chain}' has an endpoint without a name")]
    EmptyEndpointName { chain: String },

    #[error("chain '{chain}' lists endpoint '{endpoint}' more than once")]
    DuplicateEndpoint { chain: String, endpoint: String },

    #[error("endpoint '{endpoint}' of chain '{chain}' has invalid url '{url}': {reason}")]
    InvalidUrl {
        chain: String,
        endpoint: String,
        url: String,
        reason: String,
    },

    #[error("endpoint '{endpoint}' of chain '{chain}' must have a weight of at least 1")]
    ZeroWeight { chain: String, endpoint: String },
}

/// A registered chain with its endpoints.
#[derive(Debug)]
pub struct ChainState {
    chain: Chain,
    endpoints: Vec<Arc<Endpoint>>,
}

impl ChainState {
    /// Validate a chain definition and build its runtime endpoints.
    pub fn new(mut chain: Chain, endpoints: Vec<EndpointConfig>) -> Result<Self, ChainError> {
        if chain.name.trim().is_empty() {
            return Err(ChainError::EmptyName);
        }
        if chain.rpc_path.is_empty() {
            chain.rpc_path = chain.name.clone();
        }
        if !is_valid_path_segment(&chain.rpc_path) {
            return Err(ChainError::InvalidPath {
                chain: chain.name.clone(),
                path: chain.rpc_path.clone(),
            });
        }
        if chain.display_name.is_empty() {
            chain.display_name = chain.name.clone();
        }

        let mut seen = HashSet::new();
        for ep in &endpoints {
            validate_endpoint(&chain.name, ep)?;
            if !seen.insert(ep.name.as_str()) {
                return Err(ChainError::DuplicateEndpoint {
                    chain: chain.name.clone(),
                    endpoint: ep.name.clone(),
                });
            }
        }

        let endpoints = endpoints
            .into_iter()
            .map(|cfg| Arc::new(Endpoint::new(chain.name.clone(), cfg)))
            .collect();

        Ok(Self { chain, endpoints })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn name(&self) -> &str {
        &self.chain.name
    }

    /// All endpoints, in configuration order.
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    /// Enabled and healthy endpoints, in configuration order.
    pub fn healthy_endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.endpoints
            .iter()
            .filter(|e| e.is_selectable())
            .cloned()
            .collect()
    }

    /// Whether a prober should run for this chain.
    pub fn is_probeable(&self) -> bool {
        self.chain.enabled && !self.endpoints.is_empty()
    }

    pub fn snapshot(&self) -> ChainHealthSnapshot {
        ChainHealthSnapshot::new(&self.chain, self.endpoints.iter().map(Arc::as_ref))
    }
}

fn validate_endpoint(chain: &str, ep: &EndpointConfig) -> Result<(), ChainError> {
    if ep.name.trim().is_empty() {
        return Err(ChainError::EmptyEndpointName {
            chain: chain.to_string(),
        });
    }
    if ep.weight == 0 {
        return Err(ChainError::ZeroWeight {
            chain: chain.to_string(),
            endpoint: ep.name.clone(),
        });
    }
    let invalid = |reason: String| ChainError::InvalidUrl {
        chain: chain.to_string(),
        endpoint: ep.name.clone(),
        url: ep.url.clone(),
        reason,
    };
    let url = url::Url::parse(&ep.url).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Letters, digits, '-' and '_'.
pub fn is_valid_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(name: &str, url: &str) -> EndpointConfig {
        EndpointConfig::new(name, url)
    }

    #[test]
    fn test_valid_chain_normalizes_metadata() {
        let mut chain = Chain::new(1868, "soneium");
        chain.rpc_path = String::new();
        chain.display_name = String::new();

        let state = ChainState::new(chain, vec![ep("drpc", "https://soneium.drpc.org")]).unwrap();
        assert_eq!(state.chain().rpc_path, "soneium");
        assert_eq!(state.chain().display_name, "soneium");
        assert_eq!(state.endpoints().len(), 1);
        assert!(state.is_probeable());
    }

    #[test]
    fn test_rejects_bad_definitions() {
        let chain = Chain::new(1, "ethereum");

        assert!(matches!(
            ChainState::new(chain.clone(), vec![ep("a", "ftp://x.org")]),
            Err(ChainError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ChainState::new(chain.clone(), vec![ep("a", "not a url")]),
            Err(ChainError::InvalidUrl { .. })
        ));
        assert_eq!(
            ChainState::new(chain.clone(), vec![ep("a", "http://x.org").with_weight(0)])
                .unwrap_err(),
            ChainError::ZeroWeight {
                chain: "ethereum".into(),
                endpoint: "a".into()
            }
        );
        assert!(matches!(
            ChainState::new(
                chain.clone(),
                vec![ep("a", "http://x.org"), ep("a", "http://y.org")]
            ),
            Err(ChainError::DuplicateEndpoint { .. })
        ));

        let mut bad_path = chain.clone();
        bad_path.rpc_path = "eth/main".into();
        assert!(matches!(
            ChainState::new(bad_path, vec![]),
            Err(ChainError::InvalidPath { .. })
        ));

        assert_eq!(
            ChainState::new(Chain::new(1, " "), vec![]).unwrap_err(),
            ChainError::EmptyName
        );
    }

    #[test]
    fn test_chain_without_endpoints_is_not_probed() {
        let state = ChainState::new(Chain::new(1, "ethereum"), vec![]).unwrap();
        assert!(!state.is_probeable());

        let mut disabled = Chain::new(1, "ethereum");
        disabled.enabled = false;
        let state = ChainState::new(disabled, vec![ep("a", "http://x.org")]).unwrap();
        assert!(!state.is_probeable());
    }

    #[test]
    fn test_healthy_endpoints_keep_config_order() {
        let state = ChainState::new(
            Chain::new(1, "ethereum"),
            vec![
                ep("a", "http://a.org"),
                ep("b", "http://b.org"),
                ep("c", "http://c.org"),
            ],
        )
        .unwrap();
        state.endpoints()[2].record_success(1, 1);
        state.endpoints()[0].record_success(1, 1);

        let names: Vec<_> = state
            .healthy_endpoints()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_path_segment_rules() {
        assert!(is_valid_path_segment("soneium-testnet"));
        assert!(is_valid_path_segment("base_sepolia"));
        assert!(!is_valid_path_segment(""));
        assert!(!is_valid_path_segment("a/b"));
        assert!(!is_valid_path_segment("a b"));
    }
}
