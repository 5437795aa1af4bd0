//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//! - Check chain definitions (unique names and paths, endpoints well formed)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::chain::{ChainError, ChainState};
use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("chain '{0}' is defined more than once")]
    DuplicateChain(String),

    #[error("rpc path '{path}' is used by both '{first}' and '{second}'")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },

    #[error("enabled chain '{0}' must have at least one RPC endpoint")]
    NoEndpoints(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let hc = &config.health_check;
    for (field, value) in [
        ("health_check.interval_ms", hc.interval_ms),
        ("health_check.timeout_ms", hc.timeout_ms),
        ("health_check.retries", u64::from(hc.retries)),
        ("health_check.unhealthy_threshold", u64::from(hc.unhealthy_threshold)),
        ("proxy.timeout_ms", config.proxy.timeout_ms),
        ("proxy.request_timeout_ms", config.proxy.request_timeout_ms),
        ("proxy.max_connections", config.proxy.max_connections as u64),
        ("proxy.max_body_bytes", config.proxy.max_body_bytes as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::NotPositive(field));
        }
    }

    let mut names = HashSet::new();
    let mut paths: Vec<(String, String)> = Vec::new();
    for entry in &config.chains {
        let chain = &entry.chain;
        if !names.insert(chain.name.clone()) {
            errors.push(ValidationError::DuplicateChain(chain.name.clone()));
            continue;
        }
        if chain.enabled && entry.endpoints.is_empty() {
            errors.push(ValidationError::NoEndpoints(chain.name.clone()));
        }

        match ChainState::new(chain.clone(), entry.endpoints.clone()) {
            Ok(state) => {
                let path = state.chain().path().to_string();
                if let Some((_, first)) = paths.iter().find(|(p, _)| *p == path) {
                    errors.push(ValidationError::DuplicatePath {
                        path: path.clone(),
                        first: first.clone(),
                        second: chain.name.clone(),
                    });
                } else {
                    paths.push((path, chain.name.clone()));
                }
            }
            Err(e) => errors.push(e.into()),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Chain, EndpointConfig};
    use crate::config::schema::ChainConfig;

    fn chain(name: &str, urls: &[&str]) -> ChainConfig {
        ChainConfig::new(
            Chain::new(1, name),
            urls.iter()
                .enumerate()
                .map(|(i, u)| EndpointConfig::new(format!("ep-{i}"), *u))
                .collect(),
        )
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "nope".into();
        config.health_check.interval_ms = 0;
        config.health_check.retries = 0;
        config.chains = vec![
            chain("ethereum", &["http://a.org"]),
            chain("ethereum", &["http://b.org"]),
            chain("sepolia", &[]),
            chain("base", &["gopher://c.org"]),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: "nope".into()
        }));
        assert!(errors.contains(&ValidationError::NotPositive("health_check.interval_ms")));
        assert!(errors.contains(&ValidationError::NotPositive("health_check.retries")));
        assert!(errors.contains(&ValidationError::DuplicateChain("ethereum".into())));
        assert!(errors.contains(&ValidationError::NoEndpoints("sepolia".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Chain(ChainError::InvalidUrl { .. }))));
    }

    #[test]
    fn test_duplicate_rpc_path() {
        let mut config = ProxyConfig::default();
        let mut a = chain("soneium", &["http://a.org"]);
        a.chain.rpc_path = "son".into();
        let mut b = chain("soneium-main", &["http://b.org"]);
        b.chain.rpc_path = "son".into();
        config.chains = vec![a, b];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicatePath {
                path: "son".into(),
                first: "soneium".into(),
                second: "soneium-main".into(),
            }]
        );
    }

    #[test]
    fn test_disabled_chain_may_have_no_endpoints() {
        let mut config = ProxyConfig::default();
        let mut c = chain("minato", &[]);
        c.chain.enabled = false;
        config.chains = vec![c];
        assert!(validate_config(&config).is_ok());
    }
}
