//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::fallback::fallback_chains;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string.
///
/// An empty chain list is replaced with the built-in fallback chains.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let mut config: ProxyConfig = toml::from_str(content)?;
    if config.chains.is_empty() {
        tracing::warn!("No chains configured, using built-in fallback endpoints");
        config.chains = fallback_chains();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load configuration, degrading to defaults plus the fallback chain set
/// when the source cannot be read or parsed.
///
/// Validation failures are still fatal: a readable but wrong config is an
/// operator error, not an outage of the config source.
pub fn load_config_or_fallback(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let Some(path) = path else {
        tracing::warn!("No config file given, using defaults with fallback endpoints");
        return Ok(fallback_config());
    };

    match load_config(path) {
        Ok(config) => Ok(config),
        Err(e @ (ConfigError::Io(_) | ConfigError::Parse(_))) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to load config, using defaults with fallback endpoints"
            );
            Ok(fallback_config())
        }
        Err(e) => Err(e),
    }
}

/// Defaults with the fallback chain set.
pub fn fallback_config() -> ProxyConfig {
    ProxyConfig {
        chains: fallback_chains(),
        ..ProxyConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            uuid::Uuid::new_v4()
        ))
    }

    #[test]
    fn test_empty_file_gets_fallback_chains() {
        let config = parse_config("").unwrap();
        let names: Vec<_> = config.chains.iter().map(|c| c.chain.name.as_str()).collect();
        assert_eq!(names, vec!["ethereum", "sepolia", "soneium", "soneium-testnet"]);
    }

    #[test]
    fn test_invalid_config_reports_validation() {
        let err = parse_config(
            r#"
            [health_check]
            retries = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("health_check.retries"));
    }

    #[test]
    fn test_missing_file_degrades_to_fallback() {
        let path = temp_path("missing-config.toml");
        let config = load_config_or_fallback(Some(&path)).unwrap();
        assert_eq!(config.chains.len(), 4);
    }

    #[test]
    fn test_unparseable_file_degrades_to_fallback() {
        let path = temp_path("broken-config.toml");
        fs::write(&path, "[[chains]\nname = ").unwrap();
        let config = load_config_or_fallback(Some(&path)).unwrap();
        assert_eq!(config.chains.len(), 4);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_invalid_file_stays_fatal() {
        let path = temp_path("invalid-config.toml");
        fs::write(&path, "[listener]\nbind_address = \"nowhere\"\n").unwrap();
        assert!(matches!(
            load_config_or_fallback(Some(&path)),
            Err(ConfigError::Validation(_))
        ));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = parse_config(include_str!("../../config.example.toml")).unwrap();
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.chains[1].chain.rpc_path, "soneium-testnet");
        assert!(config.chains[1].chain.is_testnet);
    }

    #[test]
    fn test_load_from_file() {
        let path = temp_path("config.toml");
        fs::write(
            &path,
            r#"
            [[chains]]
            chain_id = 31337
            name = "anvil"

            [[chains.endpoints]]
            name = "local"
            url = "http://127.0.0.1:8545"
            "#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.chains.len(), 1);
        assert_eq!(config.chains[0].endpoints[0].url, "http://127.0.0.1:8545");
        let _ = fs::remove_file(path);
    }
}
