//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize; unreadable source → fallback.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → chains handed to the ChainRegistry, settings shared via Arc
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → registry reconfigure + atomic swap of HTTP settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod fallback;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_config_or_fallback, ConfigError};
pub use schema::{
    AdminConfig, ChainConfig, ForwardConfig, HealthCheckConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, PersistenceConfig, ProxyConfig,
};
