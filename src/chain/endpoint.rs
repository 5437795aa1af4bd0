//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Pair the static endpoint config with its runtime health state
//! - Guard runtime state so readers never see a half-applied probe
//!
//! # Ownership
//! The chain's prober is the only writer (`record_*` are crate-private).
//! The forwarder and status queries read clones of the runtime block.

use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use crate::chain::model::EndpointConfig;
use crate::chain::snapshot::EndpointStatus;
use crate::health::state::{EndpointRuntime, Transition};

/// A single upstream JSON-RPC endpoint.
#[derive(Debug)]
pub struct Endpoint {
    config: EndpointConfig,
    chain: String,
    runtime: RwLock<EndpointRuntime>,
}

impl Endpoint {
    pub fn new(chain: impl Into<String>, config: EndpointConfig) -> Self {
        Self {
            config,
            chain: chain.into(),
            runtime: RwLock::new(EndpointRuntime::default()),
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn id(&self) -> u64 {
        self.config.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn weight(&self) -> u32 {
        self.config.weight
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Name of the owning chain.
    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// Consistent copy of the runtime state.
    pub fn runtime(&self) -> EndpointRuntime {
        self.runtime
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the endpoint is currently `Healthy`.
    pub fn is_healthy(&self) -> bool {
        self.runtime
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_healthy()
    }

    /// Enabled and healthy.
    pub fn is_selectable(&self) -> bool {
        self.config.enabled && self.is_healthy()
    }

    pub(crate) fn record_success(&self, response_time_ms: u64, block_number: u64) -> Transition {
        self.runtime
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply_success(response_time_ms, block_number, SystemTime::now())
    }

    pub(crate) fn record_failure(
        &self,
        response_time_ms: Option<u64>,
        unhealthy_threshold: u32,
    ) -> Transition {
        self.runtime
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply_failure(response_time_ms, unhealthy_threshold, SystemTime::now())
    }

    /// Serializable view for status endpoints.
    pub fn status(&self) -> EndpointStatus {
        EndpointStatus::new(self, &self.runtime())
    }
}
