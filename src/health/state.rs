//! Endpoint health state machine.
//!
//! # States
//! - Unknown: no probe has completed yet; excluded from selection
//! - Healthy: endpoint receives traffic
//! - Unhealthy: endpoint excluded from selection
//!
//! # State Transitions
//! ```text
//! any state → Healthy:        one successful probe
//! Healthy/Unknown → Unhealthy: consecutive_failures >= unhealthy_threshold
//! ```
//!
//! Recovery is immediate while failure needs a run of failed passes, so a
//! single flaky pass never takes an endpoint out of rotation.

use serde::Serialize;
use std::time::SystemTime;

/// Health state of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

/// Result of applying one probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Recovered,
    MarkedUnhealthy,
}

/// Mutable runtime state of an endpoint.
///
/// Always read and written as a whole under the endpoint's lock.
#[derive(Debug, Clone, Default)]
pub struct EndpointRuntime {
    pub state: HealthState,
    pub last_checked_at: Option<SystemTime>,
    pub response_time_ms: u64,
    /// Canonical decimal block number from the last successful probe.
    pub last_block_number: Option<String>,
    pub consecutive_failures: u32,
}

impl EndpointRuntime {
    /// Only `Healthy` endpoints are selectable.
    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    /// Apply a successful probe.
    pub fn apply_success(
        &mut self,
        response_time_ms: u64,
        block_number: u64,
        at: SystemTime,
    ) -> Transition {
        let was_healthy = self.is_healthy();

        self.state = HealthState::Healthy;
        self.consecutive_failures = 0;
        self.response_time_ms = response_time_ms;
        self.last_block_number = Some(block_number.to_string());
        self.last_checked_at = Some(at);

        if was_healthy {
            Transition::Unchanged
        } else {
            Transition::Recovered
        }
    }

    /// Apply a failed pass. Counts once per pass regardless of how many
    /// attempts the pass made.
    pub fn apply_failure(
        &mut self,
        response_time_ms: Option<u64>,
        unhealthy_threshold: u32,
        at: SystemTime,
    ) -> Transition {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if let Some(ms) = response_time_ms {
            self.response_time_ms = ms;
        }
        self.last_checked_at = Some(at);

        if self.consecutive_failures >= unhealthy_threshold.max(1)
            && self.state != HealthState::Unhealthy
        {
            self.state = HealthState::Unhealthy;
            return Transition::MarkedUnhealthy;
        }
        Transition::Unchanged
    }
}
