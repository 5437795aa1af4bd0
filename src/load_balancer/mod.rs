//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Forward request for a chain
//!     → registry.healthy_endpoints(chain) (enabled + healthy, config order)
//!     → LoadBalancer::order (attempt order)
//!     → forwarder tries each in turn until one answers
//! ```
//!
//! # Design Decisions
//! - Load balancer is stateless; health lives on the endpoints
//! - Unhealthy endpoints are excluded before ordering
//! - Ordering is deterministic so repeated calls prefer the same endpoint

pub mod weighted;

use std::sync::Arc;

use crate::chain::Endpoint;

pub use weighted::WeightedPriority;

/// Decides the order in which candidate endpoints are attempted.
pub trait LoadBalancer: Send + Sync {
    /// Candidates arrive in configuration order.
    fn order(&self, candidates: &[Arc<Endpoint>]) -> Vec<Arc<Endpoint>>;
}
