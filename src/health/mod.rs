//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Prober (prober.rs), one task per chain:
//!     Immediate pass, then periodic timer
//!     → fan out over enabled endpoints
//!     → probe.rs (eth_blockNumber, bounded timeout), retried within the pass
//!     → Endpoint runtime via state.rs
//!     → HealthSink record
//!
//! State machine (state.rs):
//!     Unknown → Healthy on first success
//!     Healthy/Unknown → Unhealthy after N failed passes
//!     Unhealthy → Healthy on the next success
//! ```
//!
//! # Design Decisions
//! - The prober is the only writer of endpoint health
//! - Failed forwards never touch health state
//! - Health state is per-endpoint, not per-chain

pub mod probe;
pub mod prober;
pub mod state;

pub use probe::{parse_block_number, ProbeError};
pub use prober::{ChainProber, PassSummary, ProberHandle};
pub use state::{EndpointRuntime, HealthState, Transition};
