//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe of one endpoint:
//!     → retries.rs (up to N attempts, fixed backoff between them)
//!     → cancellation signal aborts the wait and the attempt in flight
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Backoff is fixed, the prober interval already spreads load
//! - A cancelled sequence reports `Cancelled`, never a failure
pub mod retries;
