//! Request path: JSON-RPC envelopes and failover forwarding.
//!
//! # Data Flow
//! ```text
//! inbound body + headers
//!     → forwarder.rs (JSON check, healthy set, weighted order)
//!     → upstream attempts, one at a time, until one answers
//!     → UpstreamResponse (streamed back verbatim) or ForwardError
//!     → jsonrpc.rs error envelope (HTTP 200, id null)
//! ```

pub mod forwarder;
pub mod jsonrpc;

pub use forwarder::{ForwardError, ForwardTimeouts, Forwarder, UpstreamResponse};
pub use jsonrpc::JsonRpcErrorResponse;
