//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, span)
//!     → rpc.rs (chain from path → Forwarder)
//!       health.rs (registry snapshots)
//!     → response.rs (stream upstream answer or JSON-RPC error)
//!     → Send to client
//! ```

pub mod health;
pub mod request;
pub mod response;
pub mod rpc;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, HttpSettings};
