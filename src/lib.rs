//! Multi-chain JSON-RPC proxy library.
//!
//! Probes every configured endpoint with `eth_blockNumber`, keeps a health
//! state per endpoint, and forwards JSON-RPC calls to the healthy endpoint
//! with the highest weight, failing over to the next on transport errors.

pub mod admin;
pub mod chain;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod persistence;
pub mod proxy;
pub mod registry;
pub mod resilience;

pub use chain::{Chain, ChainHealthSnapshot, ChainState, Endpoint, EndpointConfig};
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
pub use proxy::Forwarder;
pub use registry::ChainRegistry;
