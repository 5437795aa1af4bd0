//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, request ID, tracing, timeout, limits)
//! - Serve until the shutdown signal fires, then drain in-flight requests

use arc_swap::ArcSwap;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ForwardConfig;
use crate::http::health::{health_all, health_chain};
use crate::http::request::request_span;
use crate::http::rpc::{rpc_default, rpc_for_chain};
use crate::lifecycle::ShutdownSignal;
use crate::proxy::Forwarder;
use crate::registry::ChainRegistry;

/// Settings that follow config reloads without rebuilding the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub forward_timeout: Duration,
    pub default_chain: Option<String>,
}

impl From<&ForwardConfig> for HttpSettings {
    fn from(config: &ForwardConfig) -> Self {
        Self {
            forward_timeout: config.timeout(),
            default_chain: config.default_chain.clone(),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ChainRegistry>,
    pub forwarder: Arc<Forwarder>,
    pub settings: Arc<ArcSwap<HttpSettings>>,
    /// Fixed with the request timeout layer; see [`ForwardConfig::forward_budget`].
    pub forward_budget: Duration,
}

impl AppState {
    pub fn new(
        registry: Arc<ChainRegistry>,
        forwarder: Arc<Forwarder>,
        settings: HttpSettings,
        forward_budget: Duration,
    ) -> Self {
        Self {
            registry,
            forwarder,
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            forward_budget,
        }
    }

    /// Swap in new reloadable settings.
    pub fn update_settings(&self, settings: HttpSettings) {
        self.settings.store(Arc::new(settings));
    }
}

/// Public RPC and health server.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Limits are fixed for the lifetime of the server.
    pub fn new(state: AppState, config: &ForwardConfig) -> Self {
        Self {
            router: Self::build_router(state, config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, config: &ForwardConfig) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);

        Router::new()
            .route("/rpc/{chain}", get(rpc_for_chain).post(rpc_for_chain))
            .route("/rpc", get(rpc_default).post(rpc_default))
            .route("/", get(rpc_default).post(rpc_default))
            .route("/health", get(health_all))
            .route("/health/{chain}", get(health_chain))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(cors)
                    .layer(TimeoutLayer::new(config.request_timeout()))
                    .layer(ConcurrencyLimitLayer::new(config.max_connections.max(1))),
            )
    }

    /// The router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
