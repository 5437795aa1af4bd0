//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (sink, registry, listeners)
//! - Start background tasks (probers, config reload, admin API)
//! - Tear everything down in reverse order once shutdown fires
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners are bound during bootstrap so callers learn the real ports
//! - Probers stop only after the listeners have drained

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::admin::{run_admin_server, AdminState};
use crate::config::watcher::ConfigWatcher;
use crate::config::ProxyConfig;
use crate::http::{AppState, HttpServer, HttpSettings};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::load_balancer::WeightedPriority;
use crate::observability::metrics;
use crate::persistence::{HealthSink, JsonlSink, SinkWriter, TracingSink};
use crate::proxy::Forwarder;
use crate::registry::{ChainRegistry, RegistryError};

const SINK_DRAIN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("failed to open health log {path}: {source}")]
    HealthLog { path: String, source: io::Error },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// A fully wired proxy, ready to run.
pub struct Application {
    config: ProxyConfig,
    config_path: Option<PathBuf>,
    registry: Arc<ChainRegistry>,
    state: AppState,
    http_listener: TcpListener,
    admin_listener: Option<TcpListener>,
    sink_writer: Option<SinkWriter>,
    shutdown: Arc<Shutdown>,
}

impl Application {
    /// Build every subsystem and bind the listeners. Nothing runs yet.
    pub async fn bootstrap(
        config: ProxyConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self, StartupError> {
        if config.observability.metrics_enabled {
            match config.observability.metrics_address.parse::<SocketAddr>() {
                Ok(addr) => metrics::init_metrics(addr),
                Err(e) => tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                ),
            }
        }

        let mut sink_writer = None;
        let sink: Arc<dyn HealthSink> = match &config.persistence.health_log_path {
            Some(path) => {
                let (sink, writer) =
                    JsonlSink::open(Path::new(path), config.persistence.buffer_size)
                        .await
                        .map_err(|source| StartupError::HealthLog {
                            path: path.clone(),
                            source,
                        })?;
                sink_writer = Some(writer);
                Arc::new(sink)
            }
            None => Arc::new(TracingSink),
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!("chain-rpc-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let registry = Arc::new(ChainRegistry::from_config(
            &config.chains,
            config.health_check.clone(),
            client.clone(),
            sink,
        )?);
        let forwarder = Arc::new(Forwarder::new(
            registry.clone(),
            client,
            Arc::new(WeightedPriority::new()),
        ));
        let state = AppState::new(
            registry.clone(),
            forwarder,
            HttpSettings::from(&config.proxy),
            config.proxy.forward_budget(),
        );

        let http_listener = bind(&config.listener.bind_address).await?;
        let admin_listener = if config.admin.enabled {
            Some(bind(&config.admin.bind_address).await?)
        } else {
            None
        };

        tracing::info!(
            chains = registry.chain_names().len(),
            bind_address = %config.listener.bind_address,
            admin_enabled = config.admin.enabled,
            "Application bootstrapped"
        );

        Ok(Self {
            config,
            config_path,
            registry,
            state,
            http_listener,
            admin_listener,
            sink_writer,
            shutdown: Arc::new(Shutdown::new()),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.http_listener.local_addr()
    }

    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
    }

    pub fn registry(&self) -> Arc<ChainRegistry> {
        self.registry.clone()
    }

    /// Trigger to stop a running application.
    pub fn shutdown(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Run until shutdown is triggered, then drain everything.
    pub async fn run(self) -> Result<(), StartupError> {
        let Self {
            config,
            config_path,
            registry,
            state,
            http_listener,
            admin_listener,
            sink_writer,
            shutdown,
        } = self;

        registry.start().await;

        // Keep the notify watcher alive for the duration of the run.
        let mut _watcher = None;
        let mut reload_task = None;
        if let Some(path) = &config_path {
            let (watcher, updates) = ConfigWatcher::new(path, &config);
            match watcher.run() {
                Ok(w) => {
                    _watcher = Some(w);
                    reload_task = Some(spawn_reloader(
                        registry.clone(),
                        state.clone(),
                        updates,
                        shutdown.subscribe(),
                    ));
                }
                Err(e) => tracing::warn!(error = %e, "Config hot reload unavailable"),
            }
        }

        let admin_task = admin_listener.map(|listener| {
            let admin_state = AdminState {
                registry: registry.clone(),
                api_key: Arc::from(config.admin.api_key.as_str()),
            };
            tokio::spawn(run_admin_server(
                listener,
                admin_state,
                shutdown.subscribe(),
            ))
        });

        let server = HttpServer::new(state, &config.proxy);
        let served = server.run(http_listener, shutdown.subscribe()).await;
        // A failed server takes the rest down with it.
        shutdown.trigger();

        if let Some(task) = admin_task {
            match task.await {
                Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
                Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
                Ok(Ok(())) => {}
            }
        }
        if let Some(task) = reload_task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Config reload task panicked");
            }
        }

        registry.stop().await;
        drop(registry);

        if let Some(writer) = sink_writer {
            writer.finish(SINK_DRAIN_GRACE).await;
        }

        tracing::info!("Shutdown complete");
        served.map_err(StartupError::from)
    }
}

async fn bind(addr: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })
}

fn spawn_reloader(
    registry: Arc<ChainRegistry>,
    state: AppState,
    mut updates: mpsc::UnboundedReceiver<ProxyConfig>,
    mut shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let config = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                update = updates.recv() => match update {
                    Some(config) => config,
                    None => break,
                },
            };

            match registry
                .reconfigure(&config.chains, config.health_check.clone())
                .await
            {
                Ok(()) => {
                    state.update_settings(HttpSettings::from(&config.proxy));
                    tracing::info!(chains = config.chains.len(), "Configuration reloaded");
                }
                Err(e) => tracing::error!(error = %e, "Rejected reloaded configuration"),
            }
        }
    })
}
