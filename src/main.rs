//! Multi-chain JSON-RPC proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http (axum) ──▶ proxy::Forwarder ──▶ load_balancer ──▶ upstream RPC
//!                  │                  │
//!                  │                  ▼
//!                  └──────────▶ registry ◀── health::ChainProber (one per chain)
//!                                     │               │
//!                                     ▼               ▼
//!                               admin API       persistence sink
//! ```

use clap::Parser;
use std::path::PathBuf;

use chain_rpc_proxy::config::load_config_or_fallback;
use chain_rpc_proxy::lifecycle::signals::wait_for_termination;
use chain_rpc_proxy::observability::logging::{init_logging, startup_subscriber};
use chain_rpc_proxy::Application;

#[derive(Debug, Parser)]
#[command(name = "chain-rpc-proxy", version, about = "Health-aware multi-chain JSON-RPC proxy")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "RPC_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = tracing::subscriber::with_default(startup_subscriber(std::io::stderr), || {
        load_config_or_fallback(cli.config.as_deref())
    })?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "chain-rpc-proxy starting");

    let app = Application::bootstrap(config, cli.config).await?;
    tracing::info!(address = %app.local_addr()?, "Listening for connections");

    let shutdown = app.shutdown();
    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.trigger();
    });

    app.run().await?;
    Ok(())
}
