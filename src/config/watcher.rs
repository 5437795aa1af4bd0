//! Configuration file watcher for hot reload.
//!
//! Every accepted reload replaces all chains in the registry and resets
//! endpoint health to Unknown, so reloads that leave the effective config
//! unchanged are not forwarded. Editor saves that write a temp file and
//! rename it over the original are caught by watching the parent directory.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Watches the config file and sends every changed, valid config.
pub struct ConfigWatcher {
    path: PathBuf,
    current: Option<Value>,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// `current` is the running config; reloads equal to it are dropped.
    pub fn new(
        path: &Path,
        current: &ProxyConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current: fingerprint(current),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// Configs that fail to load or validate are logged and dropped; the
    /// running configuration stays in place.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;
        let file_name = path.file_name().map(OsString::from);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                let touches_config = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(OsString::from) == file_name);
                if !touches_config || !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                match load_config(&reload_path) {
                    Ok(config) => {
                        let next = fingerprint(&config);
                        if next.is_some() && next == current {
                            tracing::debug!(
                                path = %reload_path.display(),
                                "Config file touched but unchanged"
                            );
                            return;
                        }
                        tracing::info!(
                            path = %reload_path.display(),
                            chains = config.chains.len(),
                            "Config file changed, reloading"
                        );
                        current = next;
                        let _ = update_tx.send(config);
                    }
                    Err(e) => tracing::error!(
                        path = %reload_path.display(),
                        error = %e,
                        "Failed to reload config, keeping current configuration"
                    ),
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Comparable form of a config. `None` if it cannot be serialized, which
/// makes every reload count as a change.
fn fingerprint(config: &ProxyConfig) -> Option<Value> {
    serde_json::to_value(config).ok()
}
