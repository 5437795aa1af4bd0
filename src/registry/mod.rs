//! Chain registry and prober orchestration.
//!
//! # Data Flow
//! ```text
//! ProxyConfig.chains / admin API
//!     → ChainState (validated)
//!     → chain map (RwLock, short sections only)
//!     → one ChainProber per probeable chain (ProberSet, async mutex)
//!
//! Request path and status queries:
//!     → read lock, clone Arc<ChainState>, release
//!     → per-endpoint locks for health
//! ```
//!
//! # Design Decisions
//! - Control operations (start, stop, add, remove, reconfigure) are
//!   serialized by the prober mutex; readers never wait on a drain
//! - Removal stops and joins the chain's prober before the chain leaves
//!   the map, so nothing mutates a removed chain afterwards
//! - Reconfigure replaces every chain; endpoints start over as Unknown

use futures_util::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::chain::{
    Chain, ChainError, ChainHealthSnapshot, ChainState, Endpoint, EndpointConfig,
    MultiChainStatus,
};
use crate::config::{ChainConfig, HealthCheckConfig};
use crate::health::{ChainProber, ProberHandle};
use crate::persistence::HealthSink;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("chain '{0}' is already registered")]
    DuplicateChain(String),

    #[error("rpc path '{path}' is already used by chain '{existing}'")]
    DuplicatePath { path: String, existing: String },
}

struct ProberSet {
    running: bool,
    handles: HashMap<String, ProberHandle>,
    health_config: HealthCheckConfig,
}

/// Owns every registered chain and its prober.
pub struct ChainRegistry {
    chains: RwLock<HashMap<String, Arc<ChainState>>>,
    probers: Mutex<ProberSet>,
    client: reqwest::Client,
    sink: Arc<dyn HealthSink>,
}

impl ChainRegistry {
    pub fn new(
        health_config: HealthCheckConfig,
        client: reqwest::Client,
        sink: Arc<dyn HealthSink>,
    ) -> Self {
        Self {
            chains: RwLock::new(HashMap::new()),
            probers: Mutex::new(ProberSet {
                running: false,
                handles: HashMap::new(),
                health_config,
            }),
            client,
            sink,
        }
    }

    /// Build a registry from configured chains. Probing starts with
    /// [`ChainRegistry::start`].
    pub fn from_config(
        chains: &[ChainConfig],
        health_config: HealthCheckConfig,
        client: reqwest::Client,
        sink: Arc<dyn HealthSink>,
    ) -> Result<Self, RegistryError> {
        let registry = Self::new(health_config, client, sink);
        let states = build_states(chains)?;
        *registry.write_chains() = states;
        Ok(registry)
    }

    /// Launch one prober per enabled chain with endpoints. No-op when
    /// already running.
    pub async fn start(&self) {
        let mut probers = self.probers.lock().await;
        if probers.running {
            return;
        }
        probers.running = true;

        let chains: Vec<_> = self.read_chains().values().cloned().collect();
        for chain in chains {
            self.spawn_prober(&mut probers, chain);
        }
        tracing::info!(probers = probers.handles.len(), "Chain registry started");
    }

    /// Stop every prober and wait for all of them to exit.
    pub async fn stop(&self) {
        let mut probers = self.probers.lock().await;
        probers.running = false;

        let handles: Vec<_> = probers.handles.drain().map(|(_, h)| h).collect();
        let count = handles.len();
        join_all(handles.into_iter().map(ProberHandle::stop)).await;
        tracing::info!(stopped = count, "Chain registry stopped");
    }

    /// Register a chain. Starts probing immediately when the registry runs.
    pub async fn add_chain(
        &self,
        chain: Chain,
        endpoints: Vec<EndpointConfig>,
    ) -> Result<Arc<ChainState>, RegistryError> {
        let state = Arc::new(ChainState::new(chain, endpoints)?);
        let mut probers = self.probers.lock().await;

        {
            let mut chains = self.write_chains();
            check_conflicts(&chains, &state)?;
            chains.insert(state.name().to_string(), state.clone());
        }
        tracing::info!(
            chain = %state.name(),
            endpoints = state.endpoints().len(),
            "Chain added"
        );

        if probers.running {
            self.spawn_prober(&mut probers, state.clone());
        }
        Ok(state)
    }

    /// Stop the chain's prober, then drop the chain. Returns whether the
    /// chain existed.
    pub async fn remove_chain(&self, name: &str) -> bool {
        let mut probers = self.probers.lock().await;

        if let Some(handle) = probers.handles.remove(name) {
            handle.stop().await;
        }
        let removed = self.write_chains().remove(name).is_some();
        if removed {
            tracing::info!(chain = %name, "Chain removed");
        }
        removed
    }

    /// Replace every chain and the health settings in one step.
    ///
    /// The new set is validated before anything is stopped; on error the
    /// current chains keep running.
    pub async fn reconfigure(
        &self,
        chains: &[ChainConfig],
        health_config: HealthCheckConfig,
    ) -> Result<(), RegistryError> {
        let states = build_states(chains)?;
        let mut probers = self.probers.lock().await;

        let handles: Vec<_> = probers.handles.drain().map(|(_, h)| h).collect();
        join_all(handles.into_iter().map(ProberHandle::stop)).await;

        let count = states.len();
        *self.write_chains() = states;
        probers.health_config = health_config;

        if probers.running {
            let chains: Vec<_> = self.read_chains().values().cloned().collect();
            for chain in chains {
                self.spawn_prober(&mut probers, chain);
            }
        }
        tracing::info!(chains = count, "Chain registry reconfigured");
        Ok(())
    }

    /// Enabled and healthy endpoints in configuration order. Empty for
    /// unknown chains.
    pub fn healthy_endpoints(&self, name: &str) -> Vec<Arc<Endpoint>> {
        self.chain(name)
            .map(|c| c.healthy_endpoints())
            .unwrap_or_default()
    }

    /// All endpoints of a chain.
    pub fn endpoints(&self, name: &str) -> Option<Vec<Arc<Endpoint>>> {
        self.chain(name).map(|c| c.endpoints().to_vec())
    }

    pub fn chain(&self, name: &str) -> Option<Arc<ChainState>> {
        self.read_chains().get(name).cloned()
    }

    /// Registered chain names, sorted.
    pub fn chain_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read_chains().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn snapshot(&self, name: &str) -> Option<ChainHealthSnapshot> {
        self.chain(name).map(|c| c.snapshot())
    }

    pub fn snapshot_all(&self) -> BTreeMap<String, ChainHealthSnapshot> {
        let chains: Vec<_> = self.read_chains().values().cloned().collect();
        chains
            .into_iter()
            .map(|c| (c.name().to_string(), c.snapshot()))
            .collect()
    }

    pub fn status(&self) -> MultiChainStatus {
        MultiChainStatus::from_snapshots(self.snapshot_all())
    }

    /// Map a `/rpc/{segment}` path segment to a chain name. The rpc path
    /// wins over a chain of the same name.
    pub fn resolve_path(&self, segment: &str) -> Option<String> {
        let chains = self.read_chains();
        chains
            .values()
            .find(|c| c.chain().rpc_path == segment)
            .or_else(|| chains.get(segment))
            .map(|c| c.name().to_string())
    }

    /// Number of prober tasks still running.
    pub async fn active_probers(&self) -> usize {
        self.probers
            .lock()
            .await
            .handles
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub async fn health_config(&self) -> HealthCheckConfig {
        self.probers.lock().await.health_config.clone()
    }

    fn spawn_prober(&self, probers: &mut ProberSet, chain: Arc<ChainState>) {
        if !chain.is_probeable() {
            tracing::warn!(
                chain = %chain.name(),
                enabled = chain.chain().enabled,
                endpoints = chain.endpoints().len(),
                "Chain not probed"
            );
            return;
        }
        let name = chain.name().to_string();
        let handle = ChainProber::new(
            chain,
            probers.health_config.clone(),
            self.client.clone(),
            self.sink.clone(),
        )
        .spawn();
        probers.handles.insert(name, handle);
    }

    fn read_chains(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<ChainState>>> {
        self.chains.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_chains(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<ChainState>>> {
        self.chains.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_states(
    chains: &[ChainConfig],
) -> Result<HashMap<String, Arc<ChainState>>, RegistryError> {
    let mut states = HashMap::new();
    for entry in chains {
        if !entry.chain.enabled {
            tracing::info!(chain = %entry.chain.name, "Skipping disabled chain");
            continue;
        }
        let state = Arc::new(ChainState::new(
            entry.chain.clone(),
            entry.endpoints.clone(),
        )?);
        check_conflicts(&states, &state)?;
        states.insert(state.name().to_string(), state);
    }
    Ok(states)
}

fn check_conflicts(
    chains: &HashMap<String, Arc<ChainState>>,
    candidate: &ChainState,
) -> Result<(), RegistryError> {
    if chains.contains_key(candidate.name()) {
        return Err(RegistryError::DuplicateChain(candidate.name().to_string()));
    }
    // `resolve_path` tries rpc paths before names, so a name equal to
    // another chain's path would be unreachable.
    let path = &candidate.chain().rpc_path;
    for existing in chains.values() {
        let taken = if &existing.chain().rpc_path == path || existing.name() == path {
            Some(path.as_str())
        } else if existing.chain().rpc_path == candidate.name() {
            Some(candidate.name())
        } else {
            None
        };
        if let Some(taken) = taken {
            return Err(RegistryError::DuplicatePath {
                path: taken.to_string(),
                existing: existing.name().to_string(),
            });
        }
    }
    Ok(())
}
