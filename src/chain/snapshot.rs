//! Read-only health views, recomputed on every query.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::chain::endpoint::Endpoint;
use crate::chain::model::Chain;
use crate::health::state::{EndpointRuntime, HealthState};

/// Point-in-time view of one endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub weight: u32,
    pub enabled: bool,
    pub chain: String,
    pub healthy: bool,
    pub state: HealthState,
    pub last_checked_at_ms: Option<u64>,
    pub response_time_ms: u64,
    pub block_number: Option<String>,
    pub consecutive_failures: u32,
}

impl EndpointStatus {
    pub(crate) fn new(endpoint: &Endpoint, runtime: &EndpointRuntime) -> Self {
        Self {
            id: endpoint.id(),
            name: endpoint.name().to_string(),
            url: endpoint.url().to_string(),
            weight: endpoint.weight(),
            enabled: endpoint.enabled(),
            chain: endpoint.chain().to_string(),
            healthy: runtime.is_healthy(),
            state: runtime.state,
            last_checked_at_ms: runtime.last_checked_at.map(unix_millis),
            response_time_ms: runtime.response_time_ms,
            block_number: runtime.last_block_number.clone(),
            consecutive_failures: runtime.consecutive_failures,
        }
    }
}

/// Health of one chain's endpoint set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainHealthSnapshot {
    pub chain: Chain,
    pub healthy_endpoints: Vec<EndpointStatus>,
    pub unhealthy_endpoints: Vec<EndpointStatus>,
    pub total_endpoints: usize,
    pub healthy_count: usize,
    /// URL of the first enabled healthy endpoint, in configuration order.
    #[serde(rename = "currentRPC")]
    pub current_rpc: Option<String>,
}

impl ChainHealthSnapshot {
    pub fn new<'a>(chain: &Chain, endpoints: impl IntoIterator<Item = &'a Endpoint>) -> Self {
        let mut healthy_endpoints = Vec::new();
        let mut unhealthy_endpoints = Vec::new();
        let mut current_rpc = None;

        for endpoint in endpoints {
            // One lock acquisition per endpoint keeps each entry consistent.
            let status = endpoint.status();
            if status.healthy {
                if current_rpc.is_none() && status.enabled {
                    current_rpc = Some(status.url.clone());
                }
                healthy_endpoints.push(status);
            } else {
                unhealthy_endpoints.push(status);
            }
        }

        let healthy_count = healthy_endpoints.len();
        Self {
            chain: chain.clone(),
            total_endpoints: healthy_count + unhealthy_endpoints.len(),
            healthy_count,
            healthy_endpoints,
            unhealthy_endpoints,
            current_rpc,
        }
    }
}

/// Overall proxy verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyHealth {
    Healthy,
    Unhealthy,
}

/// Roll-up across every registered chain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChainStatus {
    pub proxy: ProxyHealth,
    pub total_chains: usize,
    pub healthy_chains: usize,
    pub chains: BTreeMap<String, ChainHealthSnapshot>,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

impl MultiChainStatus {
    pub fn from_snapshots(chains: BTreeMap<String, ChainHealthSnapshot>) -> Self {
        let healthy_chains = chains.values().filter(|s| s.healthy_count > 0).count();
        Self {
            proxy: if healthy_chains > 0 {
                ProxyHealth::Healthy
            } else {
                ProxyHealth::Unhealthy
            },
            total_chains: chains.len(),
            healthy_chains,
            chains,
            timestamp_ms: unix_millis(SystemTime::now()),
        }
    }
}

pub(crate) fn unix_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
