use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::admin::AdminState;
use crate::chain::{ChainHealthSnapshot, ProxyHealth};
use crate::config::ChainConfig;
use crate::registry::RegistryError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub proxy: ProxyHealth,
    pub total_chains: usize,
    pub healthy_chains: usize,
    pub active_probers: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error(code: StatusCode, message: impl ToString) -> Response {
    (
        code,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let status = state.registry.status();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        proxy: status.proxy,
        total_chains: status.total_chains,
        healthy_chains: status.healthy_chains,
        active_probers: state.registry.active_probers().await,
    })
}

pub async fn list_chains(
    State(state): State<AdminState>,
) -> Json<BTreeMap<String, ChainHealthSnapshot>> {
    Json(state.registry.snapshot_all())
}

pub async fn get_chain(State(state): State<AdminState>, Path(name): Path<String>) -> Response {
    match state.registry.snapshot(&name) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("chain '{name}' not found")),
    }
}

/// Body: chain fields plus an `endpoints` array, same keys as the config file.
pub async fn add_chain(
    State(state): State<AdminState>,
    Json(request): Json<ChainConfig>,
) -> Response {
    let name = request.chain.name.clone();
    match state
        .registry
        .add_chain(request.chain, request.endpoints)
        .await
    {
        Ok(chain) => {
            tracing::info!(chain = %name, "Chain added via admin API");
            (StatusCode::CREATED, Json(chain.snapshot())).into_response()
        }
        Err(e @ (RegistryError::DuplicateChain(_) | RegistryError::DuplicatePath { .. })) => {
            error(StatusCode::CONFLICT, e)
        }
        Err(e @ RegistryError::Chain(_)) => error(StatusCode::BAD_REQUEST, e),
    }
}

pub async fn remove_chain(State(state): State<AdminState>, Path(name): Path<String>) -> Response {
    if state.registry.remove_chain(&name).await {
        tracing::info!(chain = %name, "Chain removed via admin API");
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, format!("chain '{name}' not found"))
    }
}
