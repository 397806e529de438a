// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage introspection, flush, and ops-config handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use chrono::Utc;
use sentinel_drivers::{MuxDriver, ServiceManager};
use sentinel_store::StorageResource;
use serde_json::json;

use super::envelope::{data, ApiError, ApiJson};
use super::AppState;

/// `GET /api/ops/storage`
pub async fn stats<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Response {
    data(state.store.storage_stats())
}

/// `POST /api/ops/storage/{resource}/flush`
pub async fn flush<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(resource): Path<String>,
) -> Result<Response, ApiError> {
    let resource = StorageResource::parse(&resource)
        .ok_or_else(|| ApiError::invalid(format!("unknown storage resource: {resource}")))?;
    let dropped = state.store.flush_resource(resource, Utc::now())?;
    Ok(data(json!({
        "resource": resource.as_str(),
        "dropped": dropped,
    })))
}

/// `GET /api/ops/config`
pub async fn config_get<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Response {
    let config = state.config.read().clone();
    data(json!({ "config": config }))
}

/// `PATCH /api/ops/config` — merge fields, rewrite the file atomically,
/// and record the `config.updated` timeline marker.
pub async fn config_patch<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(patch): ApiJson<serde_json::Map<String, serde_json::Value>>,
) -> Result<Response, ApiError> {
    let merged = {
        let config = state.config.read();
        config.patched(&patch)?
    };
    if let Some(path) = &state.config_path {
        merged.save(path)?;
    }
    *state.config.write() = merged.clone();
    state.orchestrator.record_config_updated(Utc::now())?;
    Ok(data(json!({ "config": merged })))
}
