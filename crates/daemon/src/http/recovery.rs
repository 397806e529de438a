// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery handlers. All answer 503 when recovery is disabled in config.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use sentinel_core::RestoreOptions;
use sentinel_drivers::{MuxDriver, ServiceManager};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, data_with, ApiError, ApiJson};
use super::AppState;

const DEFAULT_SNAPSHOT_LIMIT: usize = 20;
const MAX_SNAPSHOT_LIMIT: usize = 100;

/// `GET /api/recovery/overview`
pub async fn overview<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Result<Response, ApiError> {
    Ok(data(state.recovery()?.overview()))
}

/// `GET /api/recovery/sessions`
pub async fn sessions<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Result<Response, ApiError> {
    Ok(data(json!({
        "sessions": state.recovery()?.list_killed_sessions(),
    })))
}

/// `POST /api/recovery/sessions/{name}/archive`
pub async fn archive<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let archived = state.recovery()?.archive_session(&name, Utc::now())?;
    Ok(data(json!({ "session": archived })))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotsQuery {
    #[serde(default)]
    limit: Option<i64>,
}

/// `GET /api/recovery/sessions/{name}/snapshots`
pub async fn snapshots<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(name): Path<String>,
    Query(query): Query<SnapshotsQuery>,
) -> Result<Response, ApiError> {
    let limit = sentinel_core::validate::clamp_limit(
        query.limit,
        DEFAULT_SNAPSHOT_LIMIT,
        MAX_SNAPSHOT_LIMIT,
    );
    let snapshots = state.recovery()?.list_snapshots(&name, limit)?;
    Ok(data(json!({ "snapshots": snapshots })))
}

/// `GET /api/recovery/snapshots/{id}`
pub async fn snapshot<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = state.recovery()?.get_snapshot(&id)?;
    Ok(data(json!({ "snapshot": snapshot })))
}

/// `POST /api/recovery/snapshots/{id}/restore` — enqueue an async restore.
pub async fn restore<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
    ApiJson(options): ApiJson<RestoreOptions>,
) -> Result<Response, ApiError> {
    let job = state.recovery()?.restore_async(&id, options, Utc::now())?;
    Ok(data_with(StatusCode::ACCEPTED, json!({ "job": job })))
}

/// `GET /api/recovery/jobs/{id}`
pub async fn job<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = state.recovery()?.get_job(&id)?;
    Ok(data(json!({ "job": job })))
}
