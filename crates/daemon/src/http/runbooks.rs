// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbook and job handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use sentinel_core::{RunId, RunbookId, RunbookStep};
use sentinel_drivers::{MuxDriver, ServiceManager};
use sentinel_engine::runbook::DEFAULT_STEP_TIMEOUT;
use sentinel_engine::RunParams;
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, data_with, no_content, ApiError, ApiJson};
use super::AppState;

const DEFAULT_JOBS_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunbookBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<RunbookStep>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// `GET /api/ops/runbooks`
pub async fn list<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Response {
    data(json!({ "runbooks": state.engine.list_runbooks() }))
}

/// `POST /api/ops/runbooks`
pub async fn create<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(body): ApiJson<RunbookBody>,
) -> Result<Response, ApiError> {
    let runbook = state.engine.create_runbook(
        &body.name,
        &body.description,
        body.steps,
        body.enabled,
        Utc::now(),
    )?;
    Ok(data_with(StatusCode::CREATED, json!({ "runbook": runbook })))
}

/// `GET /api/ops/runbooks/{id}`
pub async fn get_one<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let runbook = state
        .engine
        .get_runbook(&id)
        .ok_or_else(|| ApiError::not_found("OPS_RUNBOOK_NOT_FOUND", format!("runbook not found: {id}")))?;
    Ok(data(json!({ "runbook": runbook })))
}

/// `PUT /api/ops/runbooks/{id}`
pub async fn update<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RunbookBody>,
) -> Result<Response, ApiError> {
    let runbook = state.engine.update_runbook(
        &RunbookId::new(id),
        &body.name,
        &body.description,
        body.steps,
        body.enabled,
        Utc::now(),
    )?;
    Ok(data(json!({ "runbook": runbook })))
}

/// `DELETE /api/ops/runbooks/{id}` — cascades schedules.
pub async fn remove<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.engine.delete_runbook(&RunbookId::new(id))?;
    Ok(no_content())
}

/// `POST /api/ops/runbooks/{id}/run` — queue a run and dispatch it on a
/// tracked task.
pub async fn run<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (run, steps) = state
        .engine
        .create_run(&RunbookId::new(id), "manual", Utc::now())?;

    let engine = state.engine.clone();
    let params = RunParams {
        run: run.clone(),
        steps,
        step_timeout: DEFAULT_STEP_TIMEOUT,
        extra_metadata: serde_json::Map::new(),
    };
    let cancel = state.cancel.child_token();
    state.tracker.spawn(async move {
        engine.run(params, cancel).await;
    });

    Ok(data_with(StatusCode::ACCEPTED, json!({ "job": run })))
}

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    #[serde(default)]
    limit: Option<i64>,
}

/// `GET /api/ops/jobs`
pub async fn jobs<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<JobsQuery>,
) -> Response {
    let limit = sentinel_core::validate::clamp_limit(query.limit, DEFAULT_JOBS_LIMIT, 500);
    data(json!({ "jobs": state.store.list_runs(limit) }))
}

/// `GET /api/ops/jobs/{id}`
pub async fn job<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let run = state
        .store
        .get_run(&id)
        .ok_or_else(|| ApiError::not_found("OPS_JOB_NOT_FOUND", format!("job not found: {id}")))?;
    Ok(data(json!({ "job": run })))
}

/// `DELETE /api/ops/jobs/{id}` — terminal jobs only.
pub async fn delete_job<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.store.delete_run(&RunId::new(id))?;
    Ok(no_content())
}
