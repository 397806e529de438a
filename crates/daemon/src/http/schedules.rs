// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use sentinel_core::validate;
use sentinel_core::{RunbookId, ScheduleId, ScheduleKind};
use sentinel_drivers::{MuxDriver, ServiceManager};
use sentinel_engine::ScheduleSpec;
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, data_with, no_content, ApiError, ApiJson};
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScheduleBody {
    pub runbook_id: String,
    pub name: String,
    pub schedule_type: ScheduleKind,
    #[serde(default)]
    pub cron_expr: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    /// RFC3339, required for one-shots.
    #[serde(default)]
    pub run_at: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn to_spec(body: ScheduleBody) -> Result<ScheduleSpec, ApiError> {
    let run_at = body
        .run_at
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(validate::rfc3339)
        .transpose()?;
    Ok(ScheduleSpec {
        runbook_id: RunbookId::new(body.runbook_id),
        name: body.name,
        kind: body.schedule_type,
        cron_expr: body.cron_expr,
        timezone: body.timezone,
        run_at,
        enabled: body.enabled,
    })
}

/// `GET /api/ops/schedules`
pub async fn list<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Response {
    data(json!({ "schedules": state.schedules.list() }))
}

/// `POST /api/ops/schedules`
pub async fn create<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(body): ApiJson<ScheduleBody>,
) -> Result<Response, ApiError> {
    let schedule = state.schedules.create(to_spec(body)?, Utc::now())?;
    Ok(data_with(
        StatusCode::CREATED,
        json!({ "schedule": schedule }),
    ))
}

/// `GET /api/ops/schedules/{id}`
pub async fn get_one<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let schedule = state
        .schedules
        .get(&id)
        .ok_or_else(|| ApiError::not_found("SCHEDULE_NOT_FOUND", format!("schedule not found: {id}")))?;
    Ok(data(json!({ "schedule": schedule })))
}

/// `PUT /api/ops/schedules/{id}`
pub async fn update<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ScheduleBody>,
) -> Result<Response, ApiError> {
    let schedule = state.schedules.update(&id, to_spec(body)?, Utc::now())?;
    Ok(data(json!({ "schedule": schedule })))
}

/// `DELETE /api/ops/schedules/{id}`
pub async fn remove<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.schedules.delete(&ScheduleId::new(id))?;
    Ok(no_content())
}

/// `POST /api/ops/schedules/{id}/trigger` — manual fire, 202.
pub async fn trigger<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (schedule, run) = state.schedules.trigger(&id, Utc::now())?;
    Ok(data_with(
        StatusCode::ACCEPTED,
        json!({ "schedule": schedule, "job": run }),
    ))
}
