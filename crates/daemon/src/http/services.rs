// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-plane handlers: overview, unit lifecycle, logs, registration.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use sentinel_core::{CustomService, ServiceScope};
use sentinel_drivers::{MuxDriver, ServiceAction, ServiceManager};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, data_with, no_content, ApiError, ApiJson};
use super::AppState;

const DEFAULT_LOG_LINES: u32 = 100;
const MAX_LOG_LINES: u32 = 1000;

/// Resolve a registered service name to its unit + scope.
fn resolve<M: MuxDriver, S: ServiceManager>(
    state: &AppState<M, S>,
    service: &str,
) -> Result<CustomService, ApiError> {
    state
        .store
        .get_service(service)
        .ok_or_else(|| ApiError::not_found("OPS_SERVICE_NOT_FOUND", format!("service not found: {service}")))
}

fn parse_scope(scope: Option<&str>) -> Result<ServiceScope, ApiError> {
    match scope {
        None => Ok(ServiceScope::System),
        Some(value) => ServiceScope::parse(value)
            .ok_or_else(|| ApiError::invalid(format!("unknown scope: {value}"))),
    }
}

/// `GET /api/ops/overview`
pub async fn overview<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Result<Response, ApiError> {
    let overview = state.services.overview().await?;
    let open_alerts = state
        .store
        .list_alerts(Some(sentinel_core::AlertStatus::Open))
        .len();
    Ok(data(json!({
        "host": overview,
        "openAlerts": open_alerts,
        "globalRev": state.store.global_rev(),
    })))
}

/// `GET /api/ops/services`
pub async fn list<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Result<Response, ApiError> {
    let registered = state.store.list_services();
    let mut rows = Vec::with_capacity(registered.len());
    for service in registered {
        let status = state
            .services
            .status(&service.unit, service.scope)
            .await
            .ok();
        rows.push(json!({ "service": service, "status": status }));
    }
    Ok(data(json!({ "services": rows })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterBody {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub manager: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// `POST /api/ops/services`
pub async fn register<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> Result<Response, ApiError> {
    if body.name.trim().is_empty() || body.unit.trim().is_empty() {
        return Err(ApiError::invalid("name and unit are required"));
    }
    let scope = parse_scope(body.scope.as_deref())?;
    let service = CustomService {
        name: body.name.clone(),
        display_name: body.display_name.unwrap_or_else(|| body.name.clone()),
        manager: body.manager.unwrap_or_else(|| "systemd".to_string()),
        unit: body.unit,
        scope,
    };
    let registered = state.orchestrator.register_service(service, Utc::now())?;
    Ok(data_with(
        StatusCode::CREATED,
        json!({ "service": registered }),
    ))
}

/// `DELETE /api/ops/services/{service}`
pub async fn unregister<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(service): Path<String>,
) -> Result<Response, ApiError> {
    state.orchestrator.unregister_service(&service, Utc::now())?;
    Ok(no_content())
}

/// `GET /api/ops/services/{service}/status`
pub async fn status<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(service): Path<String>,
) -> Result<Response, ApiError> {
    let registered = resolve(&state, &service)?;
    let status = state
        .services
        .status(&registered.unit, registered.scope)
        .await?;
    Ok(data(json!({ "status": status })))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    lines: Option<u32>,
}

/// `GET /api/ops/services/{service}/logs`
pub async fn logs<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(service): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Response, ApiError> {
    let registered = resolve(&state, &service)?;
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES).min(MAX_LOG_LINES);
    let logs = state
        .services
        .logs(&registered.unit, registered.scope, lines)
        .await?;
    Ok(data(json!({ "lines": logs })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActionBody {
    pub action: String,
}

/// `POST /api/ops/services/{service}/action`
pub async fn action<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(service): Path<String>,
    ApiJson(body): ApiJson<ActionBody>,
) -> Result<Response, ApiError> {
    let registered = resolve(&state, &service)?;
    act(&state, &registered.unit, registered.scope, &body.action).await
}

#[derive(Debug, Deserialize)]
pub struct UnitQuery {
    pub unit: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// `GET /api/ops/unit/status?unit=&scope=`
pub async fn unit_status<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<UnitQuery>,
) -> Result<Response, ApiError> {
    let scope = parse_scope(query.scope.as_deref())?;
    let status = state.services.status(&query.unit, scope).await?;
    Ok(data(json!({ "status": status })))
}

#[derive(Debug, Deserialize)]
pub struct UnitLogsQuery {
    pub unit: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub lines: Option<u32>,
}

/// `GET /api/ops/unit/logs?unit=&scope=&lines=`
pub async fn unit_logs<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<UnitLogsQuery>,
) -> Result<Response, ApiError> {
    let scope = parse_scope(query.scope.as_deref())?;
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES).min(MAX_LOG_LINES);
    let logs = state.services.logs(&query.unit, scope, lines).await?;
    Ok(data(json!({ "lines": logs })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnitActionBody {
    pub unit: String,
    #[serde(default)]
    pub scope: Option<String>,
    pub action: String,
}

/// `POST /api/ops/unit/action`
pub async fn unit_action<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(body): ApiJson<UnitActionBody>,
) -> Result<Response, ApiError> {
    let scope = parse_scope(body.scope.as_deref())?;
    act(&state, &body.unit, scope, &body.action).await
}

/// Shared action path: drive the plane, then let the orchestrator couple
/// timeline + alerts + broadcast. The plane mutation is never rolled back
/// on a store failure; the error surfaces as `STORE_ERROR`.
async fn act<M: MuxDriver, S: ServiceManager>(
    state: &AppState<M, S>,
    unit: &str,
    scope: ServiceScope,
    action: &str,
) -> Result<Response, ApiError> {
    let action = ServiceAction::parse(action)?;
    let status = state.services.act(unit, scope, action).await?;
    let record = state
        .orchestrator
        .record_service_action(&status, action, Utc::now())?;
    Ok(data(json!({
        "status": status,
        "timeline": record.timeline,
        "alerts": record.alerts,
        "globalRev": record.global_rev,
    })))
}
