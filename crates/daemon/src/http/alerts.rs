// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;
use sentinel_core::AlertStatus;
use sentinel_drivers::{MuxDriver, ServiceManager};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, no_content, ApiError};
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    status: Option<String>,
}

/// `GET /api/ops/alerts?status=`
pub async fn list<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            AlertStatus::parse(s)
                .ok_or_else(|| ApiError::invalid(format!("unknown alert status: {s}")))
        })
        .transpose()?;
    let alerts = state.store.list_alerts(status);
    Ok(data(json!({ "alerts": alerts })))
}

/// `POST /api/ops/alerts/{id}/ack`
pub async fn ack<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (alert, timeline) = state.orchestrator.ack_alert(&id, Utc::now())?;
    Ok(data(json!({ "alert": alert, "timeline": timeline })))
}

/// `DELETE /api/ops/alerts/{id}` — resolved alerts only.
pub async fn remove<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.store.delete_alert(&id)?;
    Ok(no_content())
}
