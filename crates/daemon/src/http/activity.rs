// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity handlers: delta polling, collector stats, timeline search,
//! mark-seen, and terminal presence.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;
use sentinel_core::validate;
use sentinel_core::{EventSource, Severity};
use sentinel_drivers::{MuxDriver, ServiceManager};
use sentinel_store::{SeenScope, TimelineFilter};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, ApiError, ApiJson};
use super::{AppState, Presence};
use sentinel_engine::MarkSeenRequest;

/// Delta limit cap (journal entries per poll).
const MAX_DELTA_LIMIT: usize = 1000;
const DEFAULT_DELTA_LIMIT: usize = 200;

/// Timeline limit cap.
const MAX_TIMELINE_LIMIT: usize = 500;
const DEFAULT_TIMELINE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct DeltaQuery {
    #[serde(default)]
    since: Option<u64>,
    #[serde(default)]
    limit: Option<i64>,
}

/// `GET /api/tmux/activity/delta?since=&limit=`
pub async fn delta<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<DeltaQuery>,
) -> Result<Response, ApiError> {
    let limit = validate::clamp_limit(query.limit, DEFAULT_DELTA_LIMIT, MAX_DELTA_LIMIT);
    let delta = state.activity.delta(query.since.unwrap_or(0), limit);
    Ok(data(delta))
}

/// `GET /api/tmux/activity/stats`
pub async fn stats<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Response {
    data(state.activity.stats())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQuery {
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    pane_id: Option<String>,
    #[serde(default)]
    window_index: Option<i64>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    since: Option<String>,
    #[serde(default)]
    until: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

/// `GET /api/tmux/timeline`
pub async fn timeline<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<TimelineQuery>,
) -> Result<Response, ApiError> {
    if let Some(session) = &query.session {
        validate::session_name(session)?;
    }
    if let Some(pane_id) = &query.pane_id {
        validate::pane_id(pane_id)?;
    }
    let window_index = query
        .window_index
        .map(validate::window_index)
        .transpose()?;
    let severity = query
        .severity
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            Severity::parse(s).ok_or_else(|| ApiError::invalid(format!("unknown severity: {s}")))
        })
        .transpose()?;
    let source = query
        .source
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            EventSource::parse(s).ok_or_else(|| ApiError::invalid(format!("unknown source: {s}")))
        })
        .transpose()?;
    let since = query
        .since
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(validate::rfc3339)
        .transpose()?;
    let until = query
        .until
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(validate::rfc3339)
        .transpose()?;
    let limit = validate::clamp_limit(query.limit, DEFAULT_TIMELINE_LIMIT, MAX_TIMELINE_LIMIT);

    let filter = TimelineFilter {
        query: query.q.unwrap_or_default(),
        severity,
        source,
        event_type: query.event_type.filter(|s| !s.is_empty()),
        session: query.session,
        pane_id: query.pane_id,
        window_index,
        since,
        until,
    };
    let (events, has_more) = state.activity.search_timeline(&filter, limit);
    Ok(data(json!({ "events": events, "hasMore": has_more })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeenBody {
    pub scope: SeenScope,
    #[serde(default)]
    pub window_index: Option<i64>,
    #[serde(default)]
    pub pane_id: Option<String>,
}

/// `POST /api/tmux/sessions/{session}/seen`
pub async fn seen<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<SeenBody>,
) -> Result<Response, ApiError> {
    let request = MarkSeenRequest {
        session,
        scope: body.scope,
        window_index: body.window_index,
        pane_id: body.pane_id,
    };
    let ack = state.activity.mark_seen(&request, Utc::now())?;
    Ok(data(ack))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PresenceBody {
    pub terminal_id: String,
    pub session: String,
    #[serde(default)]
    pub window_index: Option<i64>,
    #[serde(default)]
    pub pane_id: Option<String>,
    pub visible: bool,
    pub focused: bool,
}

/// `PUT /api/tmux/presence`
///
/// Records where a terminal is looking. A visible, focused pane presence
/// marks that pane seen on the operator's behalf.
pub async fn presence<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(body): ApiJson<PresenceBody>,
) -> Result<Response, ApiError> {
    validate::session_name(&body.session)?;
    let window_index = body.window_index.map(validate::window_index).transpose()?;
    if let Some(pane_id) = &body.pane_id {
        validate::pane_id(pane_id)?;
    }

    let entry = Presence {
        terminal_id: body.terminal_id.clone(),
        session: body.session.clone(),
        window_index,
        pane_id: body.pane_id.clone(),
        visible: body.visible,
        focused: body.focused,
        updated_at: Utc::now(),
    };
    state
        .presence
        .lock()
        .insert(body.terminal_id.clone(), entry);

    let mut acked = false;
    if body.visible && body.focused {
        if let Some(pane_id) = &body.pane_id {
            let request = MarkSeenRequest {
                session: body.session.clone(),
                scope: SeenScope::Pane,
                window_index: None,
                pane_id: Some(pane_id.clone()),
            };
            // A pane the store has not projected yet is fine to skip.
            if let Ok(ack) = state.activity.mark_seen(&request, Utc::now()) {
                acked = ack.acked;
            }
        }
    }

    Ok(data(json!({ "updated": true, "acked": acked })))
}
