// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiplexer session/window/pane handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use chrono::Utc;
use sentinel_drivers::{MuxDriver, ServiceManager};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, data_with, no_content, ApiError, ApiJson};
use super::{confirmed_marker, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSessionBody {
    pub name: String,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchSessionBody {
    #[serde(default)]
    pub name: Option<String>,
    /// `Some(None)` clears the icon; absent leaves it untouched.
    #[serde(default, with = "double_option")]
    pub icon: Option<Option<String>>,
}

// Distinguishes "field absent" from "field null".
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(de).map(Some)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewWindowBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WindowIndexBody {
    pub window_index: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaneIdBody {
    pub pane_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SplitPaneBody {
    pub pane_id: String,
    #[serde(default)]
    pub vertical: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameWindowBody {
    pub window_index: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenamePaneBody {
    pub pane_id: String,
    pub title: String,
}

/// `GET /api/tmux/sessions`
pub async fn list<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Result<Response, ApiError> {
    let sessions = state.mux.list_sessions().await?;
    Ok(data(json!({ "sessions": sessions })))
}

/// `POST /api/tmux/sessions`
pub async fn create<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(body): ApiJson<CreateSessionBody>,
) -> Result<Response, ApiError> {
    let cwd = body.cwd.unwrap_or_else(|| {
        let config = state.config.read();
        config.default_cwd()
    });
    let session = state
        .mux
        .create_session(&body.name, &cwd, Utc::now())
        .await?;
    Ok(data_with(StatusCode::CREATED, json!({ "session": session })))
}

/// `PATCH /api/tmux/sessions/{session}` — rename and/or set icon.
pub async fn patch<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<PatchSessionBody>,
) -> Result<Response, ApiError> {
    if body.name.is_none() && body.icon.is_none() {
        return Err(ApiError::invalid("nothing to update"));
    }
    if let Some(icon) = &body.icon {
        state.mux.set_session_icon(&session, icon.as_deref()).await?;
    }
    if let Some(new_name) = &body.name {
        state
            .mux
            .rename_session(&session, new_name, Utc::now())
            .await?;
    }
    Ok(data(json!({ "updated": true })))
}

/// `DELETE /api/tmux/sessions/{session}` — guardrail-gated kill.
pub async fn kill<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let confirmed = confirmed_marker(&headers, query.as_deref().unwrap_or(""));
    state
        .mux
        .kill_session(&session, confirmed, Utc::now())
        .await?;
    Ok(no_content())
}

/// `GET /api/tmux/sessions/{session}/windows`
pub async fn windows<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
) -> Result<Response, ApiError> {
    let windows = state.mux.list_windows(&session).await?;
    let rows: Vec<_> = windows
        .into_iter()
        .map(|w| {
            json!({
                "session": w.session,
                "windowIndex": w.index,
                "name": w.name,
                "active": w.active,
                "layout": w.layout,
                "panes": w.panes,
            })
        })
        .collect();
    Ok(data(json!({ "windows": rows })))
}

/// `GET /api/tmux/sessions/{session}/panes`
pub async fn panes<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
) -> Result<Response, ApiError> {
    let panes = state.mux.list_panes(&session).await?;
    let rows: Vec<_> = panes
        .into_iter()
        .map(|p| {
            json!({
                "paneId": p.pane_id,
                "session": p.session,
                "windowIndex": p.window_index,
                "paneIndex": p.pane_index,
                "title": p.title,
                "active": p.active,
                "currentPath": p.current_path,
                "currentCommand": p.current_command,
            })
        })
        .collect();
    Ok(data(json!({ "panes": rows })))
}

/// `POST /api/tmux/sessions/{session}/new-window`
pub async fn new_window<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<NewWindowBody>,
) -> Result<Response, ApiError> {
    let created = state
        .mux
        .new_window(&session, body.name.as_deref(), body.cwd.as_deref())
        .await?;
    Ok(data_with(StatusCode::CREATED, json!({ "window": created })))
}

/// `POST /api/tmux/sessions/{session}/kill-window`
pub async fn kill_window<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    ApiJson(body): ApiJson<WindowIndexBody>,
) -> Result<Response, ApiError> {
    let confirmed = confirmed_marker(&headers, query.as_deref().unwrap_or(""));
    state
        .mux
        .kill_window(&session, body.window_index, confirmed, Utc::now())
        .await?;
    Ok(data(json!({ "killed": true })))
}

/// `POST /api/tmux/sessions/{session}/kill-pane`
pub async fn kill_pane<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    ApiJson(body): ApiJson<PaneIdBody>,
) -> Result<Response, ApiError> {
    let confirmed = confirmed_marker(&headers, query.as_deref().unwrap_or(""));
    state
        .mux
        .kill_pane(&session, &body.pane_id, confirmed, Utc::now())
        .await?;
    Ok(data(json!({ "killed": true })))
}

/// `POST /api/tmux/sessions/{session}/split-pane`
pub async fn split_pane<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<SplitPaneBody>,
) -> Result<Response, ApiError> {
    let pane_id = state
        .mux
        .split_pane(&session, &body.pane_id, body.vertical)
        .await?;
    Ok(data_with(StatusCode::CREATED, json!({ "paneId": pane_id })))
}

/// `POST /api/tmux/sessions/{session}/select-window`
pub async fn select_window<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<WindowIndexBody>,
) -> Result<Response, ApiError> {
    state.mux.select_window(&session, body.window_index).await?;
    Ok(data(json!({ "selected": true })))
}

/// `POST /api/tmux/sessions/{session}/select-pane`
pub async fn select_pane<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<PaneIdBody>,
) -> Result<Response, ApiError> {
    state.mux.select_pane(&session, &body.pane_id).await?;
    Ok(data(json!({ "selected": true })))
}

/// `POST /api/tmux/sessions/{session}/rename-window`
pub async fn rename_window<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<RenameWindowBody>,
) -> Result<Response, ApiError> {
    state
        .mux
        .rename_window(&session, body.window_index, &body.name)
        .await?;
    Ok(data(json!({ "renamed": true })))
}

/// `POST /api/tmux/sessions/{session}/rename-pane`
pub async fn rename_pane<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(session): Path<String>,
    ApiJson(body): ApiJson<RenamePaneBody>,
) -> Result<Response, ApiError> {
    state
        .mux
        .rename_pane(&session, &body.pane_id, &body.title)
        .await?;
    Ok(data(json!({ "renamed": true })))
}
