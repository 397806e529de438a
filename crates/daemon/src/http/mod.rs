// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: router, shared state, auth middleware, handlers.

pub mod activity;
pub mod alerts;
pub mod auth;
pub mod envelope;
pub mod guardrails;
pub mod meta;
pub mod recovery;
pub mod runbooks;
pub mod schedules;
pub mod services;
pub mod sessions;
pub mod storage;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Router;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use sentinel_drivers::{MuxDriver, ServiceManager};
use sentinel_engine::{
    ActivityPipeline, GuardrailService, Hub, MuxService, Orchestrator, RecoveryController,
    RunbookEngine, ScheduleService, ShellExecutor,
};
use sentinel_store::Store;

use crate::config::SentinelConfig;

/// Request bodies are capped at 1 MiB.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Upper bound on any single request; driver calls are far faster.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(8);

/// A terminal's reported viewing position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub terminal_id: String,
    pub session: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_id: Option<String>,
    pub visible: bool,
    pub focused: bool,
    pub updated_at: DateTime<Utc>,
}

/// Shared state behind every handler.
pub struct AppState<M: MuxDriver, S: ServiceManager> {
    pub config: RwLock<SentinelConfig>,
    pub config_path: Option<PathBuf>,
    pub store: Store,
    pub hub: Hub,
    pub mux: MuxService<M>,
    pub services: S,
    pub guardrail: Arc<GuardrailService>,
    pub orchestrator: Orchestrator,
    pub activity: ActivityPipeline,
    pub engine: RunbookEngine,
    pub schedules: ScheduleService,
    /// Absent when recovery is disabled in config; handlers answer 503.
    pub recovery: Option<RecoveryController>,
    pub presence: Mutex<HashMap<String, Presence>>,
    pub tracker: TaskTracker,
    pub cancel: CancellationToken,
    pub started_at: Instant,
}

impl<M: MuxDriver, S: ServiceManager> AppState<M, S> {
    /// Assemble the full component graph over a store and drivers.
    pub fn assemble(
        config: SentinelConfig,
        config_path: Option<PathBuf>,
        store: Store,
        mux_driver: M,
        service_manager: S,
    ) -> Arc<Self> {
        let hub = Hub::new();
        let tracker = TaskTracker::new();
        let cancel = CancellationToken::new();
        let guardrail = Arc::new(GuardrailService::new(store.clone()));
        let orchestrator = Orchestrator::new(store.clone(), hub.clone());
        let engine = RunbookEngine::new(
            store.clone(),
            hub.clone(),
            orchestrator.clone(),
            Arc::new(ShellExecutor::new()),
        );
        let schedules = ScheduleService::new(
            store.clone(),
            engine.clone(),
            hub.clone(),
            tracker.clone(),
            cancel.clone(),
        );
        let recovery = config
            .recovery_enabled
            .then(|| RecoveryController::new(store.clone(), hub.clone()));
        let mux = MuxService::new(
            mux_driver,
            store.clone(),
            Arc::clone(&guardrail),
            hub.clone(),
        );
        let activity = ActivityPipeline::new(store.clone(), hub.clone());

        Arc::new(Self {
            config: RwLock::new(config),
            config_path,
            store,
            hub,
            mux,
            services: service_manager,
            guardrail,
            orchestrator,
            activity,
            engine,
            schedules,
            recovery,
            presence: Mutex::new(HashMap::new()),
            tracker,
            cancel,
            started_at: Instant::now(),
        })
    }

    /// The recovery controller, or a 503 when disabled.
    pub fn recovery(&self) -> Result<&RecoveryController, envelope::ApiError> {
        self.recovery
            .as_ref()
            .ok_or_else(|| envelope::ApiError::unavailable("recovery is disabled"))
    }
}

/// Read the confirmation marker: `X-Sentinel-Confirmed: 1` header or
/// `confirmed=true` query parameter.
pub(crate) fn confirmed_marker(headers: &axum::http::HeaderMap, query: &str) -> bool {
    if headers
        .get("x-sentinel-confirmed")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
    {
        return true;
    }
    query
        .split('&')
        .any(|pair| pair == "confirmed=true" || pair == "confirmed=1")
}

/// Auth middleware: origin first, then token. `/api/meta` stays open so
/// the UI can discover whether a token is required.
async fn guard<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (token, origins) = {
        let config = state.config.read();
        (config.auth_token.clone(), config.allowed_origins.clone())
    };

    if let Err(e) = auth::check_origin(req.headers(), &origins) {
        return e.into_response();
    }
    if req.uri().path() != "/api/meta" {
        if let Err(e) = auth::check_token(req.headers(), token.as_deref()) {
            return e.into_response();
        }
    }
    next.run(req).await
}

/// Build the full API router.
pub fn build_router<M: MuxDriver, S: ServiceManager>(state: Arc<AppState<M, S>>) -> Router {
    Router::new()
        // Meta
        .route("/api/meta", get(meta::meta::<M, S>))
        .route("/api/fs/suggest", get(meta::suggest::<M, S>))
        // Multiplexer sessions
        .route(
            "/api/tmux/sessions",
            get(sessions::list::<M, S>).post(sessions::create::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}",
            axum::routing::patch(sessions::patch::<M, S>).delete(sessions::kill::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/windows",
            get(sessions::windows::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/panes",
            get(sessions::panes::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/new-window",
            post(sessions::new_window::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/kill-window",
            post(sessions::kill_window::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/kill-pane",
            post(sessions::kill_pane::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/split-pane",
            post(sessions::split_pane::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/select-window",
            post(sessions::select_window::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/select-pane",
            post(sessions::select_pane::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/rename-window",
            post(sessions::rename_window::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/rename-pane",
            post(sessions::rename_pane::<M, S>),
        )
        .route(
            "/api/tmux/sessions/{session}/seen",
            post(activity::seen::<M, S>),
        )
        // Activity
        .route("/api/tmux/activity/delta", get(activity::delta::<M, S>))
        .route("/api/tmux/activity/stats", get(activity::stats::<M, S>))
        .route("/api/tmux/timeline", get(activity::timeline::<M, S>))
        .route("/api/tmux/presence", put(activity::presence::<M, S>))
        // Ops: services
        .route("/api/ops/overview", get(services::overview::<M, S>))
        .route(
            "/api/ops/services",
            get(services::list::<M, S>).post(services::register::<M, S>),
        )
        .route(
            "/api/ops/services/{service}",
            delete(services::unregister::<M, S>),
        )
        .route(
            "/api/ops/services/{service}/status",
            get(services::status::<M, S>),
        )
        .route(
            "/api/ops/services/{service}/logs",
            get(services::logs::<M, S>),
        )
        .route(
            "/api/ops/services/{service}/action",
            post(services::action::<M, S>),
        )
        .route("/api/ops/unit/status", get(services::unit_status::<M, S>))
        .route("/api/ops/unit/logs", get(services::unit_logs::<M, S>))
        .route("/api/ops/unit/action", post(services::unit_action::<M, S>))
        // Ops: alerts
        .route("/api/ops/alerts", get(alerts::list::<M, S>))
        .route("/api/ops/alerts/{id}/ack", post(alerts::ack::<M, S>))
        .route("/api/ops/alerts/{id}", delete(alerts::remove::<M, S>))
        // Ops: runbooks and jobs
        .route(
            "/api/ops/runbooks",
            get(runbooks::list::<M, S>).post(runbooks::create::<M, S>),
        )
        .route(
            "/api/ops/runbooks/{id}",
            get(runbooks::get_one::<M, S>)
                .put(runbooks::update::<M, S>)
                .delete(runbooks::remove::<M, S>),
        )
        .route("/api/ops/runbooks/{id}/run", post(runbooks::run::<M, S>))
        .route("/api/ops/jobs", get(runbooks::jobs::<M, S>))
        .route(
            "/api/ops/jobs/{id}",
            get(runbooks::job::<M, S>).delete(runbooks::delete_job::<M, S>),
        )
        // Ops: schedules
        .route(
            "/api/ops/schedules",
            get(schedules::list::<M, S>).post(schedules::create::<M, S>),
        )
        .route(
            "/api/ops/schedules/{id}",
            get(schedules::get_one::<M, S>)
                .put(schedules::update::<M, S>)
                .delete(schedules::remove::<M, S>),
        )
        .route(
            "/api/ops/schedules/{id}/trigger",
            post(schedules::trigger::<M, S>),
        )
        // Ops: guardrails
        .route(
            "/api/ops/guardrails/rules",
            get(guardrails::list::<M, S>).post(guardrails::create::<M, S>),
        )
        .route(
            "/api/ops/guardrails/rules/{id}",
            axum::routing::patch(guardrails::patch::<M, S>).delete(guardrails::remove::<M, S>),
        )
        .route(
            "/api/ops/guardrails/evaluate",
            post(guardrails::evaluate::<M, S>),
        )
        .route("/api/ops/guardrails/audit", get(guardrails::audit::<M, S>))
        // Ops: storage + config
        .route("/api/ops/storage", get(storage::stats::<M, S>))
        .route(
            "/api/ops/storage/{resource}/flush",
            post(storage::flush::<M, S>),
        )
        .route(
            "/api/ops/config",
            get(storage::config_get::<M, S>).patch(storage::config_patch::<M, S>),
        )
        // Recovery
        .route("/api/recovery/overview", get(recovery::overview::<M, S>))
        .route("/api/recovery/sessions", get(recovery::sessions::<M, S>))
        .route(
            "/api/recovery/sessions/{name}/archive",
            post(recovery::archive::<M, S>),
        )
        .route(
            "/api/recovery/sessions/{name}/snapshots",
            get(recovery::snapshots::<M, S>),
        )
        .route(
            "/api/recovery/snapshots/{id}",
            get(recovery::snapshot::<M, S>),
        )
        .route(
            "/api/recovery/snapshots/{id}/restore",
            post(recovery::restore::<M, S>),
        )
        .route("/api/recovery/jobs/{id}", get(recovery::job::<M, S>))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), guard::<M, S>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
