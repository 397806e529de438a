//! Shared harness for HTTP-level specs.

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use sentinel_daemon::config::SentinelConfig;
use sentinel_daemon::http::{build_router, AppState};
use sentinel_drivers::{FakeMuxDriver, FakeServiceManager};
use sentinel_store::{
    PaneObservation, SessionMeta, SessionObservation, Store, WindowObservation,
};

pub type FakeState = Arc<AppState<FakeMuxDriver, FakeServiceManager>>;

pub struct Harness {
    pub _dir: tempfile::TempDir,
    pub state: FakeState,
    pub server: TestServer,
    pub mux: FakeMuxDriver,
    pub services: FakeServiceManager,
}

pub fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).single().unwrap()
}

pub fn harness() -> Harness {
    harness_with(SentinelConfig::default())
}

pub fn harness_with(config: SentinelConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let mux = FakeMuxDriver::new();
    let services = FakeServiceManager::new();
    let state = AppState::assemble(config, None, store, mux.clone(), services.clone());
    let server = TestServer::new(build_router(Arc::clone(&state))).unwrap();
    Harness {
        _dir: dir,
        state,
        server,
        mux,
        services,
    }
}

/// Seed the store with the canonical "dev" session projection: one window,
/// one unread pane carrying a watchtower tail, and pinned metadata.
pub fn seed_dev_projection(store: &Store) {
    store
        .upsert_session(
            SessionObservation {
                name: "dev".to_string(),
                attached: 1,
                windows: 2,
                panes: 3,
                activity_at: Some(at()),
            },
            at(),
        )
        .unwrap();
    store
        .upsert_window(
            WindowObservation {
                session: "dev".to_string(),
                window_index: 0,
                name: "main".to_string(),
                active: true,
                layout: "tiled".to_string(),
                window_activity_at: None,
            },
            at(),
        )
        .unwrap();
    store
        .upsert_pane(
            PaneObservation {
                pane_id: "%1".to_string(),
                session: "dev".to_string(),
                window_index: 0,
                pane_index: 0,
                title: String::new(),
                active: true,
                tty: String::new(),
                current_path: "/home/op".to_string(),
                start_command: "zsh".to_string(),
                current_command: "zsh".to_string(),
                tail_preview: Some("tail from watchtower".to_string()),
                tail_hash: Some("h1".to_string()),
                captured_at: at(),
            },
            at(),
        )
        .unwrap();
    store
        .upsert_pane(
            PaneObservation {
                pane_id: "%2".to_string(),
                session: "dev".to_string(),
                window_index: 0,
                pane_index: 1,
                title: String::new(),
                active: false,
                tty: String::new(),
                current_path: "/home/op".to_string(),
                start_command: "zsh".to_string(),
                current_command: "vim".to_string(),
                tail_preview: Some("editing".to_string()),
                tail_hash: Some("h2".to_string()),
                captured_at: at(),
            },
            at(),
        )
        .unwrap();
    store
        .set_session_meta(SessionMeta {
            name: "dev".to_string(),
            hash: "h-fixed".to_string(),
            icon: Some("bolt".to_string()),
            last_content: None,
        })
        .unwrap();
}

/// Poll until `check` passes or the timeout elapses.
pub async fn wait_until(check: impl Fn() -> bool, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached before timeout"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
