//! Session plane specs: projection fallback and guardrail-gated kills.

use crate::prelude::*;
use sentinel_drivers::{MuxCall, MuxError};
use serde_json::{json, Value};

/// Driver listing fails with COMMAND_FAILED: the list endpoint still
/// answers 200 from the stored projections, including metadata.
#[tokio::test]
async fn session_list_falls_back_to_projections() {
    let h = harness();
    seed_dev_projection(&h.state.store);
    h.mux.fail(
        "list_sessions",
        MuxError::CommandFailed("tmux wedged".to_string()),
    );

    let response = h.server.get("/api/tmux/sessions").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let sessions = body["data"]["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    let row = &sessions[0];
    assert_eq!(row["name"], "dev");
    assert_eq!(row["panes"], 3);
    assert_eq!(row["lastContent"], "tail from watchtower");
    assert_eq!(row["hash"], "h-fixed");
    assert_eq!(row["icon"], "bolt");
    assert_eq!(row["unreadWindows"], 1);
    assert_eq!(row["unreadPanes"], 2);
    assert_eq!(row["rev"], h.state.store.get_session("dev").unwrap().rev);
}

#[tokio::test]
async fn create_session_round_trips() {
    let h = harness();
    let response = h
        .server
        .post("/api/tmux/sessions")
        .json(&json!({"name": "dev"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    assert_eq!(body["data"]["session"]["name"], "dev");
    assert!(h.mux.has_session("dev"));

    // Invalid names never reach the driver.
    let response = h
        .server
        .post("/api/tmux/sessions")
        .json(&json!({"name": "bad name"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

/// A confirm rule on `session.kill`: the bare DELETE is refused with 428
/// and no driver call; the marked replay succeeds with 204 and exactly one
/// driver call.
#[tokio::test]
async fn kill_session_confirm_contract() {
    let h = harness();
    h.mux.add_session("dev");
    h.state
        .guardrail
        .upsert_rule(sentinel_core::GuardrailRule {
            id: sentinel_core::RuleId::new("action.session.kill.confirm"),
            name: "confirm session kills".to_string(),
            scope: sentinel_core::GuardrailScope::Action,
            pattern: "^session\\.kill$".to_string(),
            mode: sentinel_core::GuardrailMode::Confirm,
            severity: sentinel_core::Severity::Warn,
            message: "confirm the kill".to_string(),
            enabled: true,
            priority: 10,
        })
        .unwrap();

    let response = h.server.delete("/api/tmux/sessions/dev").await;
    assert_eq!(response.status_code().as_u16(), 428);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "GUARDRAIL_CONFIRM_REQUIRED");
    assert_eq!(
        h.mux.call_count(|c| matches!(c, MuxCall::KillSession { .. })),
        0
    );
    assert!(h.mux.has_session("dev"));

    let response = h
        .server
        .delete("/api/tmux/sessions/dev")
        .add_query_param("confirmed", "true")
        .await;
    assert_eq!(response.status_code().as_u16(), 204);
    assert_eq!(
        h.mux
            .call_count(|c| matches!(c, MuxCall::KillSession { name } if name == "dev")),
        1
    );
    assert!(!h.mux.has_session("dev"));
}

#[tokio::test]
async fn kill_unknown_session_is_404() {
    let h = harness();
    let response = h.server.delete("/api/tmux/sessions/ghost").await;
    assert_eq!(response.status_code().as_u16(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn new_window_gets_sequenced_default_name() {
    let h = harness();
    h.mux.add_session("dev");

    let first: Value = h
        .server
        .post("/api/tmux/sessions/dev/new-window")
        .json(&json!({}))
        .await
        .json();
    assert_eq!(first["data"]["window"]["name"], "window-1");

    let second: Value = h
        .server
        .post("/api/tmux/sessions/dev/new-window")
        .json(&json!({}))
        .await
        .json();
    assert_eq!(second["data"]["window"]["name"], "window-2");
    assert_ne!(
        first["data"]["window"]["paneId"],
        second["data"]["window"]["paneId"]
    );
}

#[tokio::test]
async fn windows_and_panes_listing() {
    let h = harness();
    h.mux.add_session("dev");

    let body: Value = h.server.get("/api/tmux/sessions/dev/windows").await.json();
    assert_eq!(body["data"]["windows"].as_array().unwrap().len(), 1);

    let body: Value = h.server.get("/api/tmux/sessions/dev/panes").await.json();
    let panes = body["data"]["panes"].as_array().unwrap();
    assert_eq!(panes.len(), 1);
    assert!(panes[0]["paneId"].as_str().unwrap().starts_with('%'));
}

#[tokio::test]
async fn split_pane_returns_new_pane_id() {
    let h = harness();
    h.mux.add_session("dev");
    let panes: Value = h.server.get("/api/tmux/sessions/dev/panes").await.json();
    let pane_id = panes["data"]["panes"][0]["paneId"].as_str().unwrap();

    let response = h
        .server
        .post("/api/tmux/sessions/dev/split-pane")
        .json(&json!({"paneId": pane_id, "vertical": true}))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    assert_ne!(body["data"]["paneId"], pane_id);
}

#[tokio::test]
async fn patch_sets_icon() {
    let h = harness();
    seed_dev_projection(&h.state.store);

    let response = h
        .server
        .patch("/api/tmux/sessions/dev")
        .json(&json!({"icon": "rocket"}))
        .await;
    response.assert_status_ok();
    assert_eq!(
        h.state.store.session_meta("dev").unwrap().icon.as_deref(),
        Some("rocket")
    );
}
