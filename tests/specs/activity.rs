//! Activity pipeline specs: delta overflow, seen idempotence, timeline.

use crate::prelude::*;
use serde_json::{json, Value};

/// Three journal entries at revs 1..3; a delta with limit=2 overflows and
/// reports the current counter.
#[tokio::test]
async fn delta_overflow() {
    let h = harness();
    seed_dev_projection(&h.state.store);
    // Seeding produced 4 entries; flush and reseed a minimal 3-entry journal.
    let store = &h.state.store;
    store
        .flush_resource(sentinel_store::StorageResource::ActivityLog, at())
        .unwrap();

    // Three fresh entries.
    for (pane, hash) in [("%1", "n1"), ("%2", "n2"), ("%1", "n3")] {
        store
            .upsert_pane(
                sentinel_store::PaneObservation {
                    pane_id: pane.to_string(),
                    session: "dev".to_string(),
                    window_index: 0,
                    pane_index: 0,
                    title: String::new(),
                    active: true,
                    tty: String::new(),
                    current_path: "/".to_string(),
                    start_command: "zsh".to_string(),
                    current_command: "zsh".to_string(),
                    tail_preview: Some(format!("tail {hash}")),
                    tail_hash: Some(hash.to_string()),
                    captured_at: at(),
                },
                at(),
            )
            .unwrap();
    }

    let body: Value = h
        .server
        .get("/api/tmux/activity/delta")
        .add_query_param("since", "0")
        .add_query_param("limit", "2")
        .await
        .json();

    assert_eq!(body["data"]["overflow"], true);
    assert_eq!(body["data"]["changes"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["data"]["globalRev"].as_u64().unwrap(),
        h.state.store.global_rev()
    );
}

#[tokio::test]
async fn delta_without_overflow_is_complete_and_ascending() {
    let h = harness();
    seed_dev_projection(&h.state.store);

    let body: Value = h
        .server
        .get("/api/tmux/activity/delta")
        .add_query_param("since", "0")
        .add_query_param("limit", "100")
        .await
        .json();

    assert_eq!(body["data"]["overflow"], false);
    let changes = body["data"]["changes"].as_array().unwrap();
    let revs: Vec<u64> = changes
        .iter()
        .map(|c| c["globalRev"].as_u64().unwrap())
        .collect();
    let mut sorted = revs.clone();
    sorted.sort_unstable();
    assert_eq!(revs, sorted);
    assert!(!body["data"]["sessionPatches"].as_array().unwrap().is_empty());
}

/// First seen call acks; the second is a no-op until new content arrives.
#[tokio::test]
async fn mark_seen_idempotence() {
    let h = harness();
    seed_dev_projection(&h.state.store);

    let seen = |pane: &str| {
        json!({"scope": "pane", "paneId": pane})
    };

    let first: Value = h
        .server
        .post("/api/tmux/sessions/dev/seen")
        .json(&seen("%1"))
        .await
        .json();
    assert_eq!(first["data"]["acked"], true);

    let second: Value = h
        .server
        .post("/api/tmux/sessions/dev/seen")
        .json(&seen("%1"))
        .await
        .json();
    assert_eq!(second["data"]["acked"], false);
}

#[tokio::test]
async fn session_scope_seen_clears_all_unread() {
    let h = harness();
    seed_dev_projection(&h.state.store);

    let body: Value = h
        .server
        .post("/api/tmux/sessions/dev/seen")
        .json(&json!({"scope": "session"}))
        .await
        .json();
    assert_eq!(body["data"]["acked"], true);
    let patch = &body["data"]["sessionPatches"][0];
    assert_eq!(patch["unreadPanes"], 0);
    assert_eq!(patch["unreadWindows"], 0);
}

#[tokio::test]
async fn seen_validates_scope_fields() {
    let h = harness();
    seed_dev_projection(&h.state.store);

    let response = h
        .server
        .post("/api/tmux/sessions/dev/seen")
        .json(&json!({"scope": "pane"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);

    let response = h
        .server
        .post("/api/tmux/sessions/dev/seen")
        .json(&json!({"scope": "pane", "paneId": "nope"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn activity_stats_reads_collector_keys() {
    let h = harness();
    h.state.store.set_runtime("collect_total", "7").unwrap();
    h.state
        .store
        .set_runtime("last_collect_duration_ms", "42")
        .unwrap();

    let body: Value = h.server.get("/api/tmux/activity/stats").await.json();
    assert_eq!(body["data"]["collectTotal"], 7);
    assert_eq!(body["data"]["lastCollectDurationMs"], 42);
}

#[tokio::test]
async fn timeline_search_validates_and_paginates() {
    let h = harness();
    for i in 0..3 {
        h.state
            .store
            .append_timeline(sentinel_core::TimelineEvent {
                id: format!("t-{i}"),
                source: sentinel_core::EventSource::Service,
                event_type: "service.action".to_string(),
                severity: sentinel_core::Severity::Info,
                resource: "nginx".to_string(),
                message: format!("event {i}"),
                details: None,
                metadata: serde_json::Map::new(),
                created_at: at(),
            })
            .unwrap();
    }

    let body: Value = h
        .server
        .get("/api/tmux/timeline")
        .add_query_param("limit", "2")
        .await
        .json();
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["hasMore"], true);

    // Bad severity rejected.
    let response = h
        .server
        .get("/api/tmux/timeline")
        .add_query_param("severity", "fatal")
        .await;
    assert_eq!(response.status_code().as_u16(), 400);

    // Bad timestamp rejected.
    let response = h
        .server
        .get("/api/tmux/timeline")
        .add_query_param("since", "yesterday")
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn presence_marks_focused_pane_seen() {
    let h = harness();
    seed_dev_projection(&h.state.store);

    let body: Value = h
        .server
        .put("/api/tmux/presence")
        .json(&json!({
            "terminalId": "term-1",
            "session": "dev",
            "windowIndex": 0,
            "paneId": "%1",
            "visible": true,
            "focused": true,
        }))
        .await
        .json();
    assert_eq!(body["data"]["updated"], true);
    assert_eq!(body["data"]["acked"], true);

    // The pane is now read.
    let pane = h
        .state
        .store
        .list_panes("dev")
        .into_iter()
        .find(|p| p.pane_id == "%1")
        .unwrap();
    assert!(!pane.has_unread());

    // An unfocused presence does not mark seen.
    let body: Value = h
        .server
        .put("/api/tmux/presence")
        .json(&json!({
            "terminalId": "term-2",
            "session": "dev",
            "paneId": "%2",
            "visible": true,
            "focused": false,
        }))
        .await
        .json();
    assert_eq!(body["data"]["acked"], false);
}
