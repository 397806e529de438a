//! Recovery specs: overview, snapshots, restore jobs, disabled mode.

use crate::prelude::*;
use sentinel_core::{KilledSession, RecoverySnapshot, SnapshotId};
use sentinel_daemon::config::SentinelConfig;
use serde_json::{json, Value};

fn seed_recovery(h: &Harness) {
    h.state.store.set_boot_id("boot-1").unwrap();
    h.state
        .store
        .record_killed_session(KilledSession {
            session_name: "dev".to_string(),
            boot_id: "boot-1".to_string(),
            last_seen_at: at(),
            latest_snapshot_id: None,
            archived: false,
        })
        .unwrap();
    h.state
        .store
        .record_recovery_snapshot(RecoverySnapshot {
            id: SnapshotId::new("snap-1"),
            session_name: "dev".to_string(),
            boot_id: "boot-1".to_string(),
            state_hash: "h".to_string(),
            captured_at: at(),
            active_window: 0,
            active_pane_id: "%1".to_string(),
            windows: 2,
            panes: 3,
            payload: json!({"windows": []}),
        })
        .unwrap();
}

#[tokio::test]
async fn overview_lists_killed_sessions_and_snapshots() {
    let h = harness();
    seed_recovery(&h);

    let body: Value = h.server.get("/api/recovery/overview").await.json();
    assert_eq!(body["data"]["bootId"], "boot-1");
    assert_eq!(body["data"]["killedSessions"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["recentSnapshots"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn restore_enqueues_a_queued_job() {
    let h = harness();
    seed_recovery(&h);

    let response = h
        .server
        .post("/api/recovery/snapshots/snap-1/restore")
        .json(&json!({"conflictPolicy": "overwrite"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 202);
    let body: Value = response.json();
    assert_eq!(body["data"]["job"]["status"], "queued");
    assert_eq!(body["data"]["job"]["targetSession"], "dev");
    assert_eq!(body["data"]["job"]["conflictPolicy"], "overwrite");

    let job_id = body["data"]["job"]["id"].as_str().unwrap();
    let body: Value = h
        .server
        .get(&format!("/api/recovery/jobs/{job_id}"))
        .await
        .json();
    assert_eq!(body["data"]["job"]["status"], "queued");
}

#[tokio::test]
async fn restore_of_unknown_snapshot_is_404() {
    let h = harness();
    let response = h
        .server
        .post("/api/recovery/snapshots/ghost/restore")
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[tokio::test]
async fn archive_hides_session_from_listing() {
    let h = harness();
    seed_recovery(&h);

    let response = h.server.post("/api/recovery/sessions/dev/archive").await;
    response.assert_status_ok();

    let body: Value = h.server.get("/api/recovery/sessions").await.json();
    assert!(body["data"]["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn snapshots_per_session_endpoint() {
    let h = harness();
    seed_recovery(&h);

    let body: Value = h
        .server
        .get("/api/recovery/sessions/dev/snapshots")
        .await
        .json();
    assert_eq!(body["data"]["snapshots"].as_array().unwrap().len(), 1);

    let body: Value = h
        .server
        .get("/api/recovery/snapshots/snap-1")
        .await
        .json();
    assert_eq!(body["data"]["snapshot"]["sessionName"], "dev");
}

#[tokio::test]
async fn disabled_recovery_answers_503() {
    let h = harness_with(SentinelConfig {
        recovery_enabled: false,
        ..SentinelConfig::default()
    });

    for path in [
        "/api/recovery/overview",
        "/api/recovery/sessions",
        "/api/recovery/jobs/x",
    ] {
        let response = h.server.get(path).await;
        assert_eq!(response.status_code().as_u16(), 503, "path {path}");
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "UNAVAILABLE");
    }
}
