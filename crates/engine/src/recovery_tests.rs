// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};
use sentinel_core::{ConflictPolicy, RestoreMode};

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).single().unwrap()
}

fn setup() -> (tempfile::TempDir, RecoveryController, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let controller = RecoveryController::new(store.clone(), Hub::new());
    (dir, controller, store)
}

fn snapshot(id: &str, session: &str, captured_at: DateTime<Utc>) -> RecoverySnapshot {
    RecoverySnapshot {
        id: SnapshotId::new(id),
        session_name: session.to_string(),
        boot_id: "boot-1".to_string(),
        state_hash: "h".to_string(),
        captured_at,
        active_window: 0,
        active_pane_id: "%1".to_string(),
        windows: 2,
        panes: 3,
        payload: serde_json::json!({"windows": []}),
    }
}

fn killed(session: &str) -> KilledSession {
    KilledSession {
        session_name: session.to_string(),
        boot_id: "boot-1".to_string(),
        last_seen_at: at(),
        latest_snapshot_id: None,
        archived: false,
    }
}

#[test]
fn overview_includes_boot_and_killed_sessions() {
    let (_dir, controller, store) = setup();
    store.set_boot_id("boot-1").unwrap();
    store.record_killed_session(killed("dev")).unwrap();
    store
        .record_recovery_snapshot(snapshot("s-1", "dev", at()))
        .unwrap();

    let overview = controller.overview();
    assert_eq!(overview.boot_id, "boot-1");
    assert_eq!(overview.killed_sessions.len(), 1);
    assert_eq!(overview.recent_snapshots.len(), 1);
}

#[test]
fn list_snapshots_validates_session_name() {
    let (_dir, controller, _store) = setup();
    assert!(matches!(
        controller.list_snapshots("bad name", 10).unwrap_err(),
        RecoveryError::Validate(_)
    ));
    assert!(controller.list_snapshots("dev", 10).unwrap().is_empty());
}

#[test]
fn get_snapshot_not_found() {
    let (_dir, controller, _store) = setup();
    assert!(matches!(
        controller.get_snapshot("ghost").unwrap_err(),
        RecoveryError::Store(StoreError::NotFound { .. })
    ));
}

#[test]
fn restore_async_enqueues_queued_job() {
    let (_dir, controller, store) = setup();
    store
        .record_recovery_snapshot(snapshot("s-1", "dev", at()))
        .unwrap();

    let job = controller
        .restore_async("s-1", RestoreOptions::default(), at())
        .unwrap();
    assert_eq!(job.status, RestoreJobStatus::Queued);
    assert_eq!(job.target_session, "dev");
    assert_eq!(job.mode, RestoreMode::Safe);
    assert_eq!(job.conflict_policy, ConflictPolicy::Rename);

    let fetched = controller.get_job(job.id.as_str()).unwrap();
    assert_eq!(fetched, job);
}

#[test]
fn restore_async_honors_target_override() {
    let (_dir, controller, store) = setup();
    store
        .record_recovery_snapshot(snapshot("s-1", "dev", at()))
        .unwrap();

    let job = controller
        .restore_async(
            "s-1",
            RestoreOptions {
                mode: RestoreMode::Confirm,
                conflict_policy: ConflictPolicy::Overwrite,
                target_session: Some("dev-restored".to_string()),
            },
            at(),
        )
        .unwrap();
    assert_eq!(job.target_session, "dev-restored");
    assert_eq!(job.mode, RestoreMode::Confirm);

    // Invalid target name rejected before any write.
    assert!(matches!(
        controller
            .restore_async(
                "s-1",
                RestoreOptions {
                    target_session: Some("bad name".to_string()),
                    ..RestoreOptions::default()
                },
                at(),
            )
            .unwrap_err(),
        RecoveryError::Validate(_)
    ));
}

#[test]
fn restore_async_requires_existing_snapshot() {
    let (_dir, controller, _store) = setup();
    assert!(matches!(
        controller
            .restore_async("ghost", RestoreOptions::default(), at())
            .unwrap_err(),
        RecoveryError::Store(StoreError::NotFound { .. })
    ));
}

#[test]
fn archive_session_hides_it_from_overview() {
    let (_dir, controller, store) = setup();
    store.record_killed_session(killed("dev")).unwrap();

    let archived = controller.archive_session("dev", at()).unwrap();
    assert!(archived.archived);
    assert!(controller.list_killed_sessions().is_empty());

    assert!(matches!(
        controller.archive_session("ghost", at()).unwrap_err(),
        RecoveryError::Store(StoreError::NotFound { .. })
    ));
}

#[test]
fn snapshots_list_latest_first() {
    let (_dir, controller, store) = setup();
    store
        .record_recovery_snapshot(snapshot("s-1", "dev", at()))
        .unwrap();
    store
        .record_recovery_snapshot(snapshot("s-2", "dev", at() + Duration::minutes(1)))
        .unwrap();

    let snapshots = controller.list_snapshots("dev", 10).unwrap();
    assert_eq!(snapshots[0].id.as_str(), "s-2");
    assert_eq!(snapshots.len(), 2);

    let capped = controller.list_snapshots("dev", 1).unwrap();
    assert_eq!(capped.len(), 1);
}
