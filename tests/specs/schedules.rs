//! Schedule specs: validation, manual trigger recompute, one-shots.

use crate::prelude::*;
use std::time::Duration;
use chrono::Utc;
use serde_json::{json, Value};

async fn create_runbook(h: &Harness) -> String {
    let body: Value = h
        .server
        .post("/api/ops/runbooks")
        .json(&json!({
            "name": "deploy",
            "steps": [{"type": "command", "title": "noop", "command": "true"}],
        }))
        .await
        .json();
    body["data"]["runbook"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_cron_schedule_computes_next_run() {
    let h = harness();
    let runbook_id = create_runbook(&h).await;

    let response = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": runbook_id,
            "name": "hourly",
            "scheduleType": "cron",
            "cronExpr": "0 * * * *",
            "timezone": "UTC",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    let next = body["data"]["schedule"]["nextRunAt"].as_str().unwrap();
    let next: chrono::DateTime<Utc> = next.parse().unwrap();
    assert!(next > Utc::now());
}

#[tokio::test]
async fn schedule_validation_failures() {
    let h = harness();
    let runbook_id = create_runbook(&h).await;

    // Unknown runbook.
    let response = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": "ghost",
            "name": "x",
            "scheduleType": "cron",
            "cronExpr": "0 * * * *",
            "timezone": "UTC",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 404);

    // Bad cron expression.
    let response = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": runbook_id,
            "name": "x",
            "scheduleType": "cron",
            "cronExpr": "soon",
            "timezone": "UTC",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);

    // Bad timezone.
    let response = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": runbook_id,
            "name": "x",
            "scheduleType": "cron",
            "cronExpr": "0 * * * *",
            "timezone": "Mars/Olympus",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);

    // One-shot in the past.
    let response = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": runbook_id,
            "name": "x",
            "scheduleType": "once",
            "runAt": "2020-01-01T00:00:00Z",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

/// Manual trigger of a cron schedule with a stale past `nextRunAt`: 202,
/// `enabled` unchanged, a fresh future `nextRunAt`, and a terminal
/// `lastRunStatus` once the dispatched run drains.
#[tokio::test]
async fn cron_schedule_manual_trigger_recomputes() {
    let h = harness();
    let runbook_id = create_runbook(&h).await;

    let body: Value = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": runbook_id,
            "name": "hourly",
            "scheduleType": "cron",
            "cronExpr": "0 * * * *",
            "timezone": "UTC",
        }))
        .await
        .json();
    let schedule_id = body["data"]["schedule"]["id"].as_str().unwrap().to_string();

    // Force a stale next_run_at in the past.
    let mut stale = h.state.store.get_schedule(&schedule_id).unwrap();
    stale.next_run_at = Some(Utc::now() - chrono::Duration::hours(6));
    h.state.store.upsert_schedule(stale).unwrap();

    let response = h
        .server
        .post(&format!("/api/ops/schedules/{schedule_id}/trigger"))
        .await;
    assert_eq!(response.status_code().as_u16(), 202);
    let body: Value = response.json();
    assert_eq!(body["data"]["schedule"]["enabled"], true);
    assert_eq!(body["data"]["schedule"]["lastRunStatus"], "running");
    let next: chrono::DateTime<Utc> = body["data"]["schedule"]["nextRunAt"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(next > Utc::now());

    // After the run goroutine drains, the status is terminal, never stuck
    // on running, and the schedule stays enabled.
    let store = h.state.store.clone();
    let id = schedule_id.clone();
    wait_until(
        move || {
            store
                .get_schedule(&id)
                .map(|s| {
                    matches!(
                        s.last_run_status,
                        sentinel_core::LastRunStatus::Succeeded
                            | sentinel_core::LastRunStatus::Failed
                    )
                })
                .unwrap_or(false)
        },
        Duration::from_secs(5),
    )
    .await;
    let settled = h.state.store.get_schedule(&schedule_id).unwrap();
    assert!(settled.enabled);
    assert!(settled.next_run_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn trigger_unknown_schedule_is_404() {
    let h = harness();
    let response = h.server.post("/api/ops/schedules/ghost/trigger").await;
    assert_eq!(response.status_code().as_u16(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "SCHEDULE_NOT_FOUND");
}

#[tokio::test]
async fn one_shot_keeps_next_run_at_after_trigger() {
    let h = harness();
    let runbook_id = create_runbook(&h).await;
    let run_at = (Utc::now() + chrono::Duration::hours(2)).to_rfc3339();

    let body: Value = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": runbook_id,
            "name": "later",
            "scheduleType": "once",
            "runAt": run_at,
        }))
        .await
        .json();
    let schedule_id = body["data"]["schedule"]["id"].as_str().unwrap().to_string();

    let body: Value = h
        .server
        .post(&format!("/api/ops/schedules/{schedule_id}/trigger"))
        .await
        .json();
    // One-shots are not rescheduled.
    let next = body["data"]["schedule"]["nextRunAt"].as_str().unwrap();
    let parsed: chrono::DateTime<Utc> = next.parse().unwrap();
    let expected: chrono::DateTime<Utc> = run_at.parse().unwrap();
    assert_eq!(parsed, expected);
}
