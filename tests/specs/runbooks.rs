//! Runbook + job specs.

use crate::prelude::*;
use std::time::Duration;
use serde_json::{json, Value};

async fn create_runbook(h: &Harness, name: &str, command: &str) -> String {
    let response = h
        .server
        .post("/api/ops/runbooks")
        .json(&json!({
            "name": name,
            "steps": [{"type": "command", "title": "step", "command": command}],
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    body["data"]["runbook"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn runbook_crud_round_trip() {
    let h = harness();
    let id = create_runbook(&h, "deploy", "true").await;

    let body: Value = h.server.get("/api/ops/runbooks").await.json();
    assert_eq!(body["data"]["runbooks"].as_array().unwrap().len(), 1);

    let body: Value = h
        .server
        .get(&format!("/api/ops/runbooks/{id}"))
        .await
        .json();
    assert_eq!(body["data"]["runbook"]["name"], "deploy");

    let response = h
        .server
        .put(&format!("/api/ops/runbooks/{id}"))
        .json(&json!({
            "name": "deploy-2",
            "steps": [{"type": "command", "title": "noop", "command": "true"}],
        }))
        .await;
    response.assert_status_ok();

    let response = h.server.delete(&format!("/api/ops/runbooks/{id}")).await;
    assert_eq!(response.status_code().as_u16(), 204);
    let response = h.server.get(&format!("/api/ops/runbooks/{id}")).await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[tokio::test]
async fn invalid_steps_are_rejected() {
    let h = harness();
    let response = h
        .server
        .post("/api/ops/runbooks")
        .json(&json!({"name": "bad", "steps": []}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);

    let response = h
        .server
        .post("/api/ops/runbooks")
        .json(&json!({
            "name": "bad",
            "steps": [{"type": "command", "title": "", "command": "true"}],
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn run_executes_to_success() {
    let h = harness();
    let id = create_runbook(&h, "deploy", "true").await;

    let response = h
        .server
        .post(&format!("/api/ops/runbooks/{id}/run"))
        .await;
    assert_eq!(response.status_code().as_u16(), 202);
    let body: Value = response.json();
    let job_id = body["data"]["job"]["id"].as_str().unwrap().to_string();

    let store = h.state.store.clone();
    let job = job_id.clone();
    wait_until(
        move || {
            store
                .get_run(&job)
                .map(|r| r.status.is_terminal())
                .unwrap_or(false)
        },
        Duration::from_secs(5),
    )
    .await;

    let body: Value = h.server.get(&format!("/api/ops/jobs/{job_id}")).await.json();
    assert_eq!(body["data"]["job"]["status"], "succeeded");
    assert!(body["data"]["job"]["finishedAt"].as_str().is_some());
}

#[tokio::test]
async fn failing_run_lands_failed_with_error() {
    let h = harness();
    let id = create_runbook(&h, "broken", "exit 3").await;

    let body: Value = h
        .server
        .post(&format!("/api/ops/runbooks/{id}/run"))
        .await
        .json();
    let job_id = body["data"]["job"]["id"].as_str().unwrap().to_string();

    let store = h.state.store.clone();
    let job = job_id.clone();
    wait_until(
        move || {
            store
                .get_run(&job)
                .map(|r| r.status.is_terminal())
                .unwrap_or(false)
        },
        Duration::from_secs(5),
    )
    .await;

    let body: Value = h.server.get(&format!("/api/ops/jobs/{job_id}")).await.json();
    assert_eq!(body["data"]["job"]["status"], "failed");
    assert!(body["data"]["job"]["error"].as_str().is_some());
}

#[tokio::test]
async fn active_job_cannot_be_deleted() {
    let h = harness();
    let id = create_runbook(&h, "slow", "sleep 5").await;

    let body: Value = h
        .server
        .post(&format!("/api/ops/runbooks/{id}/run"))
        .await
        .json();
    let job_id = body["data"]["job"]["id"].as_str().unwrap().to_string();

    // Wait until it is actually running.
    let store = h.state.store.clone();
    let job = job_id.clone();
    wait_until(
        move || {
            store
                .get_run(&job)
                .map(|r| r.status == sentinel_core::RunStatus::Running)
                .unwrap_or(false)
        },
        Duration::from_secs(5),
    )
    .await;

    let response = h.server.delete(&format!("/api/ops/jobs/{job_id}")).await;
    assert_eq!(response.status_code().as_u16(), 409);
}

#[tokio::test]
async fn runbook_delete_cascades_schedules() {
    let h = harness();
    let id = create_runbook(&h, "deploy", "true").await;

    let response = h
        .server
        .post("/api/ops/schedules")
        .json(&json!({
            "runbookId": id,
            "name": "hourly",
            "scheduleType": "cron",
            "cronExpr": "0 * * * *",
            "timezone": "UTC",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);

    h.server.delete(&format!("/api/ops/runbooks/{id}")).await;

    let body: Value = h.server.get("/api/ops/schedules").await.json();
    assert!(body["data"]["schedules"].as_array().unwrap().is_empty());
}
