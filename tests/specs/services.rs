//! Service plane specs: restart happy path, failed-state alerting.

use crate::prelude::*;
use sentinel_core::EventKind;
use serde_json::{json, Value};

async fn register_sentinel_unit(h: &Harness, unit: &str) {
    h.services.add_unit(unit, "active");
    let response = h
        .server
        .post("/api/ops/services")
        .json(&json!({"name": "sentinel", "unit": unit}))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
}

/// Restart lands `active`: 200, info timeline row, `ops.services` and
/// `ops.overview` hub events sharing one globalRev, no alert.
#[tokio::test]
async fn service_restart_happy_path() {
    let h = harness();
    register_sentinel_unit(&h, "sentinel.service").await;
    let (mut rx, _sub) = h.state.hub.subscribe(32);

    let response = h
        .server
        .post("/api/ops/services/sentinel/action")
        .json(&json!({"action": "restart"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["status"]["activeState"], "active");
    assert_eq!(body["data"]["timeline"]["severity"], "info");
    assert!(body["data"]["alerts"].as_array().unwrap().is_empty());
    let global_rev = body["data"]["globalRev"].as_u64().unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.global_rev(), Some(global_rev));
        kinds.push(event.kind);
    }
    assert!(kinds.contains(&EventKind::OpsServices));
    assert!(kinds.contains(&EventKind::OpsOverview));
    assert!(kinds.contains(&EventKind::OpsTimeline));
}

/// Restart lands `failed`: still 200, error timeline row, alert upserted
/// with the service dedupe key and returned in the response.
#[tokio::test]
async fn service_restart_entering_failed_state_fires_alert() {
    let h = harness();
    register_sentinel_unit(&h, "web.service").await;
    h.services.set_act_result("web.service", "failed");

    let response = h
        .server
        .post("/api/ops/services/sentinel/action")
        .json(&json!({"action": "restart"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["timeline"]["severity"], "error");
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["dedupeKey"], "service:web.service:failed");
    assert_eq!(alerts[0]["status"], "open");

    // Alert visible through the alerts endpoint.
    let listed: Value = h.server.get("/api/ops/alerts").await.json();
    assert_eq!(listed["data"]["alerts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stop_action_records_warn_severity() {
    let h = harness();
    register_sentinel_unit(&h, "web.service").await;

    let body: Value = h
        .server
        .post("/api/ops/services/sentinel/action")
        .json(&json!({"action": "stop"}))
        .await
        .json();
    assert_eq!(body["data"]["timeline"]["severity"], "warn");
}

#[tokio::test]
async fn invalid_action_is_rejected() {
    let h = harness();
    register_sentinel_unit(&h, "web.service").await;

    let response = h
        .server
        .post("/api/ops/services/sentinel/action")
        .json(&json!({"action": "explode"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let h = harness();
    register_sentinel_unit(&h, "web.service").await;

    let response = h
        .server
        .post("/api/ops/services")
        .json(&json!({"name": "sentinel", "unit": "web.service"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 409);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "OPS_SERVICE_EXISTS");
}

#[tokio::test]
async fn action_on_unknown_service_is_404() {
    let h = harness();
    let response = h
        .server
        .post("/api/ops/services/ghost/action")
        .json(&json!({"action": "restart"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "OPS_SERVICE_NOT_FOUND");
}

#[tokio::test]
async fn unit_variant_operates_without_registration() {
    let h = harness();
    h.services.add_unit("adhoc.service", "active");

    let body: Value = h
        .server
        .get("/api/ops/unit/status")
        .add_query_param("unit", "adhoc.service")
        .await
        .json();
    assert_eq!(body["data"]["status"]["activeState"], "active");

    let response = h
        .server
        .post("/api/ops/unit/action")
        .json(&json!({"unit": "adhoc.service", "action": "stop"}))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn logs_are_served_for_registered_services() {
    let h = harness();
    register_sentinel_unit(&h, "web.service").await;
    h.services
        .set_logs("web.service", vec!["line a".to_string(), "line b".to_string()]);

    let body: Value = h
        .server
        .get("/api/ops/services/sentinel/logs")
        .await
        .json();
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn overview_reports_host_and_alert_counts() {
    let h = harness();
    register_sentinel_unit(&h, "web.service").await;
    h.services.set_act_result("web.service", "failed");
    h.server
        .post("/api/ops/services/sentinel/action")
        .json(&json!({"action": "restart"}))
        .await;

    let body: Value = h.server.get("/api/ops/overview").await.json();
    assert_eq!(body["data"]["openAlerts"], 1);
    assert!(body["data"]["host"]["hostname"].as_str().is_some());
}
