//! Guardrail specs: rule CRUD, evaluation, fail-closed behavior.

use crate::prelude::*;
use serde_json::{json, Value};

async fn create_rule(h: &Harness, pattern: &str, mode: &str, priority: i64) -> String {
    let response = h
        .server
        .post("/api/ops/guardrails/rules")
        .json(&json!({
            "name": format!("rule {pattern}"),
            "pattern": pattern,
            "mode": mode,
            "priority": priority,
            "message": "gated",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    body["data"]["rule"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn evaluate_with_no_rules_allows() {
    let h = harness();
    let body: Value = h
        .server
        .post("/api/ops/guardrails/evaluate")
        .json(&json!({"action": "session.kill"}))
        .await
        .json();
    assert_eq!(body["data"]["decision"]["mode"], "allow");
}

#[tokio::test]
async fn highest_priority_rule_wins() {
    let h = harness();
    create_rule(&h, "^session\\.", "warn", 1).await;
    let blocking = create_rule(&h, "^session\\.kill$", "block", 50).await;

    let body: Value = h
        .server
        .post("/api/ops/guardrails/evaluate")
        .json(&json!({"action": "session.kill"}))
        .await
        .json();
    assert_eq!(body["data"]["decision"]["mode"], "block");
    assert_eq!(body["data"]["decision"]["matchedRuleId"], blocking);
}

#[tokio::test]
async fn non_allow_decisions_append_audit() {
    let h = harness();
    create_rule(&h, "^session\\.kill$", "confirm", 10).await;

    h.server
        .post("/api/ops/guardrails/evaluate")
        .json(&json!({"action": "session.kill", "sessionName": "dev"}))
        .await;

    let body: Value = h.server.get("/api/ops/guardrails/audit").await.json();
    let audit = body["data"]["audit"].as_array().unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0]["decision"], "confirm");
    assert_eq!(audit[0]["sessionName"], "dev");
}

#[tokio::test]
async fn invalid_pattern_is_rejected_at_create() {
    let h = harness();
    let response = h
        .server
        .post("/api/ops/guardrails/rules")
        .json(&json!({
            "name": "broken",
            "pattern": "([unclosed",
            "mode": "warn",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

/// A rule that cannot compile reaches the store behind the API's back; the
/// evaluator fails closed and the surface answers 503. The gated mutation
/// never reaches the driver.
#[tokio::test]
async fn fail_closed_evaluation_is_503_and_blocks_mutations() {
    let h = harness();
    h.state
        .store
        .upsert_guardrail_rule(sentinel_core::GuardrailRule {
            id: sentinel_core::RuleId::new("corrupt"),
            name: "corrupt".to_string(),
            scope: sentinel_core::GuardrailScope::Action,
            pattern: "([unclosed".to_string(),
            mode: sentinel_core::GuardrailMode::Warn,
            severity: sentinel_core::Severity::Warn,
            enabled: true,
            priority: 1,
            message: String::new(),
        })
        .unwrap();

    let response = h
        .server
        .post("/api/ops/guardrails/evaluate")
        .json(&json!({"action": "anything"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 503);

    h.mux.add_session("dev");
    let response = h.server.delete("/api/tmux/sessions/dev").await;
    assert_eq!(response.status_code().as_u16(), 503);
    assert!(h.mux.has_session("dev"));
}

#[tokio::test]
async fn rule_patch_and_delete() {
    let h = harness();
    let id = create_rule(&h, "^x$", "warn", 1).await;

    let response = h
        .server
        .patch(&format!("/api/ops/guardrails/rules/{id}"))
        .json(&json!({"enabled": false}))
        .await;
    response.assert_status_ok();

    // Disabled: no longer matches.
    let body: Value = h
        .server
        .post("/api/ops/guardrails/evaluate")
        .json(&json!({"action": "x"}))
        .await
        .json();
    assert_eq!(body["data"]["decision"]["mode"], "allow");

    let response = h
        .server
        .delete(&format!("/api/ops/guardrails/rules/{id}"))
        .await;
    assert_eq!(response.status_code().as_u16(), 204);

    let response = h
        .server
        .delete(&format!("/api/ops/guardrails/rules/{id}"))
        .await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[tokio::test]
async fn evaluate_requires_an_action() {
    let h = harness();
    let response = h
        .server
        .post("/api/ops/guardrails/evaluate")
        .json(&json!({"action": ""}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}
