// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sentinel_core::{GuardrailDecision, GuardrailMode, Severity};

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn data_wraps_payload_under_data_key() {
    let response = data(json!({"name": "dev"}));
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "dev");
    assert_eq!(body.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn api_error_serializes_error_envelope() {
    let response = ApiError::invalid("bad field").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert_eq!(body["error"]["message"], "bad field");
    assert!(body["error"].get("details").is_none());
}

#[test]
fn store_not_found_maps_to_domain_codes() {
    let cases = [
        ("runbook", "OPS_RUNBOOK_NOT_FOUND"),
        ("run", "OPS_JOB_NOT_FOUND"),
        ("alert", "OPS_ALERT_NOT_FOUND"),
        ("schedule", "SCHEDULE_NOT_FOUND"),
        ("service", "OPS_SERVICE_NOT_FOUND"),
        ("session", "SESSION_NOT_FOUND"),
        ("snapshot", "NOT_FOUND"),
    ];
    for (kind, code) in cases {
        let error: ApiError = StoreError::not_found(kind, "x").into();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.code, code, "kind {kind}");
    }
}

#[test]
fn store_conflicts_map_to_409() {
    let error: ApiError = StoreError::Exists {
        kind: "service",
        id: "web".to_string(),
    }
    .into();
    assert_eq!(error.status, StatusCode::CONFLICT);
    assert_eq!(error.code, "OPS_SERVICE_EXISTS");

    let error: ApiError = StoreError::Conflict {
        kind: "alert",
        id: "a-1".to_string(),
        reason: "only resolved alerts can be deleted",
    }
    .into();
    assert_eq!(error.code, "OPS_ALERT_NOT_RESOLVED");
}

#[test]
fn guardrail_confirm_maps_to_428_with_decision() {
    let decision = GuardrailDecision {
        mode: GuardrailMode::Confirm,
        matched_rule_id: None,
        severity: Severity::Warn,
        message: "confirm this".to_string(),
        reason: "matched".to_string(),
    };
    let error: ApiError = GuardrailError::ConfirmRequired { decision }.into();
    assert_eq!(error.status, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(error.code, "GUARDRAIL_CONFIRM_REQUIRED");
    assert!(error.details.is_some());
}

#[test]
fn guardrail_internal_maps_to_503() {
    let error: ApiError = GuardrailError::Internal("broken".to_string()).into();
    assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error.code, "UNAVAILABLE");
}

#[test]
fn mux_errors_map_by_kind() {
    let error: ApiError = MuxError::SessionNotFound("dev".to_string()).into();
    assert_eq!(error.status, StatusCode::NOT_FOUND);
    assert_eq!(error.code, "SESSION_NOT_FOUND");

    let error: ApiError = MuxError::SessionExists("dev".to_string()).into();
    assert_eq!(error.status, StatusCode::CONFLICT);

    let error: ApiError = MuxError::ServerNotRunning.into();
    assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);

    let error: ApiError = MuxError::CommandFailed("x".to_string()).into();
    assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.code, "COMMAND_FAILED");
}

#[test]
fn service_errors_map_to_ops_codes() {
    let error: ApiError = ServiceError::NotFound("x".to_string()).into();
    assert_eq!(error.code, "OPS_SERVICE_NOT_FOUND");

    let error: ApiError = ServiceError::InvalidAction("boom".to_string()).into();
    assert_eq!(error.status, StatusCode::BAD_REQUEST);

    let error: ApiError = ServiceError::CommandFailed("x".to_string()).into();
    assert_eq!(error.status, StatusCode::BAD_GATEWAY);
    assert_eq!(error.code, "OPS_ACTION_FAILED");
}
