//! Response envelope laws.

use crate::prelude::*;
use serde_json::Value;

#[tokio::test]
async fn success_responses_carry_only_a_data_key() {
    let h = harness();
    let response = h.server.get("/api/meta").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object.contains_key("data"));
}

#[tokio::test]
async fn meta_reports_token_requirement_and_version() {
    let h = harness();
    let body: Value = h.server.get("/api/meta").await.json();
    assert_eq!(body["data"]["tokenRequired"], false);
    assert!(body["data"]["version"].as_str().is_some());
    assert!(body["data"]["defaultCwd"].as_str().is_some());
}

#[tokio::test]
async fn unknown_body_fields_are_rejected() {
    let h = harness();
    let response = h
        .server
        .post("/api/tmux/sessions")
        .json(&serde_json::json!({"name": "dev", "bogus": true}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn error_envelope_has_code_and_message() {
    let h = harness();
    let response = h.server.get("/api/ops/jobs/ghost").await;
    assert_eq!(response.status_code().as_u16(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "OPS_JOB_NOT_FOUND");
    assert!(body["error"]["message"].as_str().is_some());
}

#[tokio::test]
async fn directory_suggestions_come_sorted_and_capped() {
    let h = harness();
    let dir = tempfile::tempdir().unwrap();
    for name in ["Zeta", "alpha", "Beta", "gamma"] {
        std::fs::create_dir(dir.path().join(name)).unwrap();
    }

    let prefix = format!("{}/", dir.path().display());
    let body: Value = h
        .server
        .get("/api/fs/suggest")
        .add_query_param("prefix", &prefix)
        .add_query_param("limit", "3")
        .await
        .json();
    let suggestions = body["data"]["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 3);
    let names: Vec<&str> = suggestions
        .iter()
        .map(|s| s.as_str().unwrap().rsplit('/').next().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "Beta", "gamma"]);
}
