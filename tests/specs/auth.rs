//! Token and origin enforcement.

use crate::prelude::*;
use sentinel_daemon::config::SentinelConfig;
use serde_json::Value;

fn secured() -> Harness {
    harness_with(SentinelConfig {
        auth_token: Some("secret".to_string()),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        ..SentinelConfig::default()
    })
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let h = secured();
    let response = h.server.get("/api/tmux/sessions").await;
    assert_eq!(response.status_code().as_u16(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn bearer_token_grants_access() {
    let h = secured();
    let response = h
        .server
        .get("/api/tmux/sessions")
        .add_header("authorization", "Bearer secret")
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn cookie_token_grants_access() {
    let h = secured();
    let response = h
        .server
        .get("/api/tmux/sessions")
        .add_header("cookie", "sentinel_token=secret")
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn meta_stays_open_without_token() {
    let h = secured();
    let response = h.server.get("/api/meta").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["tokenRequired"], true);
}

#[tokio::test]
async fn disallowed_origin_is_denied_even_with_token() {
    let h = secured();
    let response = h
        .server
        .get("/api/tmux/sessions")
        .add_header("authorization", "Bearer secret")
        .add_header("origin", "http://evil.example")
        .await;
    assert_eq!(response.status_code().as_u16(), 403);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "ORIGIN_DENIED");
}

#[tokio::test]
async fn allowed_origin_passes() {
    let h = secured();
    let response = h
        .server
        .get("/api/tmux/sessions")
        .add_header("authorization", "Bearer secret")
        .add_header("origin", "http://localhost:5173")
        .await;
    response.assert_status_ok();
}
