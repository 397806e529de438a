// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardrail rule, evaluation, and audit handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use sentinel_core::{
    GuardrailInput, GuardrailMode, GuardrailRule, GuardrailScope, IdGen, RuleId, Severity,
    UuidIdGen,
};
use sentinel_drivers::{MuxDriver, ServiceManager};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, data_with, no_content, ApiError, ApiJson};
use super::AppState;

const DEFAULT_AUDIT_LIMIT: usize = 100;
const MAX_AUDIT_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleBody {
    pub name: String,
    pub pattern: String,
    pub mode: GuardrailMode,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i64,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RulePatchBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub mode: Option<GuardrailMode>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// `GET /api/ops/guardrails/rules`
pub async fn list<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Response {
    data(json!({ "rules": state.guardrail.list_rules() }))
}

/// `POST /api/ops/guardrails/rules`
pub async fn create<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(body): ApiJson<RuleBody>,
) -> Result<Response, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::invalid("rule name must not be empty"));
    }
    let rule = GuardrailRule {
        id: RuleId::new(UuidIdGen.next()),
        name: body.name,
        scope: GuardrailScope::Action,
        pattern: body.pattern,
        mode: body.mode,
        severity: body.severity.unwrap_or(Severity::Warn),
        message: body.message.unwrap_or_default(),
        enabled: body.enabled,
        priority: body.priority,
    };
    let rule = state.guardrail.upsert_rule(rule)?;
    Ok(data_with(StatusCode::CREATED, json!({ "rule": rule })))
}

/// `PATCH /api/ops/guardrails/rules/{id}`
pub async fn patch<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RulePatchBody>,
) -> Result<Response, ApiError> {
    let mut rule = state
        .guardrail
        .get_rule(&id)
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", format!("guardrail rule not found: {id}")))?;
    if let Some(name) = body.name {
        rule.name = name;
    }
    if let Some(pattern) = body.pattern {
        rule.pattern = pattern;
    }
    if let Some(mode) = body.mode {
        rule.mode = mode;
    }
    if let Some(severity) = body.severity {
        rule.severity = severity;
    }
    if let Some(message) = body.message {
        rule.message = message;
    }
    if let Some(enabled) = body.enabled {
        rule.enabled = enabled;
    }
    if let Some(priority) = body.priority {
        rule.priority = priority;
    }
    let rule = state.guardrail.upsert_rule(rule)?;
    Ok(data(json!({ "rule": rule })))
}

/// `DELETE /api/ops/guardrails/rules/{id}`
pub async fn remove<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.guardrail.delete_rule(&RuleId::new(id))?;
    Ok(no_content())
}

/// `POST /api/ops/guardrails/evaluate` — dry-run an input against the
/// rule set.
pub async fn evaluate<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    ApiJson(input): ApiJson<GuardrailInput>,
) -> Result<Response, ApiError> {
    if input.action.trim().is_empty() {
        return Err(ApiError::invalid("action must not be empty"));
    }
    let decision = state.guardrail.evaluate(&input, Utc::now())?;
    Ok(data(json!({ "decision": decision })))
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    limit: Option<i64>,
}

/// `GET /api/ops/guardrails/audit`
pub async fn audit<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<AuditQuery>,
) -> Response {
    let limit =
        sentinel_core::validate::clamp_limit(query.limit, DEFAULT_AUDIT_LIMIT, MAX_AUDIT_LIMIT);
    data(json!({ "audit": state.guardrail.audit(limit) }))
}
