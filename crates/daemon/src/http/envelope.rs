// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON response envelope and the error-to-status mapping.
//!
//! Success: `{"data": <object>}` with a 2xx status. Errors:
//! `{"error": {"code", "message", "details"?}}`. Components return typed
//! errors unchanged; only this layer maps them to HTTP statuses and
//! contract-stable codes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use sentinel_core::runbook::RunbookDefError;
use sentinel_core::validate::ValidateError;
use sentinel_drivers::{MuxError, MuxErrorKind, ServiceError};
use sentinel_engine::{
    GuardrailError, MuxServiceError, OrchestratorError, RecoveryError, RunbookError,
    SchedulerError,
};
use sentinel_store::StoreError;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ConfigError;

/// Wrap a payload in the success envelope.
pub fn data<T: Serialize>(value: T) -> Response {
    data_with(StatusCode::OK, value)
}

/// Success envelope with an explicit status (201, 202, ...).
pub fn data_with<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

/// Empty success (204).
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// JSON body extractor whose rejections land in the error envelope as
/// `400 INVALID_REQUEST` (malformed JSON, unknown fields, trailing data,
/// oversized bodies).
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::invalid(rejection.body_text())
}

/// An error ready to serialize into the error envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        if let Some(details) = self.details {
            body["error"]["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidateError> for ApiError {
    fn from(e: ValidateError) -> Self {
        ApiError::invalid(e.to_string())
    }
}

impl From<RunbookDefError> for ApiError {
    fn from(e: RunbookDefError) -> Self {
        ApiError::invalid(e.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Patch(_) | ConfigError::Parse(_) => ApiError::invalid(e.to_string()),
            other => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                other.to_string(),
            ),
        }
    }
}

/// Domain-specific 404 codes by store entity kind.
fn not_found_code(kind: &str) -> &'static str {
    match kind {
        "service" => "OPS_SERVICE_NOT_FOUND",
        "runbook" => "OPS_RUNBOOK_NOT_FOUND",
        "run" => "OPS_JOB_NOT_FOUND",
        "alert" => "OPS_ALERT_NOT_FOUND",
        "schedule" => "SCHEDULE_NOT_FOUND",
        "session" => "SESSION_NOT_FOUND",
        _ => "NOT_FOUND",
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::NotFound { kind, .. } => {
                ApiError::not_found(not_found_code(kind), e.to_string())
            }
            StoreError::Exists { kind, .. } => {
                let code = if *kind == "service" {
                    "OPS_SERVICE_EXISTS"
                } else {
                    "CONFLICT"
                };
                ApiError::new(StatusCode::CONFLICT, code, e.to_string())
            }
            StoreError::Conflict { kind, .. } => {
                let code = if *kind == "alert" {
                    "OPS_ALERT_NOT_RESOLVED"
                } else {
                    "CONFLICT"
                };
                ApiError::new(StatusCode::CONFLICT, code, e.to_string())
            }
            StoreError::Wal(_) | StoreError::Snapshot(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                e.to_string(),
            ),
        }
    }
}

impl From<MuxError> for ApiError {
    fn from(e: MuxError) -> Self {
        let code = e.code();
        let status = match e.kind() {
            MuxErrorKind::SessionNotFound | MuxErrorKind::NotFound => StatusCode::NOT_FOUND,
            MuxErrorKind::SessionExists => StatusCode::CONFLICT,
            MuxErrorKind::ServerNotRunning => StatusCode::SERVICE_UNAVAILABLE,
            MuxErrorKind::CommandFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, code, e.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match &e {
            ServiceError::NotFound(_) => {
                ApiError::not_found("OPS_SERVICE_NOT_FOUND", e.to_string())
            }
            ServiceError::InvalidAction(_) => ApiError::invalid(e.to_string()),
            ServiceError::CommandFailed(_) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "OPS_ACTION_FAILED",
                e.to_string(),
            ),
        }
    }
}

impl From<GuardrailError> for ApiError {
    fn from(e: GuardrailError) -> Self {
        match e {
            GuardrailError::ConfirmRequired { decision } => ApiError::new(
                StatusCode::PRECONDITION_REQUIRED,
                "GUARDRAIL_CONFIRM_REQUIRED",
                decision.message.clone(),
            )
            .with_details(json!({ "decision": decision })),
            GuardrailError::Blocked { decision } => ApiError::new(
                StatusCode::FORBIDDEN,
                "GUARDRAIL_BLOCKED",
                decision.message.clone(),
            )
            .with_details(json!({ "decision": decision })),
            GuardrailError::Internal(message) => ApiError::unavailable(message),
            GuardrailError::InvalidPattern { .. } => ApiError::invalid(e.to_string()),
            GuardrailError::Store(e) => e.into(),
        }
    }
}

impl From<MuxServiceError> for ApiError {
    fn from(e: MuxServiceError) -> Self {
        match e {
            MuxServiceError::Validate(e) => e.into(),
            MuxServiceError::Guardrail(e) => e.into(),
            MuxServiceError::Driver(e) => e.into(),
            MuxServiceError::Store(e) => e.into(),
        }
    }
}

impl From<sentinel_engine::activity::ActivityError> for ApiError {
    fn from(e: sentinel_engine::activity::ActivityError) -> Self {
        use sentinel_engine::activity::ActivityError;
        match e {
            ActivityError::Validate(e) => e.into(),
            ActivityError::InvalidRequest(message) => ApiError::invalid(message),
            ActivityError::Store(e) => e.into(),
        }
    }
}

impl From<RunbookError> for ApiError {
    fn from(e: RunbookError) -> Self {
        match e {
            RunbookError::Def(e) => e.into(),
            RunbookError::Disabled(name) => ApiError::new(
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("runbook is disabled: {name}"),
            ),
            RunbookError::Store(e) => e.into(),
            RunbookError::Orchestrator(e) => e.into(),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        match e {
            SchedulerError::Cron(e) => ApiError::invalid(e.to_string()),
            SchedulerError::Invalid(message) => ApiError::invalid(message),
            SchedulerError::RunAtInPast => ApiError::invalid("runAt must be in the future"),
            SchedulerError::Store(e) => e.into(),
            SchedulerError::Runbook(e) => e.into(),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::Store(e) => e.into(),
        }
    }
}

impl From<RecoveryError> for ApiError {
    fn from(e: RecoveryError) -> Self {
        match e {
            RecoveryError::Validate(e) => e.into(),
            RecoveryError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
