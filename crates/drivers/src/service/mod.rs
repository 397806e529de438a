// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-manager driver seam.

mod systemd;

pub use systemd::SystemdManager;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeServiceManager, ServiceCall};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_core::ServiceScope;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from service-manager operations.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("service not found: {0}")]
    NotFound(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Lifecycle action on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Reload,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
            ServiceAction::Reload => "reload",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value {
            "start" => Ok(ServiceAction::Start),
            "stop" => Ok(ServiceAction::Stop),
            "restart" => Ok(ServiceAction::Restart),
            "reload" => Ok(ServiceAction::Reload),
            other => Err(ServiceError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit status as reported by the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub unit: String,
    pub scope: ServiceScope,
    pub description: String,
    /// `loaded`, `not-found`, ...
    pub load_state: String,
    /// `active`, `inactive`, `failed`, `activating`, ...
    pub active_state: String,
    /// `running`, `dead`, `exited`, ...
    pub sub_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

impl ServiceStatus {
    pub fn is_failed(&self) -> bool {
        self.active_state == "failed"
    }
}

/// Host-level summary for the ops overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostOverview {
    pub hostname: String,
    pub uptime_secs: u64,
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub mem_total_kb: u64,
    pub mem_available_kb: u64,
    pub failed_units: u32,
}

/// Driver for the OS service controller (systemd).
#[async_trait]
pub trait ServiceManager: Clone + Send + Sync + 'static {
    /// Host-level metrics and failed-unit count.
    async fn overview(&self) -> Result<HostOverview, ServiceError>;

    /// Units currently loaded under the scope.
    async fn list_units(&self, scope: ServiceScope) -> Result<Vec<ServiceStatus>, ServiceError>;

    async fn status(&self, unit: &str, scope: ServiceScope)
        -> Result<ServiceStatus, ServiceError>;

    /// Apply a lifecycle action and return the resulting status.
    async fn act(
        &self,
        unit: &str,
        scope: ServiceScope,
        action: ServiceAction,
    ) -> Result<ServiceStatus, ServiceError>;

    /// Recent log lines for a unit.
    async fn logs(
        &self,
        unit: &str,
        scope: ServiceScope,
        lines: u32,
    ) -> Result<Vec<String>, ServiceError>;

    /// Installed (not necessarily loaded) unit files, for the registration UI.
    async fn discover(&self, scope: ServiceScope) -> Result<Vec<String>, ServiceError>;
}
