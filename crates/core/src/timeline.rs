// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeline events: the immutable operator-facing activity feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Severity of a timeline event or alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Parse a wire severity string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Severity::Info),
            "warn" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Originating subsystem of a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Service,
    Alert,
    Runbook,
    Config,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Service => "service",
            EventSource::Alert => "alert",
            EventSource::Runbook => "runbook",
            EventSource::Config => "config",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "service" => Some(EventSource::Service),
            "alert" => Some(EventSource::Alert),
            "runbook" => Some(EventSource::Runbook),
            "config" => Some(EventSource::Config),
            _ => None,
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable row in the operator timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub source: EventSource,
    pub event_type: String,
    pub severity: Severity,
    /// The affected resource (service unit, runbook name, alert id, ...).
    pub resource: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl TimelineEvent {
    /// Case-insensitive free-text match over message, resource, and type.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let q = query.to_lowercase();
        self.message.to_lowercase().contains(&q)
            || self.resource.to_lowercase().contains(&q)
            || self.event_type.to_lowercase().contains(&q)
    }
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
