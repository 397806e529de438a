// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-notification events fanned out by the event hub.
//!
//! Serializes with `{"type": "ops.services", "payload": {...}}` format.
//! All events emitted for one mutation carry the same `globalRev` in their
//! payload so the UI can reconcile them as a single atomic change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Recognized event types on the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "tmux.sessions")]
    TmuxSessions,
    #[serde(rename = "tmux.inspector")]
    TmuxInspector,
    #[serde(rename = "ops.services")]
    OpsServices,
    #[serde(rename = "ops.overview")]
    OpsOverview,
    #[serde(rename = "ops.timeline")]
    OpsTimeline,
    #[serde(rename = "ops.alerts")]
    OpsAlerts,
    #[serde(rename = "ops.job")]
    OpsJob,
    #[serde(rename = "schedule.updated")]
    ScheduleUpdated,
    #[serde(rename = "recovery.overview")]
    RecoveryOverview,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TmuxSessions => "tmux.sessions",
            EventKind::TmuxInspector => "tmux.inspector",
            EventKind::OpsServices => "ops.services",
            EventKind::OpsOverview => "ops.overview",
            EventKind::OpsTimeline => "ops.timeline",
            EventKind::OpsAlerts => "ops.alerts",
            EventKind::OpsJob => "ops.job",
            EventKind::ScheduleUpdated => "schedule.updated",
            EventKind::RecoveryOverview => "recovery.overview",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single broadcast event: a type tag plus a free-form JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Event {
    /// Create an event with an empty payload.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            payload: Map::new(),
        }
    }

    /// Create an event whose payload carries the transaction's global revision.
    pub fn with_rev(kind: EventKind, global_rev: u64) -> Self {
        Self::new(kind).field("globalRev", global_rev)
    }

    /// Builder-style payload field insertion.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Read the global revision carried in the payload, if any.
    pub fn global_rev(&self) -> Option<u64> {
        self.payload.get("globalRev").and_then(Value::as_u64)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
