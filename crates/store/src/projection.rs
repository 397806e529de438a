// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projection rows, journal entries, and the compact patch shapes served to
//! the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity class a journal entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Session,
    Window,
    Pane,
}

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
    Seen,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Removed => "removed",
            ChangeKind::Seen => "seen",
        };
        f.write_str(s)
    }
}

/// One append-only journal row. Drives delta streaming: entries are read in
/// ascending `global_rev` order and are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub global_rev: u64,
    pub entity: EntityType,
    pub session: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_id: Option<String>,
    pub change: ChangeKind,
    pub changed_at: DateTime<Utc>,
}

/// Materialized per-session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProjection {
    pub name: String,
    pub attached: u32,
    pub windows: u32,
    pub panes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_preview_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_preview_pane_id: Option<String>,
    /// Count of child windows with `has_unread`.
    pub unread_windows: u32,
    /// Sum of child panes with `revision > seen_revision`.
    pub unread_panes: u32,
    /// Latest global revision at which this row changed.
    pub rev: u64,
    pub updated_at: DateTime<Utc>,
}

/// Materialized per-window row, unique by `(session, window_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowProjection {
    pub session: String,
    pub window_index: u32,
    pub name: String,
    pub active: bool,
    pub layout: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_activity_at: Option<DateTime<Utc>>,
    pub unread_panes: u32,
    pub has_unread: bool,
    pub rev: u64,
}

/// Materialized per-pane row, unique by `pane_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneProjection {
    pub pane_id: String,
    pub session: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub title: String,
    pub active: bool,
    pub tty: String,
    pub current_path: String,
    pub start_command: String,
    pub current_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_captured_at: Option<DateTime<Utc>>,
    /// Bumped whenever captured content changes.
    pub revision: u64,
    /// Watermark below which the UI has acknowledged content. Invariant:
    /// `seen_revision <= revision`.
    pub seen_revision: u64,
    pub changed_at: DateTime<Utc>,
}

impl PaneProjection {
    pub fn has_unread(&self) -> bool {
        self.revision > self.seen_revision
    }
}

/// Per-session operator annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    pub name: String,
    /// Deterministic UI cache key, derived from name + creation time.
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_content: Option<String>,
}

/// Observed session facts fed in by the collector; derived counters are
/// computed inside the store transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionObservation {
    pub name: String,
    pub attached: u32,
    pub windows: u32,
    pub panes: u32,
    pub activity_at: Option<DateTime<Utc>>,
}

/// Observed window facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowObservation {
    pub session: String,
    pub window_index: u32,
    pub name: String,
    pub active: bool,
    pub layout: String,
    pub window_activity_at: Option<DateTime<Utc>>,
}

/// Observed pane facts, including the captured tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneObservation {
    pub pane_id: String,
    pub session: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub title: String,
    pub active: bool,
    pub tty: String,
    pub current_path: String,
    pub start_command: String,
    pub current_command: String,
    pub tail_preview: Option<String>,
    pub tail_hash: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Scope of a mark-seen request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeenScope {
    Pane,
    Window,
    Session,
}

impl SeenScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pane" => Some(SeenScope::Pane),
            "window" => Some(SeenScope::Window),
            "session" => Some(SeenScope::Session),
            _ => None,
        }
    }
}

/// Compact per-session patch used to update list views without a re-fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionActivityPatch {
    pub name: String,
    pub attached: u32,
    pub windows: u32,
    pub panes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_preview_pane_id: Option<String>,
    pub unread_windows: u32,
    pub unread_panes: u32,
    pub rev: u64,
}

/// Compact per-window row inside an inspector patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorWindow {
    pub window_index: u32,
    pub name: String,
    pub active: bool,
    pub unread_panes: u32,
    pub has_unread: bool,
}

/// Compact per-pane row inside an inspector patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorPane {
    pub pane_id: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub title: String,
    pub active: bool,
    pub current_command: String,
    pub has_unread: bool,
    pub revision: u64,
    pub seen_revision: u64,
}

/// Compact per-session patch for the inspector (windows + panes) view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorPatch {
    pub session: String,
    pub windows: Vec<InspectorWindow>,
    pub panes: Vec<InspectorPane>,
    pub rev: u64,
}

/// Flushable storage resource classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageResource {
    Timeline,
    ActivityLog,
    GuardrailLog,
    RecoveryLog,
}

impl StorageResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageResource::Timeline => "timeline",
            StorageResource::ActivityLog => "activity_log",
            StorageResource::GuardrailLog => "guardrail_log",
            StorageResource::RecoveryLog => "recovery_log",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "timeline" => Some(StorageResource::Timeline),
            "activity_log" => Some(StorageResource::ActivityLog),
            "guardrail_log" => Some(StorageResource::GuardrailLog),
            "recovery_log" => Some(StorageResource::RecoveryLog),
            _ => None,
        }
    }

    pub fn all() -> [StorageResource; 4] {
        [
            StorageResource::Timeline,
            StorageResource::ActivityLog,
            StorageResource::GuardrailLog,
            StorageResource::RecoveryLog,
        ]
    }
}

impl fmt::Display for StorageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row count and rough byte estimate for one flushable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub resource: StorageResource,
    pub rows: usize,
    pub approx_bytes: usize,
}

/// Storage introspection summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub global_rev: u64,
    pub resources: Vec<ResourceStats>,
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
