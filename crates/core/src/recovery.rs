// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery records: killed sessions, layout snapshots, restore jobs.

use crate::id::{RestoreJobId, SnapshotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A captured multiplexer session layout, persisted for later restore.
///
/// Multiple snapshots may exist per session; the latest per `boot_id` wins
/// for UI purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySnapshot {
    pub id: SnapshotId,
    pub session_name: String,
    pub boot_id: String,
    /// Content hash of the captured layout, for change detection.
    pub state_hash: String,
    pub captured_at: DateTime<Utc>,
    pub active_window: u32,
    pub active_pane_id: String,
    pub windows: u32,
    pub panes: u32,
    /// Full captured layout (windows, panes, paths, commands).
    pub payload: Value,
}

/// A session observed dead whose latest snapshot can be restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KilledSession {
    pub session_name: String,
    pub boot_id: String,
    pub last_seen_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_snapshot_id: Option<SnapshotId>,
    pub archived: bool,
}

/// Restore mode requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    Safe,
    Confirm,
}

impl Default for RestoreMode {
    fn default() -> Self {
        Self::Safe
    }
}

/// What to do when the target session name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    Rename,
    Overwrite,
    Abort,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self::Rename
    }
}

/// Options accepted when enqueueing a restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RestoreOptions {
    #[serde(default)]
    pub mode: RestoreMode,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_session: Option<String>,
}

/// Status of an async restore job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreJobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RestoreJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RestoreJobStatus::Succeeded | RestoreJobStatus::Failed)
    }
}

impl fmt::Display for RestoreJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RestoreJobStatus::Queued => "queued",
            RestoreJobStatus::Running => "running",
            RestoreJobStatus::Succeeded => "succeeded",
            RestoreJobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A queued async restore operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreJob {
    pub id: RestoreJobId,
    pub snapshot_id: SnapshotId,
    pub status: RestoreJobStatus,
    pub mode: RestoreMode,
    pub conflict_policy: ConflictPolicy,
    pub target_session: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
