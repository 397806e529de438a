// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron and one-shot schedules for runbooks.

use crate::id::{RunbookId, ScheduleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Cron,
    Once,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::Cron => "cron",
            ScheduleKind::Once => "once",
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of the most recent run started by a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastRunStatus {
    None,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl fmt::Display for LastRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LastRunStatus::None => "none",
            LastRunStatus::Running => "running",
            LastRunStatus::Succeeded => "succeeded",
            LastRunStatus::Failed => "failed",
            LastRunStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A stored schedule row.
///
/// For `cron`, `cron_expr` and `timezone` are required and `next_run_at` is
/// recomputed at creation, update, and after every fire (manual triggers
/// included). For `once`, `run_at` is required, must be in the future at
/// creation/update, and is copied to `next_run_at`; one-shots are never
/// rescheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub runbook_id: RunbookId,
    pub name: String,
    #[serde(rename = "scheduleType")]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_at: Option<DateTime<Utc>>,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run_status: LastRunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
