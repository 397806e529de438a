// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run state machine records for runbook executions.

use crate::id::{RunId, RunbookId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status of a run.
///
/// `queued → running → (succeeded | failed | cancelled)`; terminal statuses
/// are immutable and always carry a `finished_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-step status within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::Pending => "pending",
            StepState::Running => "running",
            StepState::Succeeded => "succeeded",
            StepState::Failed => "failed",
            StepState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A single execution instance of a runbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunbookRun {
    pub id: RunId,
    pub runbook_id: RunbookId,
    pub runbook_name: String,
    pub status: RunStatus,
    pub total_steps: usize,
    /// Index of the next step to execute (== total_steps when all ran).
    pub step_index: usize,
    pub step_statuses: Vec<StepState>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Who started the run ("manual", "schedule", ...).
    pub source: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl RunbookRun {
    /// Build a fresh queued run for a runbook.
    pub fn queued(
        id: RunId,
        runbook_id: RunbookId,
        runbook_name: impl Into<String>,
        total_steps: usize,
        source: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            runbook_id,
            runbook_name: runbook_name.into(),
            status: RunStatus::Queued,
            total_steps,
            step_index: 0,
            step_statuses: vec![StepState::Pending; total_steps],
            started_at: at,
            finished_at: None,
            error: None,
            source: source.into(),
            metadata: Map::new(),
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
