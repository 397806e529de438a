// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbooks: named sequences of operator steps persisted in the store.

use crate::id::RunbookId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of a runbook step. Only shell commands are supported today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Command,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Command => "command",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared step of a runbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunbookStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub title: String,
    pub command: String,
}

/// Validation errors for runbook definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunbookDefError {
    #[error("runbook name must not be empty")]
    EmptyName,
    #[error("runbook must declare at least one step")]
    NoSteps,
    #[error("step {0} has an empty title")]
    EmptyStepTitle(usize),
    #[error("step {0} has an empty command")]
    EmptyStepCommand(usize),
}

/// A stored runbook definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runbook {
    pub id: RunbookId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<RunbookStep>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Runbook {
    /// Validate name and steps; the step kind set is enforced by the type.
    pub fn validate(name: &str, steps: &[RunbookStep]) -> Result<(), RunbookDefError> {
        if name.trim().is_empty() {
            return Err(RunbookDefError::EmptyName);
        }
        if steps.is_empty() {
            return Err(RunbookDefError::NoSteps);
        }
        for (i, step) in steps.iter().enumerate() {
            if step.title.trim().is_empty() {
                return Err(RunbookDefError::EmptyStepTitle(i));
            }
            if step.command.trim().is_empty() {
                return Err(RunbookDefError::EmptyStepCommand(i));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "runbook_tests.rs"]
mod tests;
