// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardrail policy records: rules, evaluation inputs, decisions, audit rows.

use crate::id::RuleId;
use crate::timeline::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Decision mode of a guardrail rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardrailMode {
    Allow,
    Warn,
    Confirm,
    Block,
}

impl GuardrailMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardrailMode::Allow => "allow",
            GuardrailMode::Warn => "warn",
            GuardrailMode::Confirm => "confirm",
            GuardrailMode::Block => "block",
        }
    }
}

impl fmt::Display for GuardrailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule's pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardrailScope {
    Action,
}

/// A stored guardrail rule.
///
/// Enabled rules are evaluated in descending `priority` order (ties broken
/// by id ascending); the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailRule {
    pub id: RuleId,
    pub name: String,
    pub scope: GuardrailScope,
    /// Regex matched against the action (or joined scope key).
    pub pattern: String,
    pub mode: GuardrailMode,
    pub severity: Severity,
    pub message: String,
    pub enabled: bool,
    pub priority: i64,
}

/// Input to a guardrail evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailInput {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl GuardrailInput {
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    /// Action joined with the command, for rules that pattern broader text.
    pub fn scope_key(&self) -> Option<String> {
        self.command
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| format!("{} {}", self.action, c))
    }
}

/// Outcome of evaluating an input against the rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailDecision {
    pub mode: GuardrailMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<RuleId>,
    pub severity: Severity,
    pub message: String,
    pub reason: String,
}

impl GuardrailDecision {
    /// The implicit decision when no rule matches.
    pub fn allow() -> Self {
        Self {
            mode: GuardrailMode::Allow,
            matched_rule_id: None,
            severity: Severity::Info,
            message: String::new(),
            reason: "no rule matched".to_string(),
        }
    }
}

/// Append-only audit row recorded for every non-allow decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailAudit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<RuleId>,
    pub decision: GuardrailMode,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_id: Option<String>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "guardrail_tests.rs"]
mod tests;
