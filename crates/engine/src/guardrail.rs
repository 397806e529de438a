// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardrail policy evaluator.
//!
//! Destructive mutations pass through [`GuardrailService::enforce`] before
//! reaching a driver. Rules are compiled once and cached; the cache is
//! invalidated on rule changes and rebuilt on the next evaluation
//! (read-through). Evaluation is fail-closed: if rules cannot be loaded or
//! compiled the decision is an internal error, the caller must refuse the
//! mutation, and the HTTP layer maps it to `503`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use sentinel_core::{
    GuardrailAudit, GuardrailDecision, GuardrailInput, GuardrailMode, GuardrailRule, RuleId,
};
use sentinel_store::{Store, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors from guardrail operations.
#[derive(Debug, Error)]
pub enum GuardrailError {
    /// A `confirm` rule matched and the caller did not carry the
    /// confirmation marker.
    #[error("confirmation required: {}", .decision.message)]
    ConfirmRequired { decision: GuardrailDecision },
    /// A `block` rule matched; never bypassable.
    #[error("blocked by guardrail: {}", .decision.message)]
    Blocked { decision: GuardrailDecision },
    /// Rule loading or compilation failed; evaluation fails closed.
    #[error("guardrail evaluation unavailable: {0}")]
    Internal(String),
    #[error("invalid rule pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct CompiledRule {
    rule: GuardrailRule,
    regex: Regex,
}

/// Policy evaluator with an RCU-style compiled-rule cache.
pub struct GuardrailService {
    store: Store,
    cache: RwLock<Option<Arc<Vec<CompiledRule>>>>,
}

impl GuardrailService {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
        }
    }

    pub fn list_rules(&self) -> Vec<GuardrailRule> {
        self.store.list_guardrail_rules()
    }

    pub fn get_rule(&self, id: &str) -> Option<GuardrailRule> {
        self.store.get_guardrail_rule(id)
    }

    /// Create or update a rule. The pattern must compile.
    pub fn upsert_rule(&self, rule: GuardrailRule) -> Result<GuardrailRule, GuardrailError> {
        Regex::new(&rule.pattern).map_err(|e| GuardrailError::InvalidPattern {
            pattern: rule.pattern.clone(),
            message: e.to_string(),
        })?;
        self.store.upsert_guardrail_rule(rule.clone())?;
        *self.cache.write() = None;
        Ok(rule)
    }

    pub fn delete_rule(&self, id: &RuleId) -> Result<(), GuardrailError> {
        self.store.delete_guardrail_rule(id)?;
        *self.cache.write() = None;
        Ok(())
    }

    pub fn audit(&self, limit: usize) -> Vec<GuardrailAudit> {
        self.store.list_guardrail_audit(limit)
    }

    /// Evaluate an input against the enabled rules.
    ///
    /// Every non-allow decision appends an audit row.
    pub fn evaluate(
        &self,
        input: &GuardrailInput,
        at: DateTime<Utc>,
    ) -> Result<GuardrailDecision, GuardrailError> {
        let rules = self.compiled_rules()?;

        let mut decision = GuardrailDecision::allow();
        for compiled in rules.iter() {
            let matched = compiled.regex.is_match(&input.action)
                || input
                    .scope_key()
                    .map(|key| compiled.regex.is_match(&key))
                    .unwrap_or(false);
            if matched {
                decision = GuardrailDecision {
                    mode: compiled.rule.mode,
                    matched_rule_id: Some(compiled.rule.id.clone()),
                    severity: compiled.rule.severity,
                    message: compiled.rule.message.clone(),
                    reason: format!("matched rule {}", compiled.rule.id),
                };
                break;
            }
        }

        if decision.mode != GuardrailMode::Allow {
            self.store.append_guardrail_audit(GuardrailAudit {
                rule_id: decision.matched_rule_id.clone(),
                decision: decision.mode,
                action: input.action.clone(),
                command: input.command.clone(),
                session_name: input.session_name.clone(),
                window_index: input.window_index,
                pane_id: input.pane_id.clone(),
                reason: decision.reason.clone(),
                metadata: input.metadata.clone(),
                created_at: at,
            })?;
        }

        Ok(decision)
    }

    /// Gate a mutation: evaluate, then refuse on `confirm` (without the
    /// out-of-band marker) and on `block`.
    pub fn enforce(
        &self,
        input: &GuardrailInput,
        confirmed: bool,
        at: DateTime<Utc>,
    ) -> Result<GuardrailDecision, GuardrailError> {
        let decision = self.evaluate(input, at)?;
        match decision.mode {
            GuardrailMode::Allow | GuardrailMode::Warn => Ok(decision),
            GuardrailMode::Confirm if confirmed => Ok(decision),
            GuardrailMode::Confirm => Err(GuardrailError::ConfirmRequired { decision }),
            GuardrailMode::Block => Err(GuardrailError::Blocked { decision }),
        }
    }

    fn compiled_rules(&self) -> Result<Arc<Vec<CompiledRule>>, GuardrailError> {
        if let Some(rules) = self.cache.read().as_ref() {
            return Ok(Arc::clone(rules));
        }

        // Rebuild outside the read lock; last writer wins.
        let mut compiled = Vec::new();
        for rule in self.store.list_guardrail_rules() {
            if !rule.enabled {
                continue;
            }
            match Regex::new(&rule.pattern) {
                Ok(regex) => compiled.push(CompiledRule { rule, regex }),
                Err(e) => {
                    warn!(rule = %rule.id, error = %e, "guardrail rule failed to compile");
                    return Err(GuardrailError::Internal(format!(
                        "rule {} has an invalid pattern",
                        rule.id
                    )));
                }
            }
        }
        let compiled = Arc::new(compiled);
        *self.cache.write() = Some(Arc::clone(&compiled));
        Ok(compiled)
    }
}

#[cfg(test)]
#[path = "guardrail_tests.rs"]
mod tests;
