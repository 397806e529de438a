// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardrail-rule and recovery store operations.

use chrono::{DateTime, Utc};
use sentinel_core::{
    GuardrailAudit, GuardrailRule, KilledSession, RecoverySnapshot, RestoreJob, RuleId,
};

use crate::event::StoreEvent;
use crate::store::{Store, StoreError};

impl Store {
    // -- guardrail rules -----------------------------------------------------

    pub fn upsert_guardrail_rule(&self, rule: GuardrailRule) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::GuardrailRuleUpserted { rule, rev }], rev))
        })
    }

    pub fn delete_guardrail_rule(&self, id: &RuleId) -> Result<u64, StoreError> {
        self.commit(|state| {
            if !state.guardrail_rules.contains_key(id.as_str()) {
                return Err(StoreError::not_found("guardrail rule", id.as_str()));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::GuardrailRuleDeleted {
                    id: id.clone(),
                    rev,
                }],
                rev,
            ))
        })
    }

    pub fn get_guardrail_rule(&self, id: &str) -> Option<GuardrailRule> {
        self.read(|state| state.guardrail_rules.get(id).cloned())
    }

    /// All rules, highest priority first (ties broken by id ascending).
    pub fn list_guardrail_rules(&self) -> Vec<GuardrailRule> {
        self.read(|state| {
            let mut rows: Vec<_> = state.guardrail_rules.values().cloned().collect();
            rows.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.id.as_str().cmp(b.id.as_str()))
            });
            rows
        })
    }

    pub fn append_guardrail_audit(&self, audit: GuardrailAudit) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::GuardrailAuditAppended { audit, rev }],
                rev,
            ))
        })
    }

    /// Audit rows, newest first, capped to `limit`.
    pub fn list_guardrail_audit(&self, limit: usize) -> Vec<GuardrailAudit> {
        self.read(|state| {
            state
                .guardrail_audit
                .iter()
                .rev()
                .take(limit)
                .cloned()
                .collect()
        })
    }

    // -- recovery ------------------------------------------------------------

    pub fn record_recovery_snapshot(&self, snapshot: RecoverySnapshot) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::RecoverySnapshotRecorded { snapshot, rev }],
                rev,
            ))
        })
    }

    pub fn get_recovery_snapshot(&self, id: &str) -> Option<RecoverySnapshot> {
        self.read(|state| state.recovery_snapshots.get(id).cloned())
    }

    /// Snapshots for one session, newest first, capped to `limit`.
    pub fn list_recovery_snapshots(&self, session: &str, limit: usize) -> Vec<RecoverySnapshot> {
        self.read(|state| {
            let mut rows: Vec<_> = state
                .recovery_snapshots
                .values()
                .filter(|s| s.session_name == session)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
            rows.truncate(limit);
            rows
        })
    }

    /// Recent snapshots across all sessions, newest first.
    pub fn recent_recovery_snapshots(&self, limit: usize) -> Vec<RecoverySnapshot> {
        self.read(|state| {
            let mut rows: Vec<_> = state.recovery_snapshots.values().cloned().collect();
            rows.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
            rows.truncate(limit);
            rows
        })
    }

    pub fn record_killed_session(&self, killed: KilledSession) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::KilledSessionRecorded { killed, rev }],
                rev,
            ))
        })
    }

    /// Killed sessions, most recently seen first.
    pub fn list_killed_sessions(&self, include_archived: bool) -> Vec<KilledSession> {
        self.read(|state| {
            let mut rows: Vec<_> = state
                .killed_sessions
                .values()
                .filter(|k| include_archived || !k.archived)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
            rows
        })
    }

    /// Mark a killed session archived (terminal in the recovery queue).
    pub fn archive_killed_session(
        &self,
        session_name: &str,
        at: DateTime<Utc>,
    ) -> Result<KilledSession, StoreError> {
        self.commit(|state| {
            let killed = state
                .killed_sessions
                .get(session_name)
                .cloned()
                .ok_or_else(|| StoreError::not_found("killed session", session_name))?;
            if killed.archived {
                return Ok((Vec::new(), killed));
            }
            let rev = state.global_rev + 1;
            let mut updated = killed;
            updated.archived = true;
            Ok((
                vec![StoreEvent::KilledSessionArchived {
                    session_name: session_name.to_string(),
                    rev,
                    at,
                }],
                updated,
            ))
        })
    }

    pub fn upsert_restore_job(&self, job: RestoreJob) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::RestoreJobUpserted { job, rev }], rev))
        })
    }

    pub fn get_restore_job(&self, id: &str) -> Option<RestoreJob> {
        self.read(|state| state.restore_jobs.get(id).cloned())
    }
}

#[cfg(test)]
#[path = "store_recovery_tests.rs"]
mod tests;
