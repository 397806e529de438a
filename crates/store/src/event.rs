// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable store events.
//!
//! Every mutating store operation is recorded as one or more `StoreEvent`s
//! appended to the WAL. Applying the same sequence of events to an empty
//! [`crate::MaterializedState`] reproduces the state exactly, which is how
//! startup recovery works (snapshot + replay). Events therefore carry all
//! non-deterministic inputs — timestamps, assigned revisions, generated
//! rows — rather than recomputing them at apply time.
//!
//! Serializes with `{"type": "event:name", ...fields}` format.

use chrono::{DateTime, Utc};
use sentinel_core::{
    Alert, AlertId, CustomService, GuardrailAudit, GuardrailRule, KilledSession, RecoverySnapshot,
    RestoreJob, RuleId, RunId, Runbook, RunbookId, RunbookRun, Schedule, ScheduleId, TimelineEvent,
};
use serde::{Deserialize, Serialize};

use crate::projection::{
    ChangeKind, PaneProjection, SeenScope, SessionMeta, SessionProjection, StorageResource,
    WindowProjection,
};

/// Events that mutate durable store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    // -- multiplexer projections --
    #[serde(rename = "session:upserted")]
    SessionUpserted {
        session: SessionProjection,
        change: ChangeKind,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "session:removed")]
    SessionRemoved {
        name: String,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "window:upserted")]
    WindowUpserted {
        window: WindowProjection,
        change: ChangeKind,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "window:removed")]
    WindowRemoved {
        session: String,
        window_index: u32,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "pane:upserted")]
    PaneUpserted {
        pane: PaneProjection,
        change: ChangeKind,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "pane:removed")]
    PaneRemoved {
        pane_id: String,
        rev: u64,
        at: DateTime<Utc>,
    },

    /// Seen watermark advanced on the listed panes.
    #[serde(rename = "panes:seen")]
    SeenMarked {
        session: String,
        scope: SeenScope,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window_index: Option<u32>,
        pane_ids: Vec<String>,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "session-meta:set")]
    SessionMetaSet { meta: SessionMeta },

    /// Result of a window-sequence allocation (`max(min, stored + 1)`).
    #[serde(rename = "window-seq:allocated")]
    WindowSeqAllocated { session: String, value: u32 },

    #[serde(rename = "runtime:set")]
    RuntimeKvSet { key: String, value: String },

    #[serde(rename = "boot-id:set")]
    BootIdSet { boot_id: String },

    #[serde(rename = "storage:flushed")]
    ResourceFlushed {
        resource: StorageResource,
        at: DateTime<Utc>,
    },

    // -- operator timeline & alerts --
    #[serde(rename = "timeline:appended")]
    TimelineAppended { event: TimelineEvent, rev: u64 },

    /// Carries the merged row: dedupe against the existing open alert is
    /// resolved before the event is recorded.
    #[serde(rename = "alert:upserted")]
    AlertUpserted { alert: Alert, rev: u64 },

    #[serde(rename = "alert:acked")]
    AlertAcked {
        id: AlertId,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "alert:resolved")]
    AlertResolved {
        id: AlertId,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "alert:deleted")]
    AlertDeleted { id: AlertId, rev: u64 },

    // -- custom services --
    #[serde(rename = "service:registered")]
    ServiceRegistered { service: CustomService, rev: u64 },

    #[serde(rename = "service:unregistered")]
    ServiceUnregistered { name: String, rev: u64 },

    // -- runbooks, runs, schedules --
    #[serde(rename = "runbook:upserted")]
    RunbookUpserted { runbook: Runbook, rev: u64 },

    /// Cascades: schedules referencing the runbook are deleted in the same
    /// transaction.
    #[serde(rename = "runbook:deleted")]
    RunbookDeleted { id: RunbookId, rev: u64 },

    #[serde(rename = "run:upserted")]
    RunUpserted { run: RunbookRun, rev: u64 },

    #[serde(rename = "run:deleted")]
    RunDeleted { id: RunId, rev: u64 },

    #[serde(rename = "schedule:upserted")]
    ScheduleUpserted { schedule: Schedule, rev: u64 },

    #[serde(rename = "schedule:deleted")]
    ScheduleDeleted { id: ScheduleId, rev: u64 },

    // -- guardrails --
    #[serde(rename = "guardrail-rule:upserted")]
    GuardrailRuleUpserted { rule: GuardrailRule, rev: u64 },

    #[serde(rename = "guardrail-rule:deleted")]
    GuardrailRuleDeleted { id: RuleId, rev: u64 },

    #[serde(rename = "guardrail-audit:appended")]
    GuardrailAuditAppended { audit: GuardrailAudit, rev: u64 },

    // -- recovery --
    #[serde(rename = "recovery-snapshot:recorded")]
    RecoverySnapshotRecorded { snapshot: RecoverySnapshot, rev: u64 },

    #[serde(rename = "killed-session:recorded")]
    KilledSessionRecorded { killed: KilledSession, rev: u64 },

    #[serde(rename = "killed-session:archived")]
    KilledSessionArchived {
        session_name: String,
        rev: u64,
        at: DateTime<Utc>,
    },

    #[serde(rename = "restore-job:upserted")]
    RestoreJobUpserted { job: RestoreJob, rev: u64 },
}

impl StoreEvent {
    /// The global revision this event commits at, if it bumps one.
    pub fn rev(&self) -> Option<u64> {
        match self {
            StoreEvent::SessionUpserted { rev, .. }
            | StoreEvent::SessionRemoved { rev, .. }
            | StoreEvent::WindowUpserted { rev, .. }
            | StoreEvent::WindowRemoved { rev, .. }
            | StoreEvent::PaneUpserted { rev, .. }
            | StoreEvent::PaneRemoved { rev, .. }
            | StoreEvent::SeenMarked { rev, .. }
            | StoreEvent::TimelineAppended { rev, .. }
            | StoreEvent::AlertUpserted { rev, .. }
            | StoreEvent::AlertAcked { rev, .. }
            | StoreEvent::AlertResolved { rev, .. }
            | StoreEvent::AlertDeleted { rev, .. }
            | StoreEvent::ServiceRegistered { rev, .. }
            | StoreEvent::ServiceUnregistered { rev, .. }
            | StoreEvent::RunbookUpserted { rev, .. }
            | StoreEvent::RunbookDeleted { rev, .. }
            | StoreEvent::RunUpserted { rev, .. }
            | StoreEvent::RunDeleted { rev, .. }
            | StoreEvent::ScheduleUpserted { rev, .. }
            | StoreEvent::ScheduleDeleted { rev, .. }
            | StoreEvent::GuardrailRuleUpserted { rev, .. }
            | StoreEvent::GuardrailRuleDeleted { rev, .. }
            | StoreEvent::GuardrailAuditAppended { rev, .. }
            | StoreEvent::RecoverySnapshotRecorded { rev, .. }
            | StoreEvent::KilledSessionRecorded { rev, .. }
            | StoreEvent::KilledSessionArchived { rev, .. }
            | StoreEvent::RestoreJobUpserted { rev, .. } => Some(*rev),
            StoreEvent::SessionMetaSet { .. }
            | StoreEvent::WindowSeqAllocated { .. }
            | StoreEvent::RuntimeKvSet { .. }
            | StoreEvent::BootIdSet { .. }
            | StoreEvent::ResourceFlushed { .. } => None,
        }
    }
}
