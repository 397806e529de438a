// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentinel-core: shared domain records for the Sentinel control plane

pub mod alert;
pub mod event;
pub mod guardrail;
pub mod id;
pub mod recovery;
pub mod run;
pub mod runbook;
pub mod schedule;
pub mod service;
pub mod timeline;
pub mod validate;

pub use alert::{Alert, AlertStatus};
pub use event::{Event, EventKind};
pub use guardrail::{
    GuardrailAudit, GuardrailDecision, GuardrailInput, GuardrailMode, GuardrailRule, GuardrailScope,
};
pub use id::{AlertId, IdGen, RestoreJobId, RuleId, RunId, RunbookId, ScheduleId, SequentialIdGen,
    ShortId, SnapshotId, UuidIdGen};
pub use recovery::{
    ConflictPolicy, KilledSession, RecoverySnapshot, RestoreJob, RestoreJobStatus, RestoreMode,
    RestoreOptions,
};
pub use run::{RunStatus, RunbookRun, StepState};
pub use runbook::{Runbook, RunbookDefError, RunbookStep, StepKind};
pub use schedule::{LastRunStatus, Schedule, ScheduleKind};
pub use service::{session_meta_hash, CustomService, ServiceScope};
pub use timeline::{EventSource, Severity, TimelineEvent};
