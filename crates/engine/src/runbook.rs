// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbook engine: CRUD over stored runbooks and the per-run state machine.
//!
//! Run lifecycle: `queued → running → (succeeded | failed | cancelled)`.
//! A cancelled parent context yields `cancelled`, never `failed` — the two
//! are distinct terminal states. Every terminal transition stamps
//! `finished_at`, emits `ops.job`, appends a timeline marker, and updates
//! the owning schedule's last-run status.

use chrono::{DateTime, Utc};
use sentinel_core::{
    Event, EventKind, IdGen, LastRunStatus, RunId, RunStatus, Runbook, RunbookDefError, RunbookId,
    RunbookRun, RunbookStep, StepState, UuidIdGen,
};
use sentinel_store::{Store, StoreError};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::executor::{ExecError, StepExecutor};
use crate::hub::Hub;
use crate::orchestrator::{Orchestrator, OrchestratorError};

/// Default per-step timeout when the caller does not override it.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from runbook operations.
#[derive(Debug, Error)]
pub enum RunbookError {
    #[error(transparent)]
    Def(#[from] RunbookDefError),
    #[error("runbook is disabled: {0}")]
    Disabled(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Parameters for one run execution.
pub struct RunParams {
    /// The queued run row, already persisted.
    pub run: RunbookRun,
    pub steps: Vec<RunbookStep>,
    pub step_timeout: Duration,
    /// Extra metadata merged into the run row when it starts (e.g. the
    /// schedule id for scheduled runs).
    pub extra_metadata: Map<String, Value>,
}

/// Engine owning runbook definitions and run execution.
#[derive(Clone)]
pub struct RunbookEngine {
    store: Store,
    hub: Hub,
    orchestrator: Orchestrator,
    executor: Arc<dyn StepExecutor>,
    ids: UuidIdGen,
}

impl RunbookEngine {
    pub fn new(
        store: Store,
        hub: Hub,
        orchestrator: Orchestrator,
        executor: Arc<dyn StepExecutor>,
    ) -> Self {
        Self {
            store,
            hub,
            orchestrator,
            executor,
            ids: UuidIdGen,
        }
    }

    // -- definitions ---------------------------------------------------------

    pub fn create_runbook(
        &self,
        name: &str,
        description: &str,
        steps: Vec<RunbookStep>,
        enabled: bool,
        at: DateTime<Utc>,
    ) -> Result<Runbook, RunbookError> {
        Runbook::validate(name, &steps)?;
        let runbook = Runbook {
            id: RunbookId::new(self.ids.next()),
            name: name.to_string(),
            description: description.to_string(),
            steps,
            enabled,
            created_at: at,
            updated_at: at,
        };
        self.store.upsert_runbook(runbook.clone())?;
        Ok(runbook)
    }

    pub fn update_runbook(
        &self,
        id: &RunbookId,
        name: &str,
        description: &str,
        steps: Vec<RunbookStep>,
        enabled: bool,
        at: DateTime<Utc>,
    ) -> Result<Runbook, RunbookError> {
        Runbook::validate(name, &steps)?;
        let existing = self
            .store
            .get_runbook(id.as_str())
            .ok_or_else(|| StoreError::not_found("runbook", id.as_str()))?;
        let runbook = Runbook {
            id: existing.id,
            name: name.to_string(),
            description: description.to_string(),
            steps,
            enabled,
            created_at: existing.created_at,
            updated_at: at,
        };
        self.store.upsert_runbook(runbook.clone())?;
        Ok(runbook)
    }

    /// Delete a runbook; schedules referencing it go with it.
    pub fn delete_runbook(&self, id: &RunbookId) -> Result<(), RunbookError> {
        self.store.delete_runbook(id)?;
        Ok(())
    }

    pub fn get_runbook(&self, id: &str) -> Option<Runbook> {
        self.store.get_runbook(id)
    }

    pub fn list_runbooks(&self) -> Vec<Runbook> {
        self.store.list_runbooks()
    }

    // -- runs ----------------------------------------------------------------

    /// Persist a queued run for a runbook. The caller dispatches the actual
    /// execution on a tracked task.
    pub fn create_run(
        &self,
        runbook_id: &RunbookId,
        source: &str,
        at: DateTime<Utc>,
    ) -> Result<(RunbookRun, Vec<RunbookStep>), RunbookError> {
        let runbook = self
            .store
            .get_runbook(runbook_id.as_str())
            .ok_or_else(|| StoreError::not_found("runbook", runbook_id.as_str()))?;
        if !runbook.enabled {
            return Err(RunbookError::Disabled(runbook.name));
        }
        let run = RunbookRun::queued(
            RunId::new(self.ids.next()),
            runbook.id.clone(),
            runbook.name.clone(),
            runbook.steps.len(),
            source,
            at,
        );
        self.store.upsert_run(run.clone())?;
        self.emit_job(&run);
        Ok((run, runbook.steps))
    }

    /// Execute a run to a terminal state.
    ///
    /// Never leaves the row `running` after returning: cancellation and
    /// step failures both land in their terminal status with `finished_at`
    /// set.
    pub async fn run(&self, params: RunParams, cancel: CancellationToken) -> RunbookRun {
        let RunParams {
            mut run,
            steps,
            step_timeout,
            extra_metadata,
        } = params;

        run.status = RunStatus::Running;
        for (key, value) in extra_metadata {
            run.metadata.insert(key, value);
        }
        self.persist(&run);
        let _ = self.orchestrator.record_runbook_started(&run, Utc::now());

        for (index, step) in steps.iter().enumerate() {
            if cancel.is_cancelled() {
                self.finish_step(&mut run, index, StepState::Cancelled);
                return self.finish(run, RunStatus::Cancelled, None).await;
            }

            run.step_index = index;
            self.set_step(&mut run, index, StepState::Running);
            self.persist(&run);

            match self.executor.execute(step, step_timeout, &cancel).await {
                Ok(_output) => {
                    self.finish_step(&mut run, index, StepState::Succeeded);
                    run.step_index = index + 1;
                    self.persist(&run);
                }
                Err(ExecError::Cancelled) => {
                    self.finish_step(&mut run, index, StepState::Cancelled);
                    return self.finish(run, RunStatus::Cancelled, None).await;
                }
                Err(error) => {
                    self.finish_step(&mut run, index, StepState::Failed);
                    let message = format!("step {:?} failed: {error}", step.title);
                    return self.finish(run, RunStatus::Failed, Some(message)).await;
                }
            }
        }

        self.finish(run, RunStatus::Succeeded, None).await
    }

    fn set_step(&self, run: &mut RunbookRun, index: usize, state: StepState) {
        if let Some(slot) = run.step_statuses.get_mut(index) {
            *slot = state;
        }
    }

    fn finish_step(&self, run: &mut RunbookRun, index: usize, state: StepState) {
        self.set_step(run, index, state);
    }

    async fn finish(
        &self,
        mut run: RunbookRun,
        status: RunStatus,
        error: Option<String>,
    ) -> RunbookRun {
        let now = Utc::now();
        run.status = status;
        run.error = error;
        run.finished_at = Some(now);
        self.persist(&run);
        let _ = self.orchestrator.record_runbook_finished(&run, now);
        self.update_schedule_status(&run, now);
        info!(run = %run.id, status = %run.status, "run finished");
        run
    }

    /// Persist and broadcast the current run row. Store failures here are
    /// logged, not propagated: the run loop has no caller to surface them
    /// to, and the terminal state still lands via the next persist.
    fn persist(&self, run: &RunbookRun) {
        if let Err(error) = self.store.upsert_run(run.clone()) {
            tracing::error!(run = %run.id, %error, "failed to persist run row");
        }
        self.emit_job(run);
    }

    fn emit_job(&self, run: &RunbookRun) {
        self.hub.publish(
            &Event::with_rev(EventKind::OpsJob, self.store.global_rev())
                .field("runId", run.id.as_str())
                .field("status", run.status.as_str())
                .field("stepIndex", run.step_index as u64),
        );
    }

    fn update_schedule_status(&self, run: &RunbookRun, at: DateTime<Utc>) {
        let Some(schedule_id) = run.metadata.get("scheduleId").and_then(Value::as_str) else {
            return;
        };
        let Some(mut schedule) = self.store.get_schedule(schedule_id) else {
            return;
        };
        schedule.last_run_status = match run.status {
            RunStatus::Succeeded => LastRunStatus::Succeeded,
            RunStatus::Cancelled => LastRunStatus::Cancelled,
            RunStatus::Failed => LastRunStatus::Failed,
            RunStatus::Running => LastRunStatus::Running,
            RunStatus::Queued => LastRunStatus::None,
        };
        schedule.updated_at = at;
        if let Err(error) = self.store.upsert_schedule(schedule) {
            tracing::error!(run = %run.id, %error, "failed to update schedule status");
        }
    }
}

#[cfg(test)]
#[path = "runbook_tests.rs"]
mod tests;
