// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule service: cron and one-shot schedules over runbooks.
//!
//! `trigger` dispatches the run on a tracked task (so shutdown can drain
//! it) and recomputes `next_run_at` even for manual triggers — a cron
//! schedule stays enabled and moves to its next wall-clock slot. The
//! periodic loop that fires due schedules lives in the daemon; it calls
//! [`ScheduleService::fire_due`].

use chrono::{DateTime, Utc};
use sentinel_core::{
    Event, EventKind, IdGen, LastRunStatus, RunbookRun, Schedule, ScheduleId, ScheduleKind,
    UuidIdGen,
};
use sentinel_store::{Store, StoreError};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::cron::{cron_next_tz, parse_cron, parse_tz, CronError};
use crate::hub::Hub;
use crate::runbook::{RunParams, RunbookEngine, RunbookError, DEFAULT_STEP_TIMEOUT};

/// Errors from schedule operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Cron(#[from] CronError),
    #[error("invalid schedule: {0}")]
    Invalid(&'static str),
    #[error("runAt must be in the future")]
    RunAtInPast,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Runbook(#[from] RunbookError),
}

/// Caller-supplied schedule definition for create/update.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub runbook_id: sentinel_core::RunbookId,
    pub name: String,
    pub kind: ScheduleKind,
    pub cron_expr: Option<String>,
    pub timezone: Option<String>,
    pub run_at: Option<DateTime<Utc>>,
    pub enabled: bool,
}

/// Schedule CRUD + trigger, with tracked run dispatch.
#[derive(Clone)]
pub struct ScheduleService {
    store: Store,
    engine: RunbookEngine,
    hub: Hub,
    tracker: TaskTracker,
    cancel: CancellationToken,
    ids: UuidIdGen,
}

impl ScheduleService {
    pub fn new(
        store: Store,
        engine: RunbookEngine,
        hub: Hub,
        tracker: TaskTracker,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            engine,
            hub,
            tracker,
            cancel,
            ids: UuidIdGen,
        }
    }

    pub fn list(&self) -> Vec<Schedule> {
        self.store.list_schedules()
    }

    pub fn get(&self, id: &str) -> Option<Schedule> {
        self.store.get_schedule(id)
    }

    /// Create a schedule; `next_run_at` is computed from `at`.
    pub fn create(&self, spec: ScheduleSpec, at: DateTime<Utc>) -> Result<Schedule, SchedulerError> {
        let next_run_at = self.validate(&spec, at)?;
        let schedule = Schedule {
            id: ScheduleId::new(self.ids.next()),
            runbook_id: spec.runbook_id,
            name: spec.name,
            kind: spec.kind,
            cron_expr: spec.cron_expr,
            timezone: spec.timezone,
            run_at: spec.run_at,
            enabled: spec.enabled,
            next_run_at,
            last_run_at: None,
            last_run_status: LastRunStatus::None,
            created_at: at,
            updated_at: at,
        };
        self.store.upsert_schedule(schedule.clone())?;
        self.emit_updated(&schedule);
        Ok(schedule)
    }

    /// Update a schedule in place; run history fields are preserved.
    pub fn update(
        &self,
        id: &str,
        spec: ScheduleSpec,
        at: DateTime<Utc>,
    ) -> Result<Schedule, SchedulerError> {
        let existing = self
            .store
            .get_schedule(id)
            .ok_or_else(|| StoreError::not_found("schedule", id))?;
        let next_run_at = self.validate(&spec, at)?;
        let schedule = Schedule {
            id: existing.id,
            runbook_id: spec.runbook_id,
            name: spec.name,
            kind: spec.kind,
            cron_expr: spec.cron_expr,
            timezone: spec.timezone,
            run_at: spec.run_at,
            enabled: spec.enabled,
            next_run_at,
            last_run_at: existing.last_run_at,
            last_run_status: existing.last_run_status,
            created_at: existing.created_at,
            updated_at: at,
        };
        self.store.upsert_schedule(schedule.clone())?;
        self.emit_updated(&schedule);
        Ok(schedule)
    }

    pub fn delete(&self, id: &ScheduleId) -> Result<(), SchedulerError> {
        self.store.delete_schedule(id)?;
        self.hub
            .publish(&Event::with_rev(EventKind::ScheduleUpdated, self.store.global_rev()));
        Ok(())
    }

    /// Fire a schedule now.
    ///
    /// Creates the run, dispatches it on a tracked task, stamps
    /// `last_run_at`/`last_run_status = running`, and recomputes
    /// `next_run_at` for cron schedules. One-shots keep their `next_run_at`
    /// and stay untouched otherwise; `enabled` never changes here.
    pub fn trigger(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<(Schedule, RunbookRun), SchedulerError> {
        let mut schedule = self
            .store
            .get_schedule(id)
            .ok_or_else(|| StoreError::not_found("schedule", id))?;

        let (run, steps) = self.engine.create_run(&schedule.runbook_id, "schedule", at)?;

        let mut extra = Map::new();
        extra.insert(
            "scheduleId".to_string(),
            Value::from(schedule.id.as_str()),
        );
        let params = RunParams {
            run: run.clone(),
            steps,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            extra_metadata: extra,
        };
        let engine = self.engine.clone();
        let cancel = self.cancel.child_token();
        self.tracker.spawn(async move {
            engine.run(params, cancel).await;
        });

        schedule.last_run_at = Some(at);
        schedule.last_run_status = LastRunStatus::Running;
        if schedule.kind == ScheduleKind::Cron {
            schedule.next_run_at = self.cron_next(&schedule, at)?;
        }
        schedule.updated_at = at;
        self.store.upsert_schedule(schedule.clone())?;
        self.emit_updated(&schedule);

        info!(schedule = %schedule.id, run = %run.id, "schedule triggered");
        Ok((schedule, run))
    }

    /// Enabled schedules whose `next_run_at` has passed.
    pub fn due(&self, at: DateTime<Utc>) -> Vec<Schedule> {
        self.store
            .list_schedules()
            .into_iter()
            .filter(|s| s.enabled && s.next_run_at.map_or(false, |next| next <= at))
            .collect()
    }

    /// Fire every due schedule. One-shots are disabled after firing so
    /// they cannot fire twice. Returns the number fired.
    pub fn fire_due(&self, at: DateTime<Utc>) -> usize {
        let due = self.due(at);
        let mut fired = 0;
        for schedule in due {
            match self.trigger(schedule.id.as_str(), at) {
                Ok((mut updated, _run)) => {
                    fired += 1;
                    if updated.kind == ScheduleKind::Once {
                        updated.enabled = false;
                        updated.updated_at = at;
                        if let Err(error) = self.store.upsert_schedule(updated.clone()) {
                            warn!(schedule = %updated.id, %error, "failed to disable one-shot");
                        }
                        self.emit_updated(&updated);
                    }
                }
                Err(error) => {
                    warn!(schedule = %schedule.id, %error, "failed to fire due schedule");
                }
            }
        }
        fired
    }

    /// Interval the daemon's pump should poll `fire_due` at.
    pub fn suggested_poll_interval() -> Duration {
        Duration::from_secs(30)
    }

    fn validate(
        &self,
        spec: &ScheduleSpec,
        at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        if spec.name.trim().is_empty() {
            return Err(SchedulerError::Invalid("name must not be empty"));
        }
        if self.store.get_runbook(spec.runbook_id.as_str()).is_none() {
            return Err(SchedulerError::Store(StoreError::not_found(
                "runbook",
                spec.runbook_id.as_str(),
            )));
        }
        match spec.kind {
            ScheduleKind::Cron => {
                let expr = spec
                    .cron_expr
                    .as_deref()
                    .ok_or(SchedulerError::Invalid("cronExpr is required for cron schedules"))?;
                let tz_name = spec
                    .timezone
                    .as_deref()
                    .ok_or(SchedulerError::Invalid("timezone is required for cron schedules"))?;
                let cron = parse_cron(expr)?;
                let tz = parse_tz(tz_name)?;
                Ok(cron_next_tz(&cron, tz, at))
            }
            ScheduleKind::Once => {
                let run_at = spec
                    .run_at
                    .ok_or(SchedulerError::Invalid("runAt is required for one-shot schedules"))?;
                if run_at <= at {
                    return Err(SchedulerError::RunAtInPast);
                }
                Ok(Some(run_at))
            }
        }
    }

    fn cron_next(
        &self,
        schedule: &Schedule,
        at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        let expr = schedule
            .cron_expr
            .as_deref()
            .ok_or(SchedulerError::Invalid("cron schedule without cronExpr"))?;
        let tz_name = schedule
            .timezone
            .as_deref()
            .ok_or(SchedulerError::Invalid("cron schedule without timezone"))?;
        let cron = parse_cron(expr)?;
        let tz = parse_tz(tz_name)?;
        Ok(cron_next_tz(&cron, tz, at))
    }

    fn emit_updated(&self, schedule: &Schedule) {
        self.hub.publish(
            &Event::with_rev(EventKind::ScheduleUpdated, self.store.global_rev())
                .field("scheduleId", schedule.id.as_str()),
        );
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
