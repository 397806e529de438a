// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery controller: killed-session overview, snapshot enumeration, and
//! the async restore-job queue.
//!
//! Restore jobs are enqueued `queued`; the worker that drives them to
//! `running -> (succeeded | failed)` is a separate collaborator. Reads
//! translate missing ids to not-found errors the HTTP layer maps to `404`.

use chrono::{DateTime, Utc};
use sentinel_core::validate::{self, ValidateError};
use sentinel_core::{
    Event, EventKind, IdGen, KilledSession, RecoverySnapshot, RestoreJob, RestoreJobId,
    RestoreJobStatus, RestoreOptions, SnapshotId, UuidIdGen,
};
use sentinel_store::{Store, StoreError};
use serde::Serialize;
use thiserror::Error;

use crate::hub::Hub;

/// How many cross-session snapshots ride along in the overview.
const OVERVIEW_SNAPSHOTS: usize = 20;

/// Errors from recovery operations.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Overview payload: current boot, killed sessions, recent snapshots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryOverview {
    pub boot_id: String,
    pub killed_sessions: Vec<KilledSession>,
    pub recent_snapshots: Vec<RecoverySnapshot>,
}

/// Controller over recovery state.
#[derive(Clone)]
pub struct RecoveryController {
    store: Store,
    hub: Hub,
    ids: UuidIdGen,
}

impl RecoveryController {
    pub fn new(store: Store, hub: Hub) -> Self {
        Self {
            store,
            hub,
            ids: UuidIdGen,
        }
    }

    pub fn overview(&self) -> RecoveryOverview {
        RecoveryOverview {
            boot_id: self.store.boot_id(),
            killed_sessions: self.store.list_killed_sessions(false),
            recent_snapshots: self.store.recent_recovery_snapshots(OVERVIEW_SNAPSHOTS),
        }
    }

    pub fn list_killed_sessions(&self) -> Vec<KilledSession> {
        self.store.list_killed_sessions(false)
    }

    pub fn list_snapshots(
        &self,
        session: &str,
        limit: usize,
    ) -> Result<Vec<RecoverySnapshot>, RecoveryError> {
        validate::session_name(session)?;
        Ok(self.store.list_recovery_snapshots(session, limit))
    }

    pub fn get_snapshot(&self, id: &str) -> Result<RecoverySnapshot, RecoveryError> {
        self.store
            .get_recovery_snapshot(id)
            .ok_or_else(|| StoreError::not_found("snapshot", id).into())
    }

    /// Enqueue an async restore of a snapshot. The job starts `queued`;
    /// the restore worker transitions it from there.
    pub fn restore_async(
        &self,
        snapshot_id: &str,
        options: RestoreOptions,
        at: DateTime<Utc>,
    ) -> Result<RestoreJob, RecoveryError> {
        let snapshot = self.get_snapshot(snapshot_id)?;
        let target_session = match options.target_session {
            Some(target) => {
                validate::session_name(&target)?;
                target
            }
            None => snapshot.session_name.clone(),
        };

        let job = RestoreJob {
            id: RestoreJobId::new(self.ids.next()),
            snapshot_id: SnapshotId::new(snapshot_id),
            status: RestoreJobStatus::Queued,
            mode: options.mode,
            conflict_policy: options.conflict_policy,
            target_session,
            created_at: at,
            finished_at: None,
            error: None,
        };
        self.store.upsert_restore_job(job.clone())?;
        self.emit_overview();
        Ok(job)
    }

    pub fn get_job(&self, id: &str) -> Result<RestoreJob, RecoveryError> {
        self.store
            .get_restore_job(id)
            .ok_or_else(|| StoreError::not_found("restore job", id).into())
    }

    /// Archive a killed session (terminal state in the recovery queue).
    pub fn archive_session(
        &self,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<KilledSession, RecoveryError> {
        validate::session_name(name)?;
        let killed = self.store.archive_killed_session(name, at)?;
        self.emit_overview();
        Ok(killed)
    }

    fn emit_overview(&self) {
        self.hub.publish(&Event::with_rev(
            EventKind::RecoveryOverview,
            self.store.global_rev(),
        ));
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
