// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store facade: typed operations over the materialized state, each one
//! a single transaction that bumps the global revision, appends journal
//! entries, and records durable events on the WAL.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::event::StoreEvent;
use crate::projection::{
    ChangeKind, InspectorPatch, JournalEntry, PaneObservation, PaneProjection, SeenScope,
    SessionActivityPatch, SessionMeta, SessionObservation, SessionProjection, StorageResource,
    StorageStats, WindowObservation, WindowProjection,
};
use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} already exists: {id}")]
    Exists { kind: &'static str, id: String },
    #[error("{kind} {id}: {reason}")]
    Conflict {
        kind: &'static str,
        id: String,
        reason: &'static str,
    },
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Outcome of a mark-seen operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkSeen {
    /// True iff any row changed (false on the idempotent second call).
    pub changed: bool,
    pub global_rev: u64,
}

/// Durable store handle shared across components.
///
/// Writes serialize on the state mutex; WAL appends happen inside the same
/// critical section so replay order always matches commit order (appends
/// only buffer in memory — file I/O happens in `flush`, outside the state
/// lock).
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<MaterializedState>>,
    wal: Arc<Mutex<Wal>>,
    snapshot_path: PathBuf,
}

impl Store {
    /// Open the store under a state directory: load the latest snapshot,
    /// then replay any WAL entries recorded after it.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let snapshot_path = state_dir.join("snapshot.zst");
        let wal_path = state_dir.join("wal").join("events.wal");

        let mut state = Snapshot::load(&snapshot_path)?
            .map(|s| s.state)
            .unwrap_or_default();

        let (wal, replay) = Wal::open(&wal_path)?;
        let replayed = replay.len();
        for event in &replay {
            state.apply_event(event);
        }
        if replayed > 0 {
            info!(replayed, "store recovered from WAL replay");
        }

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            wal: Arc::new(Mutex::new(wal)),
            snapshot_path,
        })
    }

    /// Write a durable snapshot and truncate the WAL.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let state = self.state.lock().clone();
        Snapshot::new(state).save(&self.snapshot_path)?;
        let mut wal = self.wal.lock();
        wal.truncate()?;
        Ok(())
    }

    /// Flush pending WAL entries, checkpoint, and release the store.
    pub fn close(&self) -> Result<(), StoreError> {
        {
            let mut wal = self.wal.lock();
            wal.flush()?;
        }
        self.checkpoint()
    }

    /// Force pending WAL entries to disk.
    pub fn flush_wal(&self) -> Result<(), StoreError> {
        let mut wal = self.wal.lock();
        wal.flush()?;
        Ok(())
    }

    /// Current global revision.
    pub fn global_rev(&self) -> u64 {
        self.state.lock().global_rev
    }

    /// Run one transaction: build events against the current state, apply
    /// them, and append them to the WAL in commit order.
    pub(crate) fn commit<T>(
        &self,
        build: impl FnOnce(&mut MaterializedState) -> Result<(Vec<StoreEvent>, T), StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock();
        let (events, out) = build(&mut state)?;
        for event in &events {
            state.apply_event(event);
        }
        if !events.is_empty() {
            let mut wal = self.wal.lock();
            for event in &events {
                wal.append(event)?;
            }
            let flush_due = wal.needs_flush();
            drop(wal);
            drop(state);
            if flush_due {
                self.flush_wal()?;
            }
        }
        Ok(out)
    }

    /// Read-only access to the state under the lock.
    pub(crate) fn read<T>(&self, read: impl FnOnce(&MaterializedState) -> T) -> T {
        read(&self.state.lock())
    }

    // -- multiplexer projections ---------------------------------------------

    /// Idempotent session upsert. Returns the new global revision when the
    /// row changed, `None` when the observation matched the stored row.
    pub fn upsert_session(
        &self,
        obs: SessionObservation,
        at: DateTime<Utc>,
    ) -> Result<Option<u64>, StoreError> {
        self.commit(|state| {
            let existing = state.sessions.get(&obs.name);
            let unchanged = existing.map_or(false, |row| {
                row.attached == obs.attached
                    && row.windows == obs.windows
                    && row.panes == obs.panes
                    && row.activity_at == obs.activity_at
            });
            if unchanged {
                return Ok((Vec::new(), None));
            }
            let change = if existing.is_some() {
                ChangeKind::Updated
            } else {
                ChangeKind::Created
            };
            let rev = state.global_rev + 1;
            let session = match existing {
                Some(row) => SessionProjection {
                    attached: obs.attached,
                    windows: obs.windows,
                    panes: obs.panes,
                    activity_at: obs.activity_at.or(row.activity_at),
                    rev,
                    updated_at: at,
                    ..row.clone()
                },
                None => SessionProjection {
                    name: obs.name.clone(),
                    attached: obs.attached,
                    windows: obs.windows,
                    panes: obs.panes,
                    activity_at: obs.activity_at,
                    last_preview: None,
                    last_preview_at: None,
                    last_preview_pane_id: None,
                    unread_windows: 0,
                    unread_panes: 0,
                    rev,
                    updated_at: at,
                },
            };
            Ok((
                vec![StoreEvent::SessionUpserted {
                    session,
                    change,
                    rev,
                    at,
                }],
                Some(rev),
            ))
        })
    }

    /// Idempotent window upsert.
    pub fn upsert_window(
        &self,
        obs: WindowObservation,
        at: DateTime<Utc>,
    ) -> Result<Option<u64>, StoreError> {
        self.commit(|state| {
            let existing = state
                .windows
                .get(&obs.session)
                .and_then(|w| w.get(&obs.window_index));
            let unchanged = existing.map_or(false, |row| {
                row.name == obs.name
                    && row.active == obs.active
                    && row.layout == obs.layout
                    && row.window_activity_at == obs.window_activity_at
            });
            if unchanged {
                return Ok((Vec::new(), None));
            }
            let change = if existing.is_some() {
                ChangeKind::Updated
            } else {
                ChangeKind::Created
            };
            let rev = state.global_rev + 1;
            let window = WindowProjection {
                session: obs.session,
                window_index: obs.window_index,
                name: obs.name,
                active: obs.active,
                layout: obs.layout,
                window_activity_at: obs.window_activity_at,
                unread_panes: existing.map(|w| w.unread_panes).unwrap_or(0),
                has_unread: existing.map(|w| w.has_unread).unwrap_or(false),
                rev,
            };
            Ok((
                vec![StoreEvent::WindowUpserted {
                    window,
                    change,
                    rev,
                    at,
                }],
                Some(rev),
            ))
        })
    }

    /// Idempotent pane upsert. The pane's `revision` is bumped to the new
    /// global revision iff the captured tail hash changed (or the pane is
    /// new); `seen_revision` is always preserved.
    pub fn upsert_pane(
        &self,
        obs: PaneObservation,
        at: DateTime<Utc>,
    ) -> Result<Option<u64>, StoreError> {
        self.commit(|state| {
            let existing = state.panes.get(&obs.pane_id);
            let tail_changed = existing.map_or(true, |row| row.tail_hash != obs.tail_hash);
            let unchanged = existing.map_or(false, |row| {
                !tail_changed
                    && row.session == obs.session
                    && row.window_index == obs.window_index
                    && row.pane_index == obs.pane_index
                    && row.title == obs.title
                    && row.active == obs.active
                    && row.current_path == obs.current_path
                    && row.current_command == obs.current_command
            });
            if unchanged {
                return Ok((Vec::new(), None));
            }
            let change = if existing.is_some() {
                ChangeKind::Updated
            } else {
                ChangeKind::Created
            };
            let rev = state.global_rev + 1;
            let pane = PaneProjection {
                revision: if tail_changed {
                    rev
                } else {
                    existing.map(|p| p.revision).unwrap_or(rev)
                },
                seen_revision: existing.map(|p| p.seen_revision).unwrap_or(0),
                pane_id: obs.pane_id,
                session: obs.session,
                window_index: obs.window_index,
                pane_index: obs.pane_index,
                title: obs.title,
                active: obs.active,
                tty: obs.tty,
                current_path: obs.current_path,
                start_command: obs.start_command,
                current_command: obs.current_command,
                tail_preview: obs.tail_preview,
                tail_hash: obs.tail_hash,
                tail_captured_at: if tail_changed {
                    Some(obs.captured_at)
                } else {
                    existing.and_then(|p| p.tail_captured_at)
                },
                changed_at: at,
            };
            Ok((
                vec![StoreEvent::PaneUpserted {
                    pane,
                    change,
                    rev,
                    at,
                }],
                Some(rev),
            ))
        })
    }

    pub fn remove_session(&self, name: &str, at: DateTime<Utc>) -> Result<Option<u64>, StoreError> {
        self.commit(|state| {
            if !state.sessions.contains_key(name) {
                return Ok((Vec::new(), None));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::SessionRemoved {
                    name: name.to_string(),
                    rev,
                    at,
                }],
                Some(rev),
            ))
        })
    }

    pub fn remove_window(
        &self,
        session: &str,
        window_index: u32,
        at: DateTime<Utc>,
    ) -> Result<Option<u64>, StoreError> {
        self.commit(|state| {
            let present = state
                .windows
                .get(session)
                .map_or(false, |w| w.contains_key(&window_index));
            if !present {
                return Ok((Vec::new(), None));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::WindowRemoved {
                    session: session.to_string(),
                    window_index,
                    rev,
                    at,
                }],
                Some(rev),
            ))
        })
    }

    pub fn remove_pane(&self, pane_id: &str, at: DateTime<Utc>) -> Result<Option<u64>, StoreError> {
        self.commit(|state| {
            if !state.panes.contains_key(pane_id) {
                return Ok((Vec::new(), None));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::PaneRemoved {
                    pane_id: pane_id.to_string(),
                    rev,
                    at,
                }],
                Some(rev),
            ))
        })
    }

    /// Advance the seen watermark on one pane.
    pub fn mark_pane_seen(
        &self,
        session: &str,
        pane_id: &str,
        at: DateTime<Utc>,
    ) -> Result<MarkSeen, StoreError> {
        self.commit(|state| {
            let pane = state
                .panes
                .get(pane_id)
                .filter(|p| p.session == session)
                .ok_or_else(|| StoreError::not_found("pane", pane_id))?;
            if !pane.has_unread() {
                return Ok((
                    Vec::new(),
                    MarkSeen {
                        changed: false,
                        global_rev: state.global_rev,
                    },
                ));
            }
            let window_index = pane.window_index;
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::SeenMarked {
                    session: session.to_string(),
                    scope: SeenScope::Pane,
                    window_index: Some(window_index),
                    pane_ids: vec![pane_id.to_string()],
                    rev,
                    at,
                }],
                MarkSeen {
                    changed: true,
                    global_rev: rev,
                },
            ))
        })
    }

    /// Advance the seen watermark on every pane of a window.
    pub fn mark_window_seen(
        &self,
        session: &str,
        window_index: u32,
        at: DateTime<Utc>,
    ) -> Result<MarkSeen, StoreError> {
        self.commit(|state| {
            let present = state
                .windows
                .get(session)
                .map_or(false, |w| w.contains_key(&window_index));
            if !present {
                return Err(StoreError::not_found(
                    "window",
                    format!("{session}:{window_index}"),
                ));
            }
            let pane_ids: Vec<String> = state
                .panes
                .values()
                .filter(|p| {
                    p.session == session && p.window_index == window_index && p.has_unread()
                })
                .map(|p| p.pane_id.clone())
                .collect();
            if pane_ids.is_empty() {
                return Ok((
                    Vec::new(),
                    MarkSeen {
                        changed: false,
                        global_rev: state.global_rev,
                    },
                ));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::SeenMarked {
                    session: session.to_string(),
                    scope: SeenScope::Window,
                    window_index: Some(window_index),
                    pane_ids,
                    rev,
                    at,
                }],
                MarkSeen {
                    changed: true,
                    global_rev: rev,
                },
            ))
        })
    }

    /// Advance the seen watermark on every pane of a session.
    pub fn mark_session_seen(
        &self,
        session: &str,
        at: DateTime<Utc>,
    ) -> Result<MarkSeen, StoreError> {
        self.commit(|state| {
            if !state.sessions.contains_key(session) {
                return Err(StoreError::not_found("session", session));
            }
            let pane_ids: Vec<String> = state
                .panes
                .values()
                .filter(|p| p.session == session && p.has_unread())
                .map(|p| p.pane_id.clone())
                .collect();
            if pane_ids.is_empty() {
                return Ok((
                    Vec::new(),
                    MarkSeen {
                        changed: false,
                        global_rev: state.global_rev,
                    },
                ));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::SeenMarked {
                    session: session.to_string(),
                    scope: SeenScope::Session,
                    window_index: None,
                    pane_ids,
                    rev,
                    at,
                }],
                MarkSeen {
                    changed: true,
                    global_rev: rev,
                },
            ))
        })
    }

    /// Journal entries with `global_rev > since`, ascending, capped to `limit`.
    pub fn journal_since(&self, since: u64, limit: usize) -> Vec<JournalEntry> {
        self.read(|state| state.journal_since(since, limit))
    }

    pub fn session_activity_patch(&self, name: &str) -> Option<SessionActivityPatch> {
        self.read(|state| state.session_activity_patch(name))
    }

    pub fn inspector_patch(&self, name: &str) -> Option<InspectorPatch> {
        self.read(|state| state.inspector_patch(name))
    }

    /// Transactional window-name sequence: returns `max(min, stored + 1)`
    /// and stores the result.
    pub fn allocate_window_seq(&self, session: &str, min: u32) -> Result<u32, StoreError> {
        self.commit(|state| {
            let stored = state.window_seq.get(session).copied().unwrap_or(0);
            let value = min.max(stored + 1);
            Ok((
                vec![StoreEvent::WindowSeqAllocated {
                    session: session.to_string(),
                    value,
                }],
                value,
            ))
        })
    }

    pub fn set_session_meta(&self, meta: SessionMeta) -> Result<(), StoreError> {
        self.commit(|_| Ok((vec![StoreEvent::SessionMetaSet { meta }], ())))
    }

    pub fn session_meta(&self, name: &str) -> Option<SessionMeta> {
        self.read(|state| state.session_meta.get(name).cloned())
    }

    pub fn set_runtime(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.commit(|_| {
            Ok((
                vec![StoreEvent::RuntimeKvSet {
                    key: key.to_string(),
                    value: value.to_string(),
                }],
                (),
            ))
        })
    }

    pub fn runtime(&self, key: &str) -> Option<String> {
        self.read(|state| state.runtime.get(key).cloned())
    }

    pub fn set_boot_id(&self, boot_id: &str) -> Result<(), StoreError> {
        self.commit(|_| {
            Ok((
                vec![StoreEvent::BootIdSet {
                    boot_id: boot_id.to_string(),
                }],
                (),
            ))
        })
    }

    pub fn boot_id(&self) -> String {
        self.read(|state| state.boot_id.clone())
    }

    pub fn list_sessions(&self) -> Vec<SessionProjection> {
        self.read(|state| {
            let mut rows: Vec<_> = state.sessions.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    pub fn get_session(&self, name: &str) -> Option<SessionProjection> {
        self.read(|state| state.sessions.get(name).cloned())
    }

    pub fn list_windows(&self, session: &str) -> Vec<WindowProjection> {
        self.read(|state| {
            state
                .windows
                .get(session)
                .map(|w| w.values().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn list_panes(&self, session: &str) -> Vec<PaneProjection> {
        self.read(|state| {
            let mut rows: Vec<_> = state
                .panes
                .values()
                .filter(|p| p.session == session)
                .cloned()
                .collect();
            rows.sort_by(|a, b| (a.window_index, a.pane_index).cmp(&(b.window_index, b.pane_index)));
            rows
        })
    }

    pub fn storage_stats(&self) -> StorageStats {
        self.read(|state| state.storage_stats())
    }

    /// Truncate one flushable resource. Returns the number of rows dropped.
    pub fn flush_resource(
        &self,
        resource: StorageResource,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.commit(|state| {
            let rows = match resource {
                StorageResource::Timeline => state.timeline.len(),
                StorageResource::ActivityLog => state.journal.len(),
                StorageResource::GuardrailLog => state.guardrail_audit.len(),
                StorageResource::RecoveryLog => state
                    .restore_jobs
                    .values()
                    .filter(|j| j.status.is_terminal())
                    .count(),
            };
            Ok((
                vec![StoreEvent::ResourceFlushed { resource, at }],
                rows,
            ))
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
