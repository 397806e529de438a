// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay.
//!
//! State is derived from [`StoreEvent`]s: the mutation path applies an event
//! exactly once and appends it to the WAL; startup recovery replays the same
//! events over the last snapshot. `apply_event` must therefore be
//! deterministic — every timestamp and assigned revision is carried in the
//! event, never recomputed at apply time — and idempotent, since a crash
//! between WAL flush and snapshot can replay events over state that already
//! contains them.

use std::collections::{BTreeMap, HashMap};

use sentinel_core::{
    Alert, AlertStatus, CustomService, GuardrailAudit, GuardrailRule, KilledSession,
    RecoverySnapshot, RestoreJob, Runbook, RunbookRun, Schedule, TimelineEvent,
};
use serde::{Deserialize, Serialize};

use crate::event::StoreEvent;
use crate::projection::{
    ChangeKind, EntityType, InspectorPane, InspectorPatch, InspectorWindow, JournalEntry,
    PaneProjection, ResourceStats, SeenScope, SessionActivityPatch, SessionMeta, SessionProjection,
    StorageResource, StorageStats, WindowProjection,
};

/// Journal retention cap. Oldest entries are dropped past this point.
const MAX_JOURNAL_ROWS: usize = 100_000;

/// Timeline retention cap.
const MAX_TIMELINE_ROWS: usize = 20_000;

/// Guardrail audit retention cap.
const MAX_AUDIT_ROWS: usize = 20_000;

/// Materialized state built from store events.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    /// Process-wide monotonically non-decreasing revision counter.
    pub global_rev: u64,
    /// Append-only change journal driving delta streaming.
    pub journal: Vec<JournalEntry>,
    pub sessions: HashMap<String, SessionProjection>,
    /// Windows per session, ordered by window index.
    pub windows: HashMap<String, BTreeMap<u32, WindowProjection>>,
    /// Panes keyed by pane id.
    pub panes: HashMap<String, PaneProjection>,
    #[serde(default)]
    pub session_meta: HashMap<String, SessionMeta>,
    /// Default-window-name sequence per session; survives index recycling.
    #[serde(default)]
    pub window_seq: HashMap<String, u32>,
    /// Runtime key-value area (collector stats, misc counters).
    #[serde(default)]
    pub runtime: HashMap<String, String>,
    #[serde(default)]
    pub boot_id: String,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub alerts: HashMap<String, Alert>,
    #[serde(default)]
    pub services: HashMap<String, CustomService>,
    #[serde(default)]
    pub runbooks: HashMap<String, Runbook>,
    #[serde(default)]
    pub runs: HashMap<String, RunbookRun>,
    #[serde(default)]
    pub schedules: HashMap<String, Schedule>,
    #[serde(default)]
    pub guardrail_rules: HashMap<String, GuardrailRule>,
    #[serde(default)]
    pub guardrail_audit: Vec<GuardrailAudit>,
    #[serde(default)]
    pub recovery_snapshots: HashMap<String, RecoverySnapshot>,
    #[serde(default)]
    pub killed_sessions: HashMap<String, KilledSession>,
    #[serde(default)]
    pub restore_jobs: HashMap<String, RestoreJob>,
}

impl MaterializedState {
    /// Apply an event to derive state changes.
    pub fn apply_event(&mut self, event: &StoreEvent) {
        if let Some(rev) = event.rev() {
            self.global_rev = self.global_rev.max(rev);
        }

        match event {
            StoreEvent::SessionUpserted {
                session,
                change,
                rev,
                at,
            } => {
                self.sessions
                    .insert(session.name.clone(), session.clone());
                self.recompute_session(&session.name, *rev);
                self.push_journal(JournalEntry {
                    global_rev: *rev,
                    entity: EntityType::Session,
                    session: session.name.clone(),
                    window_index: None,
                    pane_id: None,
                    change: *change,
                    changed_at: *at,
                });
            }

            StoreEvent::SessionRemoved { name, rev, at } => {
                if self.sessions.remove(name).is_none() {
                    return;
                }
                self.windows.remove(name);
                self.panes.retain(|_, p| p.session != *name);
                self.push_journal(JournalEntry {
                    global_rev: *rev,
                    entity: EntityType::Session,
                    session: name.clone(),
                    window_index: None,
                    pane_id: None,
                    change: ChangeKind::Removed,
                    changed_at: *at,
                });
            }

            StoreEvent::WindowUpserted {
                window,
                change,
                rev,
                at,
            } => {
                self.windows
                    .entry(window.session.clone())
                    .or_default()
                    .insert(window.window_index, window.clone());
                self.recompute_window(&window.session, window.window_index, *rev);
                self.recompute_session(&window.session, *rev);
                self.push_journal(JournalEntry {
                    global_rev: *rev,
                    entity: EntityType::Window,
                    session: window.session.clone(),
                    window_index: Some(window.window_index),
                    pane_id: None,
                    change: *change,
                    changed_at: *at,
                });
            }

            StoreEvent::WindowRemoved {
                session,
                window_index,
                rev,
                at,
            } => {
                let removed = self
                    .windows
                    .get_mut(session)
                    .map(|w| w.remove(window_index).is_some())
                    .unwrap_or(false);
                if !removed {
                    return;
                }
                self.panes
                    .retain(|_, p| !(p.session == *session && p.window_index == *window_index));
                self.recompute_session(session, *rev);
                self.push_journal(JournalEntry {
                    global_rev: *rev,
                    entity: EntityType::Window,
                    session: session.clone(),
                    window_index: Some(*window_index),
                    pane_id: None,
                    change: ChangeKind::Removed,
                    changed_at: *at,
                });
            }

            StoreEvent::PaneUpserted {
                pane,
                change,
                rev,
                at,
            } => {
                self.panes.insert(pane.pane_id.clone(), pane.clone());
                // Propagate the freshest captured tail up to the session row.
                if let (Some(preview), Some(captured_at)) =
                    (pane.tail_preview.as_ref(), pane.tail_captured_at)
                {
                    if let Some(session) = self.sessions.get_mut(&pane.session) {
                        let newer = session
                            .last_preview_at
                            .map(|prev| captured_at > prev)
                            .unwrap_or(true);
                        if newer {
                            session.last_preview = Some(preview.clone());
                            session.last_preview_at = Some(captured_at);
                            session.last_preview_pane_id = Some(pane.pane_id.clone());
                            session.activity_at = Some(
                                session
                                    .activity_at
                                    .map(|a| a.max(captured_at))
                                    .unwrap_or(captured_at),
                            );
                        }
                    }
                }
                self.recompute_window(&pane.session, pane.window_index, *rev);
                self.recompute_session(&pane.session, *rev);
                self.push_journal(JournalEntry {
                    global_rev: *rev,
                    entity: EntityType::Pane,
                    session: pane.session.clone(),
                    window_index: Some(pane.window_index),
                    pane_id: Some(pane.pane_id.clone()),
                    change: *change,
                    changed_at: *at,
                });
            }

            StoreEvent::PaneRemoved { pane_id, rev, at } => {
                let Some(pane) = self.panes.remove(pane_id) else {
                    return;
                };
                self.recompute_window(&pane.session, pane.window_index, *rev);
                self.recompute_session(&pane.session, *rev);
                self.push_journal(JournalEntry {
                    global_rev: *rev,
                    entity: EntityType::Pane,
                    session: pane.session,
                    window_index: Some(pane.window_index),
                    pane_id: Some(pane_id.clone()),
                    change: ChangeKind::Removed,
                    changed_at: *at,
                });
            }

            StoreEvent::SeenMarked {
                session,
                scope,
                window_index,
                pane_ids,
                rev,
                at,
            } => {
                let mut touched_windows = Vec::new();
                for pane_id in pane_ids {
                    if let Some(pane) = self.panes.get_mut(pane_id) {
                        pane.seen_revision = pane.revision;
                        pane.changed_at = *at;
                        if !touched_windows.contains(&pane.window_index) {
                            touched_windows.push(pane.window_index);
                        }
                    }
                }
                for idx in touched_windows {
                    self.recompute_window(session, idx, *rev);
                }
                self.recompute_session(session, *rev);
                let (entity, pane_id) = match scope {
                    SeenScope::Pane => (EntityType::Pane, pane_ids.first().cloned()),
                    SeenScope::Window => (EntityType::Window, None),
                    SeenScope::Session => (EntityType::Session, None),
                };
                self.push_journal(JournalEntry {
                    global_rev: *rev,
                    entity,
                    session: session.clone(),
                    window_index: *window_index,
                    pane_id,
                    change: ChangeKind::Seen,
                    changed_at: *at,
                });
            }

            StoreEvent::SessionMetaSet { meta } => {
                self.session_meta.insert(meta.name.clone(), meta.clone());
            }

            StoreEvent::WindowSeqAllocated { session, value } => {
                let stored = self.window_seq.entry(session.clone()).or_insert(0);
                *stored = (*stored).max(*value);
            }

            StoreEvent::RuntimeKvSet { key, value } => {
                self.runtime.insert(key.clone(), value.clone());
            }

            StoreEvent::BootIdSet { boot_id } => {
                self.boot_id.clone_from(boot_id);
            }

            StoreEvent::ResourceFlushed { resource, .. } => match resource {
                StorageResource::Timeline => self.timeline.clear(),
                StorageResource::ActivityLog => self.journal.clear(),
                StorageResource::GuardrailLog => self.guardrail_audit.clear(),
                StorageResource::RecoveryLog => {
                    self.restore_jobs.retain(|_, j| !j.status.is_terminal());
                }
            },

            StoreEvent::TimelineAppended { event, .. } => {
                // Idempotency: skip if the row id is already present.
                if self.timeline.iter().any(|t| t.id == event.id) {
                    return;
                }
                self.timeline.push(event.clone());
                if self.timeline.len() > MAX_TIMELINE_ROWS {
                    let excess = self.timeline.len() - MAX_TIMELINE_ROWS;
                    self.timeline.drain(..excess);
                }
            }

            StoreEvent::AlertUpserted { alert, .. } => {
                self.alerts.insert(alert.id.to_string(), alert.clone());
            }

            StoreEvent::AlertAcked { id, at, .. } => {
                if let Some(alert) = self.alerts.get_mut(id.as_str()) {
                    alert.status = AlertStatus::Acked;
                    alert.acked_at = Some(*at);
                }
            }

            StoreEvent::AlertResolved { id, at, .. } => {
                if let Some(alert) = self.alerts.get_mut(id.as_str()) {
                    alert.status = AlertStatus::Resolved;
                    alert.resolved_at = Some(*at);
                }
            }

            StoreEvent::AlertDeleted { id, .. } => {
                self.alerts.remove(id.as_str());
            }

            StoreEvent::ServiceRegistered { service, .. } => {
                self.services.insert(service.name.clone(), service.clone());
            }

            StoreEvent::ServiceUnregistered { name, .. } => {
                self.services.remove(name);
            }

            StoreEvent::RunbookUpserted { runbook, .. } => {
                self.runbooks.insert(runbook.id.to_string(), runbook.clone());
            }

            StoreEvent::RunbookDeleted { id, .. } => {
                self.runbooks.remove(id.as_str());
                // Cascade: drop every schedule referencing the runbook.
                self.schedules.retain(|_, s| s.runbook_id != *id);
            }

            StoreEvent::RunUpserted { run, .. } => {
                self.runs.insert(run.id.to_string(), run.clone());
            }

            StoreEvent::RunDeleted { id, .. } => {
                self.runs.remove(id.as_str());
            }

            StoreEvent::ScheduleUpserted { schedule, .. } => {
                self.schedules
                    .insert(schedule.id.to_string(), schedule.clone());
            }

            StoreEvent::ScheduleDeleted { id, .. } => {
                self.schedules.remove(id.as_str());
            }

            StoreEvent::GuardrailRuleUpserted { rule, .. } => {
                self.guardrail_rules.insert(rule.id.to_string(), rule.clone());
            }

            StoreEvent::GuardrailRuleDeleted { id, .. } => {
                self.guardrail_rules.remove(id.as_str());
            }

            StoreEvent::GuardrailAuditAppended { audit, .. } => {
                self.guardrail_audit.push(audit.clone());
                if self.guardrail_audit.len() > MAX_AUDIT_ROWS {
                    let excess = self.guardrail_audit.len() - MAX_AUDIT_ROWS;
                    self.guardrail_audit.drain(..excess);
                }
            }

            StoreEvent::RecoverySnapshotRecorded { snapshot, .. } => {
                self.recovery_snapshots
                    .insert(snapshot.id.to_string(), snapshot.clone());
                if let Some(killed) = self.killed_sessions.get_mut(&snapshot.session_name) {
                    killed.latest_snapshot_id = Some(snapshot.id.clone());
                }
            }

            StoreEvent::KilledSessionRecorded { killed, .. } => {
                self.killed_sessions
                    .insert(killed.session_name.clone(), killed.clone());
            }

            StoreEvent::KilledSessionArchived { session_name, .. } => {
                if let Some(killed) = self.killed_sessions.get_mut(session_name) {
                    killed.archived = true;
                }
            }

            StoreEvent::RestoreJobUpserted { job, .. } => {
                self.restore_jobs.insert(job.id.to_string(), job.clone());
            }
        }
    }

    /// Journal entries with `global_rev > since`, ascending, capped to `limit`.
    pub fn journal_since(&self, since: u64, limit: usize) -> Vec<JournalEntry> {
        // Entries are appended in commit order, so ascending rev == file order.
        self.journal
            .iter()
            .filter(|e| e.global_rev > since)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Compact activity patch for one session.
    pub fn session_activity_patch(&self, name: &str) -> Option<SessionActivityPatch> {
        let session = self.sessions.get(name)?;
        Some(SessionActivityPatch {
            name: session.name.clone(),
            attached: session.attached,
            windows: session.windows,
            panes: session.panes,
            activity_at: session.activity_at,
            last_preview: session.last_preview.clone(),
            last_preview_pane_id: session.last_preview_pane_id.clone(),
            unread_windows: session.unread_windows,
            unread_panes: session.unread_panes,
            rev: session.rev,
        })
    }

    /// Compact inspector patch (windows + panes) for one session.
    pub fn inspector_patch(&self, name: &str) -> Option<InspectorPatch> {
        let session = self.sessions.get(name)?;
        let windows = self
            .windows
            .get(name)
            .map(|windows| {
                windows
                    .values()
                    .map(|w| InspectorWindow {
                        window_index: w.window_index,
                        name: w.name.clone(),
                        active: w.active,
                        unread_panes: w.unread_panes,
                        has_unread: w.has_unread,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let mut panes: Vec<InspectorPane> = self
            .panes
            .values()
            .filter(|p| p.session == name)
            .map(|p| InspectorPane {
                pane_id: p.pane_id.clone(),
                window_index: p.window_index,
                pane_index: p.pane_index,
                title: p.title.clone(),
                active: p.active,
                current_command: p.current_command.clone(),
                has_unread: p.has_unread(),
                revision: p.revision,
                seen_revision: p.seen_revision,
            })
            .collect();
        panes.sort_by(|a, b| {
            (a.window_index, a.pane_index).cmp(&(b.window_index, b.pane_index))
        });
        Some(InspectorPatch {
            session: name.to_string(),
            windows,
            panes,
            rev: session.rev,
        })
    }

    /// Row counts and byte estimates for the flushable resources.
    pub fn storage_stats(&self) -> StorageStats {
        let resources = vec![
            ResourceStats {
                resource: StorageResource::Timeline,
                rows: self.timeline.len(),
                approx_bytes: approx_json_bytes(&self.timeline),
            },
            ResourceStats {
                resource: StorageResource::ActivityLog,
                rows: self.journal.len(),
                approx_bytes: approx_json_bytes(&self.journal),
            },
            ResourceStats {
                resource: StorageResource::GuardrailLog,
                rows: self.guardrail_audit.len(),
                approx_bytes: approx_json_bytes(&self.guardrail_audit),
            },
            ResourceStats {
                resource: StorageResource::RecoveryLog,
                rows: self
                    .restore_jobs
                    .values()
                    .filter(|j| j.status.is_terminal())
                    .count(),
                approx_bytes: approx_json_bytes(&self.restore_jobs),
            },
        ];
        StorageStats {
            global_rev: self.global_rev,
            resources,
        }
    }

    /// Recompute a window's derived unread fields from its panes.
    pub(crate) fn recompute_window(&mut self, session: &str, window_index: u32, rev: u64) {
        let unread = self
            .panes
            .values()
            .filter(|p| p.session == session && p.window_index == window_index && p.has_unread())
            .count() as u32;
        if let Some(window) = self
            .windows
            .get_mut(session)
            .and_then(|w| w.get_mut(&window_index))
        {
            if window.unread_panes != unread {
                window.unread_panes = unread;
                window.has_unread = unread > 0;
                window.rev = rev;
            }
        }
    }

    /// Recompute a session's derived unread counters from its children.
    pub(crate) fn recompute_session(&mut self, session: &str, rev: u64) {
        let unread_panes = self
            .panes
            .values()
            .filter(|p| p.session == session && p.has_unread())
            .count() as u32;
        let unread_windows = self
            .windows
            .get(session)
            .map(|windows| windows.values().filter(|w| w.has_unread).count() as u32)
            .unwrap_or(0);
        if let Some(row) = self.sessions.get_mut(session) {
            if row.unread_panes != unread_panes || row.unread_windows != unread_windows {
                row.unread_panes = unread_panes;
                row.unread_windows = unread_windows;
            }
            row.rev = rev;
        }
    }

    fn push_journal(&mut self, entry: JournalEntry) {
        self.journal.push(entry);
        if self.journal.len() > MAX_JOURNAL_ROWS {
            let excess = self.journal.len() - MAX_JOURNAL_ROWS;
            self.journal.drain(..excess);
        }
    }
}

/// Rough serialized size of a resource, for the stats endpoint only.
fn approx_json_bytes<T: Serialize>(value: &T) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
