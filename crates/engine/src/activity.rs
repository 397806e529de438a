// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity pipeline: delta streaming, collector stats, seen marking, and
//! timeline search over the store's journal and projections.

use chrono::{DateTime, Utc};
use sentinel_core::validate::{self, ValidateError};
use sentinel_core::{Event, EventKind, TimelineEvent};
use sentinel_store::{
    InspectorPatch, JournalEntry, SeenScope, SessionActivityPatch, Store, StoreError,
    TimelineFilter,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hub::Hub;

/// Errors from activity operations.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error("invalid mark-seen request: {0}")]
    InvalidRequest(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Response of a delta poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDelta {
    pub changes: Vec<JournalEntry>,
    /// More entries were pending than `limit` allowed.
    pub overflow: bool,
    pub global_rev: u64,
    pub session_patches: Vec<SessionActivityPatch>,
    pub inspector_patches: Vec<InspectorPatch>,
}

/// Collector runtime stats, fed by the external watchtower collector
/// through the store's runtime key-value area.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub global_rev: u64,
    pub collect_total: u64,
    pub collect_errors_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_collect_at: Option<String>,
    pub last_collect_duration_ms: u64,
    pub last_collect_sessions: u64,
    pub last_collect_changed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_collect_error: Option<String>,
}

/// A mark-seen request after JSON decoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarkSeenRequest {
    #[serde(default)]
    pub session: String,
    pub scope: SeenScope,
    #[serde(default)]
    pub window_index: Option<i64>,
    #[serde(default)]
    pub pane_id: Option<String>,
}

/// Acknowledgement of a mark-seen request with refresh patches.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenAck {
    pub acked: bool,
    pub global_rev: u64,
    pub session_patches: Vec<SessionActivityPatch>,
    pub inspector_patches: Vec<InspectorPatch>,
}

/// Read- and seen-side of the journal/projection data.
#[derive(Clone)]
pub struct ActivityPipeline {
    store: Store,
    hub: Hub,
}

impl ActivityPipeline {
    pub fn new(store: Store, hub: Hub) -> Self {
        Self { store, hub }
    }

    /// Journal entries after `since`, with compact patches for every
    /// touched session.
    ///
    /// Reads `limit + 1` entries to detect overflow; the response's
    /// `global_rev` is the current counter, never less than the highest
    /// entry returned.
    pub fn delta(&self, since: u64, limit: usize) -> ActivityDelta {
        let mut changes = self.store.journal_since(since, limit + 1);
        let overflow = changes.len() > limit;
        if overflow {
            changes.truncate(limit);
        }

        let mut sessions: Vec<String> = Vec::new();
        for entry in &changes {
            if !sessions.contains(&entry.session) {
                sessions.push(entry.session.clone());
            }
        }

        let session_patches = sessions
            .iter()
            .filter_map(|name| self.store.session_activity_patch(name))
            .collect();
        let inspector_patches = sessions
            .iter()
            .filter_map(|name| self.store.inspector_patch(name))
            .collect();

        ActivityDelta {
            changes,
            overflow,
            global_rev: self.store.global_rev(),
            session_patches,
            inspector_patches,
        }
    }

    /// Collector stats from the store's runtime area.
    pub fn stats(&self) -> ActivityStats {
        let int = |key: &str| {
            self.store
                .runtime(key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };
        ActivityStats {
            global_rev: self.store.global_rev(),
            collect_total: int("collect_total"),
            collect_errors_total: int("collect_errors_total"),
            last_collect_at: self.store.runtime("last_collect_at"),
            last_collect_duration_ms: int("last_collect_duration_ms"),
            last_collect_sessions: int("last_collect_sessions"),
            last_collect_changed: int("last_collect_changed"),
            last_collect_error: self
                .store
                .runtime("last_collect_error")
                .filter(|v| !v.is_empty()),
        }
    }

    /// Apply a mark-seen request, emit refresh events, and return the
    /// patches the UI needs to reconcile.
    pub fn mark_seen(
        &self,
        req: &MarkSeenRequest,
        at: DateTime<Utc>,
    ) -> Result<SeenAck, ActivityError> {
        validate::session_name(&req.session)?;

        let outcome = match req.scope {
            SeenScope::Pane => {
                let pane_id = req
                    .pane_id
                    .as_deref()
                    .ok_or(ActivityError::InvalidRequest("paneId is required for pane scope"))?;
                validate::pane_id(pane_id)?;
                self.store.mark_pane_seen(&req.session, pane_id, at)?
            }
            SeenScope::Window => {
                let window_index = req
                    .window_index
                    .ok_or(ActivityError::InvalidRequest(
                        "windowIndex is required for window scope",
                    ))?;
                let window_index = validate::window_index(window_index)?;
                self.store.mark_window_seen(&req.session, window_index, at)?
            }
            SeenScope::Session => self.store.mark_session_seen(&req.session, at)?,
        };

        let session_patches: Vec<SessionActivityPatch> = self
            .store
            .session_activity_patch(&req.session)
            .into_iter()
            .collect();
        let inspector_patches: Vec<InspectorPatch> = self
            .store
            .inspector_patch(&req.session)
            .into_iter()
            .collect();

        if outcome.changed {
            self.hub.publish(
                &Event::with_rev(EventKind::TmuxInspector, outcome.global_rev)
                    .field("session", req.session.clone()),
            );
            self.hub.publish(
                &Event::with_rev(EventKind::TmuxSessions, outcome.global_rev)
                    .field("session", req.session.clone()),
            );
        }

        Ok(SeenAck {
            acked: outcome.changed,
            global_rev: outcome.global_rev,
            session_patches,
            inspector_patches,
        })
    }

    /// Timeline search. Fetches `limit + 1` rows; `has_more` reports
    /// truncation.
    pub fn search_timeline(
        &self,
        filter: &TimelineFilter,
        limit: usize,
    ) -> (Vec<TimelineEvent>, bool) {
        let mut rows = self.store.search_timeline(filter, limit + 1);
        let has_more = rows.len() > limit;
        if has_more {
            rows.truncate(limit);
        }
        (rows, has_more)
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
