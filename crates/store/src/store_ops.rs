// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-plane store operations: timeline, alerts, services, runbooks,
//! runs, and schedules.

use chrono::{DateTime, Utc};
use sentinel_core::{
    Alert, AlertId, AlertStatus, CustomService, EventSource, RunId, Runbook, RunbookId,
    RunbookRun, Schedule, ScheduleId, Severity, TimelineEvent,
};
use serde::{Deserialize, Serialize};

use crate::event::StoreEvent;
use crate::store::{Store, StoreError};

/// Filter for timeline searches. Absent fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineFilter {
    pub query: String,
    pub severity: Option<Severity>,
    pub source: Option<EventSource>,
    pub event_type: Option<String>,
    /// Match rows whose metadata carries this session.
    pub session: Option<String>,
    pub pane_id: Option<String>,
    pub window_index: Option<u32>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimelineFilter {
    fn matches(&self, event: &TimelineEvent) -> bool {
        if let Some(severity) = self.severity {
            if event.severity != severity {
                return false;
            }
        }
        if let Some(source) = self.source {
            if event.source != source {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if event.event_type != *event_type {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.created_at > until {
                return false;
            }
        }
        if let Some(session) = &self.session {
            if event.metadata.get("session").and_then(|v| v.as_str()) != Some(session.as_str()) {
                return false;
            }
        }
        if let Some(pane_id) = &self.pane_id {
            if event.metadata.get("paneId").and_then(|v| v.as_str()) != Some(pane_id.as_str()) {
                return false;
            }
        }
        if let Some(window_index) = self.window_index {
            if event.metadata.get("windowIndex").and_then(|v| v.as_u64())
                != Some(u64::from(window_index))
            {
                return false;
            }
        }
        event.matches_query(&self.query)
    }
}

/// Alert content for an upsert; identity fields (`id`, `created_at`) are
/// only used when the dedupe key has no existing row.
#[derive(Debug, Clone)]
pub struct AlertSpec {
    pub dedupe_key: String,
    pub source: String,
    pub resource: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Store {
    // -- timeline ------------------------------------------------------------

    /// Append one immutable timeline row. Returns the commit revision.
    pub fn append_timeline(&self, event: TimelineEvent) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::TimelineAppended { event, rev }], rev))
        })
    }

    /// Search the timeline, newest first, capped to `limit`.
    pub fn search_timeline(&self, filter: &TimelineFilter, limit: usize) -> Vec<TimelineEvent> {
        self.read(|state| {
            state
                .timeline
                .iter()
                .rev()
                .filter(|e| filter.matches(e))
                .take(limit)
                .cloned()
                .collect()
        })
    }

    // -- alerts --------------------------------------------------------------

    /// Upsert an alert by dedupe key.
    ///
    /// An existing row keeps its `id` and `created_at`; message, metadata,
    /// title, and severity are refreshed. A resolved row re-opens.
    /// Returns the row and whether it was newly created.
    pub fn upsert_alert(
        &self,
        id: AlertId,
        spec: AlertSpec,
        at: DateTime<Utc>,
    ) -> Result<(Alert, bool), StoreError> {
        self.commit(|state| {
            let existing = state
                .alerts
                .values()
                .find(|a| a.dedupe_key == spec.dedupe_key)
                .cloned();
            let created = existing.is_none();
            let alert = match existing {
                Some(row) => Alert {
                    title: spec.title,
                    message: spec.message,
                    severity: spec.severity,
                    metadata: spec.metadata,
                    status: AlertStatus::Open,
                    acked_at: None,
                    resolved_at: None,
                    ..row
                },
                None => Alert {
                    id,
                    dedupe_key: spec.dedupe_key,
                    source: spec.source,
                    resource: spec.resource,
                    title: spec.title,
                    message: spec.message,
                    severity: spec.severity,
                    status: AlertStatus::Open,
                    metadata: spec.metadata,
                    created_at: at,
                    acked_at: None,
                    resolved_at: None,
                },
            };
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::AlertUpserted {
                    alert: alert.clone(),
                    rev,
                }],
                (alert, created),
            ))
        })
    }

    /// Mark an open alert acked. Acking an already-acked or resolved alert
    /// is a no-op that returns the current row.
    pub fn ack_alert(&self, id: &str, at: DateTime<Utc>) -> Result<(Alert, u64), StoreError> {
        self.commit(|state| {
            let alert = state
                .alerts
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("alert", id))?;
            if alert.status != AlertStatus::Open {
                return Ok((Vec::new(), (alert, state.global_rev)));
            }
            let rev = state.global_rev + 1;
            let mut updated = alert;
            updated.status = AlertStatus::Acked;
            updated.acked_at = Some(at);
            Ok((
                vec![StoreEvent::AlertAcked {
                    id: AlertId::new(id),
                    rev,
                    at,
                }],
                (updated, rev),
            ))
        })
    }

    /// Resolve an open or acked alert. Resolving twice is a no-op.
    pub fn resolve_alert(&self, id: &str, at: DateTime<Utc>) -> Result<(Alert, u64), StoreError> {
        self.commit(|state| {
            let alert = state
                .alerts
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("alert", id))?;
            if alert.status == AlertStatus::Resolved {
                return Ok((Vec::new(), (alert, state.global_rev)));
            }
            let rev = state.global_rev + 1;
            let mut updated = alert;
            updated.status = AlertStatus::Resolved;
            updated.resolved_at = Some(at);
            Ok((
                vec![StoreEvent::AlertResolved {
                    id: AlertId::new(id),
                    rev,
                    at,
                }],
                (updated, rev),
            ))
        })
    }

    /// Delete a resolved alert. Open and acked alerts cannot be deleted.
    pub fn delete_alert(&self, id: &str) -> Result<u64, StoreError> {
        self.commit(|state| {
            let alert = state
                .alerts
                .get(id)
                .ok_or_else(|| StoreError::not_found("alert", id))?;
            if alert.status != AlertStatus::Resolved {
                return Err(StoreError::Conflict {
                    kind: "alert",
                    id: id.to_string(),
                    reason: "only resolved alerts can be deleted",
                });
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::AlertDeleted {
                    id: AlertId::new(id),
                    rev,
                }],
                rev,
            ))
        })
    }

    pub fn get_alert(&self, id: &str) -> Option<Alert> {
        self.read(|state| state.alerts.get(id).cloned())
    }

    /// The non-resolved alert with this dedupe key, if any.
    pub fn find_firing_alert(&self, dedupe_key: &str) -> Option<Alert> {
        self.read(|state| {
            state
                .alerts
                .values()
                .find(|a| a.dedupe_key == dedupe_key && a.status != AlertStatus::Resolved)
                .cloned()
        })
    }

    /// List alerts, newest first, optionally filtered by status.
    pub fn list_alerts(&self, status: Option<AlertStatus>) -> Vec<Alert> {
        self.read(|state| {
            let mut rows: Vec<_> = state
                .alerts
                .values()
                .filter(|a| status.map_or(true, |s| a.status == s))
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            rows
        })
    }

    // -- custom services -----------------------------------------------------

    pub fn register_service(&self, service: CustomService) -> Result<u64, StoreError> {
        self.commit(|state| {
            if state.services.contains_key(&service.name) {
                return Err(StoreError::Exists {
                    kind: "service",
                    id: service.name.clone(),
                });
            }
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::ServiceRegistered { service, rev }], rev))
        })
    }

    pub fn unregister_service(&self, name: &str) -> Result<u64, StoreError> {
        self.commit(|state| {
            if !state.services.contains_key(name) {
                return Err(StoreError::not_found("service", name));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::ServiceUnregistered {
                    name: name.to_string(),
                    rev,
                }],
                rev,
            ))
        })
    }

    pub fn get_service(&self, name: &str) -> Option<CustomService> {
        self.read(|state| state.services.get(name).cloned())
    }

    pub fn list_services(&self) -> Vec<CustomService> {
        self.read(|state| {
            let mut rows: Vec<_> = state.services.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    // -- runbooks ------------------------------------------------------------

    pub fn upsert_runbook(&self, runbook: Runbook) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::RunbookUpserted { runbook, rev }], rev))
        })
    }

    /// Delete a runbook; schedules referencing it are removed in the same
    /// transaction.
    pub fn delete_runbook(&self, id: &RunbookId) -> Result<u64, StoreError> {
        self.commit(|state| {
            if !state.runbooks.contains_key(id.as_str()) {
                return Err(StoreError::not_found("runbook", id.as_str()));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::RunbookDeleted {
                    id: id.clone(),
                    rev,
                }],
                rev,
            ))
        })
    }

    pub fn get_runbook(&self, id: &str) -> Option<Runbook> {
        self.read(|state| state.runbooks.get(id).cloned())
    }

    pub fn list_runbooks(&self) -> Vec<Runbook> {
        self.read(|state| {
            let mut rows: Vec<_> = state.runbooks.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    // -- runs ----------------------------------------------------------------

    pub fn upsert_run(&self, run: RunbookRun) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::RunUpserted { run, rev }], rev))
        })
    }

    /// Delete a run row. Active runs cannot be deleted.
    pub fn delete_run(&self, id: &RunId) -> Result<u64, StoreError> {
        self.commit(|state| {
            let run = state
                .runs
                .get(id.as_str())
                .ok_or_else(|| StoreError::not_found("run", id.as_str()))?;
            if !run.status.is_terminal() {
                return Err(StoreError::Conflict {
                    kind: "run",
                    id: id.to_string(),
                    reason: "run is still active",
                });
            }
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::RunDeleted { id: id.clone(), rev }], rev))
        })
    }

    pub fn get_run(&self, id: &str) -> Option<RunbookRun> {
        self.read(|state| state.runs.get(id).cloned())
    }

    /// List runs, newest first.
    pub fn list_runs(&self, limit: usize) -> Vec<RunbookRun> {
        self.read(|state| {
            let mut rows: Vec<_> = state.runs.values().cloned().collect();
            rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            rows.truncate(limit);
            rows
        })
    }

    // -- schedules -----------------------------------------------------------

    pub fn upsert_schedule(&self, schedule: Schedule) -> Result<u64, StoreError> {
        self.commit(|state| {
            let rev = state.global_rev + 1;
            Ok((vec![StoreEvent::ScheduleUpserted { schedule, rev }], rev))
        })
    }

    pub fn delete_schedule(&self, id: &ScheduleId) -> Result<u64, StoreError> {
        self.commit(|state| {
            if !state.schedules.contains_key(id.as_str()) {
                return Err(StoreError::not_found("schedule", id.as_str()));
            }
            let rev = state.global_rev + 1;
            Ok((
                vec![StoreEvent::ScheduleDeleted {
                    id: id.clone(),
                    rev,
                }],
                rev,
            ))
        })
    }

    pub fn get_schedule(&self, id: &str) -> Option<Schedule> {
        self.read(|state| state.schedules.get(id).cloned())
    }

    pub fn list_schedules(&self) -> Vec<Schedule> {
        self.read(|state| {
            let mut rows: Vec<_> = state.schedules.values().cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    pub fn schedules_for_runbook(&self, runbook_id: &RunbookId) -> Vec<Schedule> {
        self.read(|state| {
            state
                .schedules
                .values()
                .filter(|s| s.runbook_id == *runbook_id)
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
#[path = "store_ops_tests.rs"]
mod tests;
