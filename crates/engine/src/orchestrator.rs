// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ops orchestrator.
//!
//! The only path through which a plane mutation, a timeline record,
//! conditional alert firing, and hub broadcast happen together. The plane
//! is never rolled back: if a store write fails after the mutation
//! succeeded, the error surfaces to the caller (`STORE_ERROR` at the HTTP
//! boundary) and the UI re-queries state. All events published for one
//! mutation carry the same global revision.

use chrono::{DateTime, Utc};
use sentinel_core::{
    Alert, AlertId, CustomService, Event, EventKind, EventSource, IdGen, RunbookRun, RunStatus,
    Severity, TimelineEvent, UuidIdGen,
};
use sentinel_drivers::{ServiceAction, ServiceStatus};
use sentinel_store::{AlertSpec, Store, StoreError};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::hub::Hub;

/// Errors from orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything recorded for one service action.
#[derive(Debug, Clone)]
pub struct ServiceActionRecord {
    pub timeline: TimelineEvent,
    /// Alerts fired or resolved by this action.
    pub alerts: Vec<Alert>,
    pub global_rev: u64,
}

/// Couples plane mutations with timeline + alert + broadcast.
#[derive(Clone)]
pub struct Orchestrator {
    store: Store,
    hub: Hub,
    ids: UuidIdGen,
}

impl Orchestrator {
    pub fn new(store: Store, hub: Hub) -> Self {
        Self {
            store,
            hub,
            ids: UuidIdGen,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Record the outcome of a service action: timeline row always; an
    /// alert keyed `service:<unit>:failed` when the unit ended up failed,
    /// resolution of that alert when it recovered.
    pub fn record_service_action(
        &self,
        status: &ServiceStatus,
        action: ServiceAction,
        at: DateTime<Utc>,
    ) -> Result<ServiceActionRecord, OrchestratorError> {
        let severity = if status.is_failed() {
            Severity::Error
        } else if action == ServiceAction::Stop {
            Severity::Warn
        } else {
            Severity::Info
        };

        let mut metadata = Map::new();
        metadata.insert("action".to_string(), Value::from(action.as_str()));
        metadata.insert(
            "activeState".to_string(),
            Value::from(status.active_state.clone()),
        );
        metadata.insert("scope".to_string(), Value::from(status.scope.as_str()));

        let timeline = TimelineEvent {
            id: self.ids.next(),
            source: EventSource::Service,
            event_type: "service.action".to_string(),
            severity,
            resource: status.unit.clone(),
            message: format!(
                "{} {} -> {}",
                action, status.unit, status.active_state
            ),
            details: None,
            metadata,
            created_at: at,
        };
        self.store.append_timeline(timeline.clone())?;

        let mut alerts = Vec::new();
        let dedupe_key = Alert::service_failed_key(&status.unit);
        if status.is_failed() {
            let (alert, _created) = self.store.upsert_alert(
                AlertId::new(self.ids.next()),
                AlertSpec {
                    dedupe_key,
                    source: "service".to_string(),
                    resource: status.unit.clone(),
                    title: format!("{} failed", status.unit),
                    message: format!("{} entered failed state after {}", status.unit, action),
                    severity: Severity::Error,
                    metadata: Map::new(),
                },
                at,
            )?;
            alerts.push(alert);
        } else if let Some(firing) = self.store.find_firing_alert(&dedupe_key) {
            let (resolved, _rev) = self.store.resolve_alert(firing.id.as_str(), at)?;
            alerts.push(resolved);
        }

        let global_rev = self.store.global_rev();
        self.publish(EventKind::OpsServices, global_rev, |payload| {
            payload.insert("unit".to_string(), Value::from(status.unit.clone()));
        });
        self.publish(EventKind::OpsOverview, global_rev, |_| {});
        self.publish(EventKind::OpsTimeline, global_rev, |_| {});
        if !alerts.is_empty() {
            self.publish(EventKind::OpsAlerts, global_rev, |_| {});
        }

        Ok(ServiceActionRecord {
            timeline,
            alerts,
            global_rev,
        })
    }

    /// Ack an alert and record the matching timeline row.
    pub fn ack_alert(
        &self,
        alert_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(Alert, TimelineEvent), OrchestratorError> {
        let (alert, _rev) = self.store.ack_alert(alert_id, at)?;

        let timeline = TimelineEvent {
            id: self.ids.next(),
            source: EventSource::Alert,
            event_type: "alert.acked".to_string(),
            severity: Severity::Info,
            resource: alert.resource.clone(),
            message: format!("alert acknowledged: {}", alert.title),
            details: None,
            metadata: Map::new(),
            created_at: at,
        };
        self.store.append_timeline(timeline.clone())?;

        let global_rev = self.store.global_rev();
        self.publish(EventKind::OpsAlerts, global_rev, |_| {});
        self.publish(EventKind::OpsTimeline, global_rev, |_| {});

        Ok((alert, timeline))
    }

    /// Persist a custom service registration with its timeline marker.
    pub fn register_service(
        &self,
        service: CustomService,
        at: DateTime<Utc>,
    ) -> Result<CustomService, OrchestratorError> {
        self.store.register_service(service.clone())?;
        self.record_service_event(
            "service.registered",
            &service.name,
            format!("service {} registered ({})", service.name, service.unit),
            at,
        )?;
        Ok(service)
    }

    pub fn unregister_service(&self, name: &str, at: DateTime<Utc>) -> Result<(), OrchestratorError> {
        self.store.unregister_service(name)?;
        self.record_service_event(
            "service.unregistered",
            name,
            format!("service {name} unregistered"),
            at,
        )?;
        Ok(())
    }

    /// Timeline marker for a run entering execution.
    pub fn record_runbook_started(
        &self,
        run: &RunbookRun,
        at: DateTime<Utc>,
    ) -> Result<(), OrchestratorError> {
        let mut metadata = Map::new();
        metadata.insert("runId".to_string(), Value::from(run.id.as_str()));
        metadata.insert("source".to_string(), Value::from(run.source.clone()));
        self.store.append_timeline(TimelineEvent {
            id: self.ids.next(),
            source: EventSource::Runbook,
            event_type: "runbook.started".to_string(),
            severity: Severity::Info,
            resource: run.runbook_name.clone(),
            message: format!("runbook {} started", run.runbook_name),
            details: None,
            metadata,
            created_at: at,
        })?;
        let global_rev = self.store.global_rev();
        self.publish(EventKind::OpsTimeline, global_rev, |_| {});
        Ok(())
    }

    /// Terminal timeline marker for a finished run.
    pub fn record_runbook_finished(
        &self,
        run: &RunbookRun,
        at: DateTime<Utc>,
    ) -> Result<(), OrchestratorError> {
        let severity = match run.status {
            RunStatus::Failed => Severity::Error,
            RunStatus::Cancelled => Severity::Warn,
            _ => Severity::Info,
        };
        let mut metadata = Map::new();
        metadata.insert("runId".to_string(), Value::from(run.id.as_str()));
        metadata.insert("status".to_string(), Value::from(run.status.as_str()));
        self.store.append_timeline(TimelineEvent {
            id: self.ids.next(),
            source: EventSource::Runbook,
            event_type: "runbook.finished".to_string(),
            severity,
            resource: run.runbook_name.clone(),
            message: match &run.error {
                Some(error) => format!("runbook {} {}: {error}", run.runbook_name, run.status),
                None => format!("runbook {} {}", run.runbook_name, run.status),
            },
            details: None,
            metadata,
            created_at: at,
        })?;
        let global_rev = self.store.global_rev();
        self.publish(EventKind::OpsTimeline, global_rev, |_| {});
        Ok(())
    }

    /// Timeline marker for config file writes.
    pub fn record_config_updated(&self, at: DateTime<Utc>) -> Result<(), OrchestratorError> {
        self.store.append_timeline(TimelineEvent {
            id: self.ids.next(),
            source: EventSource::Config,
            event_type: "config.updated".to_string(),
            severity: Severity::Info,
            resource: "config".to_string(),
            message: "configuration updated".to_string(),
            details: None,
            metadata: Map::new(),
            created_at: at,
        })?;
        let global_rev = self.store.global_rev();
        self.publish(EventKind::OpsTimeline, global_rev, |_| {});
        Ok(())
    }

    fn record_service_event(
        &self,
        event_type: &str,
        resource: &str,
        message: String,
        at: DateTime<Utc>,
    ) -> Result<(), OrchestratorError> {
        self.store.append_timeline(TimelineEvent {
            id: self.ids.next(),
            source: EventSource::Service,
            event_type: event_type.to_string(),
            severity: Severity::Info,
            resource: resource.to_string(),
            message,
            details: None,
            metadata: Map::new(),
            created_at: at,
        })?;
        let global_rev = self.store.global_rev();
        self.publish(EventKind::OpsServices, global_rev, |_| {});
        self.publish(EventKind::OpsTimeline, global_rev, |_| {});
        Ok(())
    }

    fn publish(
        &self,
        kind: EventKind,
        global_rev: u64,
        fill: impl FnOnce(&mut Map<String, Value>),
    ) {
        let mut event = Event::with_rev(kind, global_rev);
        fill(&mut event.payload);
        self.hub.publish(&event);
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
