// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake service manager for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{HostOverview, ServiceAction, ServiceError, ServiceManager, ServiceStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use sentinel_core::ServiceScope;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded manager call
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    Overview,
    ListUnits { scope: ServiceScope },
    Status { unit: String },
    Act { unit: String, action: ServiceAction },
    Logs { unit: String, lines: u32 },
    Discover { scope: ServiceScope },
}

struct FakeServiceState {
    units: HashMap<String, ServiceStatus>,
    /// `active_state` a unit transitions to after the next `act` call.
    act_results: HashMap<String, String>,
    logs: HashMap<String, Vec<String>>,
    calls: Vec<ServiceCall>,
    fail_act: Option<ServiceError>,
}

/// Fake service manager for testing
#[derive(Clone)]
pub struct FakeServiceManager {
    inner: Arc<Mutex<FakeServiceState>>,
}

impl Default for FakeServiceManager {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeServiceState {
                units: HashMap::new(),
                act_results: HashMap::new(),
                logs: HashMap::new(),
                calls: Vec::new(),
                fail_act: None,
            })),
        }
    }
}

impl FakeServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a unit in the given active state.
    pub fn add_unit(&self, unit: &str, active_state: &str) {
        self.inner.lock().units.insert(
            unit.to_string(),
            ServiceStatus {
                unit: unit.to_string(),
                scope: ServiceScope::System,
                description: format!("{unit} (fake)"),
                load_state: "loaded".to_string(),
                active_state: active_state.to_string(),
                sub_state: if active_state == "active" {
                    "running".to_string()
                } else {
                    "dead".to_string()
                },
                since: None,
            },
        );
    }

    /// Script the active state a unit lands in after the next action.
    pub fn set_act_result(&self, unit: &str, active_state: &str) {
        self.inner
            .lock()
            .act_results
            .insert(unit.to_string(), active_state.to_string());
    }

    /// Make every `act` call fail.
    pub fn fail_act(&self, error: ServiceError) {
        self.inner.lock().fail_act = Some(error);
    }

    pub fn set_logs(&self, unit: &str, lines: Vec<String>) {
        self.inner.lock().logs.insert(unit.to_string(), lines);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl ServiceManager for FakeServiceManager {
    async fn overview(&self) -> Result<HostOverview, ServiceError> {
        let mut state = self.inner.lock();
        state.calls.push(ServiceCall::Overview);
        let failed_units = state.units.values().filter(|u| u.is_failed()).count() as u32;
        Ok(HostOverview {
            hostname: "fakehost".to_string(),
            uptime_secs: 3600,
            load1: 0.1,
            load5: 0.2,
            load15: 0.3,
            mem_total_kb: 16_000_000,
            mem_available_kb: 8_000_000,
            failed_units,
        })
    }

    async fn list_units(&self, scope: ServiceScope) -> Result<Vec<ServiceStatus>, ServiceError> {
        let mut state = self.inner.lock();
        state.calls.push(ServiceCall::ListUnits { scope });
        let mut units: Vec<_> = state.units.values().cloned().collect();
        units.sort_by(|a, b| a.unit.cmp(&b.unit));
        Ok(units)
    }

    async fn status(
        &self,
        unit: &str,
        _scope: ServiceScope,
    ) -> Result<ServiceStatus, ServiceError> {
        let mut state = self.inner.lock();
        state.calls.push(ServiceCall::Status { unit: unit.to_string() });
        state
            .units
            .get(unit)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(unit.to_string()))
    }

    async fn act(
        &self,
        unit: &str,
        _scope: ServiceScope,
        action: ServiceAction,
    ) -> Result<ServiceStatus, ServiceError> {
        let mut state = self.inner.lock();
        state.calls.push(ServiceCall::Act {
            unit: unit.to_string(),
            action,
        });
        if let Some(error) = &state.fail_act {
            return Err(error.clone());
        }
        let scripted = state.act_results.get(unit).cloned();
        let status = state
            .units
            .get_mut(unit)
            .ok_or_else(|| ServiceError::NotFound(unit.to_string()))?;
        let next_state = scripted.unwrap_or_else(|| match action {
            ServiceAction::Stop => "inactive".to_string(),
            _ => "active".to_string(),
        });
        status.active_state = next_state;
        status.sub_state = match status.active_state.as_str() {
            "active" => "running".to_string(),
            "failed" => "failed".to_string(),
            _ => "dead".to_string(),
        };
        Ok(status.clone())
    }

    async fn logs(
        &self,
        unit: &str,
        _scope: ServiceScope,
        lines: u32,
    ) -> Result<Vec<String>, ServiceError> {
        let mut state = self.inner.lock();
        state.calls.push(ServiceCall::Logs {
            unit: unit.to_string(),
            lines,
        });
        if !state.units.contains_key(unit) {
            return Err(ServiceError::NotFound(unit.to_string()));
        }
        let mut log = state.logs.get(unit).cloned().unwrap_or_default();
        let keep = lines as usize;
        if log.len() > keep {
            log = log.split_off(log.len() - keep);
        }
        Ok(log)
    }

    async fn discover(&self, scope: ServiceScope) -> Result<Vec<String>, ServiceError> {
        let mut state = self.inner.lock();
        state.calls.push(ServiceCall::Discover { scope });
        let mut units: Vec<String> = state.units.keys().cloned().collect();
        units.sort();
        Ok(units)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
