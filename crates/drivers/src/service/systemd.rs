// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! systemd service-manager driver.
//!
//! Shells out to `systemctl` / `journalctl`; `--user` is added for
//! user-scope units. Output parsing is kept in pure functions.

use super::{HostOverview, ServiceAction, ServiceError, ServiceManager, ServiceStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_core::ServiceScope;
use std::collections::HashMap;
use tokio::process::Command;

const SHOW_PROPERTIES: &str =
    "Id,Description,LoadState,ActiveState,SubState,ActiveEnterTimestamp";

/// systemd-backed service manager
#[derive(Clone, Default)]
pub struct SystemdManager;

impl SystemdManager {
    pub fn new() -> Self {
        Self
    }

    async fn systemctl(&self, scope: ServiceScope, args: &[&str]) -> Result<String, ServiceError> {
        let mut cmd = Command::new("systemctl");
        if scope == ServiceScope::User {
            cmd.arg("--user");
        }
        cmd.args(args);
        let output = cmd
            .output()
            .await
            .map_err(|e| ServiceError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let line = stderr.lines().next().unwrap_or("").trim();
            if line.to_lowercase().contains("not found")
                || line.to_lowercase().contains("not loaded")
            {
                return Err(ServiceError::NotFound(line.to_string()));
            }
            return Err(ServiceError::CommandFailed(line.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Parse `systemctl show` `key=value` output.
fn parse_show(stdout: &str) -> HashMap<&str, &str> {
    stdout
        .lines()
        .filter_map(|line| line.split_once('='))
        .collect()
}

/// Build a [`ServiceStatus`] from `systemctl show` properties.
fn status_from_show(unit: &str, scope: ServiceScope, stdout: &str) -> ServiceStatus {
    let props = parse_show(stdout);
    let since = props
        .get("ActiveEnterTimestamp")
        .and_then(|v| parse_systemd_timestamp(v));
    ServiceStatus {
        unit: props.get("Id").unwrap_or(&unit).to_string(),
        scope,
        description: props.get("Description").unwrap_or(&"").to_string(),
        load_state: props.get("LoadState").unwrap_or(&"").to_string(),
        active_state: props.get("ActiveState").unwrap_or(&"").to_string(),
        sub_state: props.get("SubState").unwrap_or(&"").to_string(),
        since,
    }
}

/// Parse systemd's `Day YYYY-MM-DD HH:MM:SS TZ` timestamp format.
fn parse_systemd_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Drop the leading weekday and trailing timezone token.
    let mut parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() == 4 {
        parts.remove(0);
        parts.pop();
    }
    let joined = parts.join(" ");
    chrono::NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse `systemctl list-units --plain --no-legend` rows.
fn parse_list_units(scope: ServiceScope, stdout: &str) -> Vec<ServiceStatus> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let unit = parts.next()?;
            if !unit.ends_with(".service") {
                return None;
            }
            let load_state = parts.next()?.to_string();
            let active_state = parts.next()?.to_string();
            let sub_state = parts.next()?.to_string();
            let description = parts.collect::<Vec<_>>().join(" ");
            Some(ServiceStatus {
                unit: unit.to_string(),
                scope,
                description,
                load_state,
                active_state,
                sub_state,
                since: None,
            })
        })
        .collect()
}

/// Parse `/proc/loadavg` content.
fn parse_loadavg(content: &str) -> (f64, f64, f64) {
    let mut parts = content.split_whitespace();
    let mut next = || parts.next().and_then(|v| v.parse().ok()).unwrap_or(0.0);
    (next(), next(), next())
}

/// Parse `MemTotal` / `MemAvailable` from `/proc/meminfo`.
fn parse_meminfo(content: &str) -> (u64, u64) {
    let mut total = 0;
    let mut available = 0;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = rest.trim().trim_end_matches(" kB").trim().parse().unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = rest.trim().trim_end_matches(" kB").trim().parse().unwrap_or(0);
        }
    }
    (total, available)
}

/// Parse `/proc/uptime` (first field, seconds).
fn parse_uptime(content: &str) -> u64 {
    content
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0) as u64
}

#[async_trait]
impl ServiceManager for SystemdManager {
    async fn overview(&self) -> Result<HostOverview, ServiceError> {
        let loadavg = tokio::fs::read_to_string("/proc/loadavg")
            .await
            .unwrap_or_default();
        let meminfo = tokio::fs::read_to_string("/proc/meminfo")
            .await
            .unwrap_or_default();
        let uptime = tokio::fs::read_to_string("/proc/uptime")
            .await
            .unwrap_or_default();
        let hostname = tokio::fs::read_to_string("/etc/hostname")
            .await
            .map(|h| h.trim().to_string())
            .unwrap_or_default();

        let (load1, load5, load15) = parse_loadavg(&loadavg);
        let (mem_total_kb, mem_available_kb) = parse_meminfo(&meminfo);

        let failed = self
            .systemctl(
                ServiceScope::System,
                &["list-units", "--state=failed", "--plain", "--no-legend"],
            )
            .await
            .map(|out| parse_list_units(ServiceScope::System, &out).len() as u32)
            .unwrap_or(0);

        Ok(HostOverview {
            hostname,
            uptime_secs: parse_uptime(&uptime),
            load1,
            load5,
            load15,
            mem_total_kb,
            mem_available_kb,
            failed_units: failed,
        })
    }

    async fn list_units(&self, scope: ServiceScope) -> Result<Vec<ServiceStatus>, ServiceError> {
        let stdout = self
            .systemctl(
                scope,
                &[
                    "list-units",
                    "--type=service",
                    "--all",
                    "--plain",
                    "--no-legend",
                ],
            )
            .await?;
        Ok(parse_list_units(scope, &stdout))
    }

    async fn status(
        &self,
        unit: &str,
        scope: ServiceScope,
    ) -> Result<ServiceStatus, ServiceError> {
        let stdout = self
            .systemctl(scope, &["show", unit, "--property", SHOW_PROPERTIES])
            .await?;
        let status = status_from_show(unit, scope, &stdout);
        if status.load_state == "not-found" {
            return Err(ServiceError::NotFound(unit.to_string()));
        }
        Ok(status)
    }

    async fn act(
        &self,
        unit: &str,
        scope: ServiceScope,
        action: ServiceAction,
    ) -> Result<ServiceStatus, ServiceError> {
        self.systemctl(scope, &[action.as_str(), unit]).await?;
        self.status(unit, scope).await
    }

    async fn logs(
        &self,
        unit: &str,
        scope: ServiceScope,
        lines: u32,
    ) -> Result<Vec<String>, ServiceError> {
        let mut cmd = Command::new("journalctl");
        if scope == ServiceScope::User {
            cmd.arg("--user");
        }
        let count = lines.to_string();
        cmd.args(["-u", unit, "-n", &count, "--no-pager", "-o", "short-iso"]);
        let output = cmd
            .output()
            .await
            .map_err(|e| ServiceError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::CommandFailed(
                stderr.lines().next().unwrap_or("").to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }

    async fn discover(&self, scope: ServiceScope) -> Result<Vec<String>, ServiceError> {
        let stdout = self
            .systemctl(
                scope,
                &[
                    "list-unit-files",
                    "--type=service",
                    "--plain",
                    "--no-legend",
                ],
            )
            .await?;
        Ok(stdout
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .filter(|unit| unit.ends_with(".service"))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
#[path = "systemd_tests.rs"]
mod tests;
