// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux multiplexer driver.
//!
//! Every operation shells out to `tmux` with tab-separated `-F` format
//! strings; parsing lives in pure functions so the wire format stays
//! testable without a running server.

use super::{
    MuxDriver, MuxError, MuxErrorKind, MuxPane, MuxSession, MuxWindow, NewWindow, PaneCommand,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

const SESSION_FORMAT: &str =
    "#{session_name}\t#{session_attached}\t#{session_windows}\t#{session_created}";
const WINDOW_FORMAT: &str = "#{window_index}\t#{window_name}\t#{window_active}\t#{window_layout}\t#{window_activity}\t#{window_panes}";
const PANE_FORMAT: &str = "#{pane_id}\t#{window_index}\t#{pane_index}\t#{pane_title}\t#{pane_active}\t#{pane_tty}\t#{pane_current_path}\t#{pane_start_command}\t#{pane_current_command}";

/// Tmux-based multiplexer driver
#[derive(Clone, Default)]
pub struct TmuxDriver;

impl TmuxDriver {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str]) -> Result<String, MuxError> {
        let output = Command::new("tmux")
            .args(args)
            .output()
            .await
            .map_err(|e| MuxError::CommandFailed(e.to_string()))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        debug!(args = ?args, stderr = %stderr.trim(), "tmux command failed");
        Err(classify_failure(&stderr))
    }
}

/// Map tmux stderr onto the error-kind taxonomy.
fn classify_failure(stderr: &str) -> MuxError {
    let line = stderr.lines().next().unwrap_or("").trim();
    let lower = line.to_lowercase();
    if lower.contains("no server running") || lower.contains("error connecting to") {
        return MuxError::ServerNotRunning;
    }
    if lower.contains("duplicate session") {
        let name = line.rsplit(':').next().unwrap_or("").trim();
        return MuxError::SessionExists(name.to_string());
    }
    if lower.contains("session not found") || lower.contains("can't find session") {
        let name = line.rsplit(':').next().unwrap_or("").trim();
        return MuxError::SessionNotFound(name.to_string());
    }
    if lower.contains("can't find window") || lower.contains("can't find pane") {
        return MuxError::NotFound(line.to_string());
    }
    MuxError::CommandFailed(line.to_string())
}

fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = value.trim().parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}

fn parse_flag(value: &str) -> bool {
    value.trim() == "1"
}

/// Parse `list-sessions` output in [`SESSION_FORMAT`].
fn parse_sessions(stdout: &str) -> Vec<MuxSession> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let name = parts.next()?.to_string();
            if name.is_empty() {
                return None;
            }
            let attached = parts.next()?.trim().parse().unwrap_or(0);
            let windows = parts.next()?.trim().parse().unwrap_or(0);
            let created_at = parts.next().and_then(parse_epoch);
            Some(MuxSession {
                name,
                attached,
                windows,
                created_at,
            })
        })
        .collect()
}

/// Parse `list-windows` output in [`WINDOW_FORMAT`].
fn parse_windows(session: &str, stdout: &str) -> Vec<MuxWindow> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let index = parts.next()?.trim().parse().ok()?;
            let name = parts.next()?.to_string();
            let active = parse_flag(parts.next()?);
            let layout = parts.next()?.to_string();
            let activity_at = parts.next().and_then(parse_epoch);
            let panes = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
            Some(MuxWindow {
                session: session.to_string(),
                index,
                name,
                active,
                layout,
                activity_at,
                panes,
            })
        })
        .collect()
}

/// Parse `list-panes -s` output in [`PANE_FORMAT`].
fn parse_panes(session: &str, stdout: &str) -> Vec<MuxPane> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let pane_id = parts.next()?.to_string();
            if !pane_id.starts_with('%') {
                return None;
            }
            let window_index = parts.next()?.trim().parse().ok()?;
            let pane_index = parts.next()?.trim().parse().ok()?;
            let title = parts.next()?.to_string();
            let active = parse_flag(parts.next()?);
            let tty = parts.next()?.to_string();
            let current_path = parts.next()?.to_string();
            let start_command = parts.next()?.to_string();
            let current_command = parts.next().unwrap_or("").to_string();
            Some(MuxPane {
                pane_id,
                session: session.to_string(),
                window_index,
                pane_index,
                title,
                active,
                tty,
                current_path,
                start_command,
                current_command,
            })
        })
        .collect()
}

#[async_trait]
impl MuxDriver for TmuxDriver {
    async fn list_sessions(&self) -> Result<Vec<MuxSession>, MuxError> {
        match self.run(&["list-sessions", "-F", SESSION_FORMAT]).await {
            Ok(stdout) => Ok(parse_sessions(&stdout)),
            // No server means no sessions, not a failure, for listing.
            Err(MuxError::ServerNotRunning) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<MuxWindow>, MuxError> {
        let stdout = self
            .run(&["list-windows", "-t", session, "-F", WINDOW_FORMAT])
            .await?;
        Ok(parse_windows(session, &stdout))
    }

    async fn list_panes(&self, session: &str) -> Result<Vec<MuxPane>, MuxError> {
        let stdout = self
            .run(&["list-panes", "-s", "-t", session, "-F", PANE_FORMAT])
            .await?;
        Ok(parse_panes(session, &stdout))
    }

    async fn create_session(&self, name: &str, cwd: &Path) -> Result<MuxSession, MuxError> {
        let cwd_str = cwd.to_string_lossy();
        self.run(&["new-session", "-d", "-s", name, "-c", &cwd_str])
            .await?;
        let sessions = self.list_sessions().await?;
        sessions
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| MuxError::SessionNotFound(name.to_string()))
    }

    async fn rename_session(&self, name: &str, new_name: &str) -> Result<(), MuxError> {
        self.run(&["rename-session", "-t", name, new_name]).await?;
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), MuxError> {
        self.run(&["kill-session", "-t", name]).await?;
        Ok(())
    }

    async fn new_window(
        &self,
        session: &str,
        name: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<NewWindow, MuxError> {
        let mut args: Vec<String> = vec![
            "new-window".to_string(),
            "-t".to_string(),
            session.to_string(),
            "-P".to_string(),
            "-F".to_string(),
            "#{window_index}\t#{pane_id}".to_string(),
        ];
        if let Some(name) = name {
            args.push("-n".to_string());
            args.push(name.to_string());
        }
        if let Some(cwd) = cwd {
            args.push("-c".to_string());
            args.push(cwd.to_string_lossy().to_string());
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.run(&arg_refs).await?;
        let line = stdout.lines().next().unwrap_or("");
        let mut parts = line.split('\t');
        let index = parts
            .next()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| MuxError::CommandFailed(format!("unexpected new-window output: {line:?}")))?;
        let pane_id = parts.next().unwrap_or("").trim().to_string();
        Ok(NewWindow { index, pane_id })
    }

    async fn kill_window(&self, session: &str, window_index: u32) -> Result<(), MuxError> {
        let target = format!("{session}:{window_index}");
        self.run(&["kill-window", "-t", &target]).await?;
        Ok(())
    }

    async fn split_pane(
        &self,
        _session: &str,
        pane_id: &str,
        vertical: bool,
    ) -> Result<String, MuxError> {
        let direction = if vertical { "-v" } else { "-h" };
        let stdout = self
            .run(&[
                "split-window",
                direction,
                "-t",
                pane_id,
                "-P",
                "-F",
                "#{pane_id}",
            ])
            .await?;
        Ok(stdout.trim().to_string())
    }

    async fn kill_pane(&self, _session: &str, pane_id: &str) -> Result<(), MuxError> {
        self.run(&["kill-pane", "-t", pane_id]).await?;
        Ok(())
    }

    async fn select_window(&self, session: &str, window_index: u32) -> Result<(), MuxError> {
        let target = format!("{session}:{window_index}");
        self.run(&["select-window", "-t", &target]).await?;
        Ok(())
    }

    async fn select_pane(&self, _session: &str, pane_id: &str) -> Result<(), MuxError> {
        self.run(&["select-pane", "-t", pane_id]).await?;
        Ok(())
    }

    async fn rename_window(
        &self,
        session: &str,
        window_index: u32,
        name: &str,
    ) -> Result<(), MuxError> {
        let target = format!("{session}:{window_index}");
        self.run(&["rename-window", "-t", &target, name]).await?;
        Ok(())
    }

    async fn rename_pane(
        &self,
        _session: &str,
        pane_id: &str,
        title: &str,
    ) -> Result<(), MuxError> {
        self.run(&["select-pane", "-t", pane_id, "-T", title]).await?;
        Ok(())
    }

    async fn capture_pane(&self, pane_id: &str, lines: u32) -> Result<String, MuxError> {
        let start = format!("-{lines}");
        self.run(&["capture-pane", "-t", pane_id, "-p", "-S", &start])
            .await
    }

    async fn active_pane_commands(
        &self,
    ) -> Result<HashMap<String, Vec<PaneCommand>>, MuxError> {
        let stdout = match self
            .run(&[
                "list-panes",
                "-a",
                "-F",
                "#{session_name}\t#{pane_id}\t#{window_index}\t#{pane_current_command}",
            ])
            .await
        {
            Ok(stdout) => stdout,
            Err(MuxError::ServerNotRunning) => return Ok(HashMap::new()),
            Err(e) => return Err(e),
        };
        let mut by_session: HashMap<String, Vec<PaneCommand>> = HashMap::new();
        for line in stdout.lines() {
            let mut parts = line.split('\t');
            let (Some(session), Some(pane_id), Some(index), Some(command)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let Ok(window_index) = index.trim().parse() else {
                continue;
            };
            by_session
                .entry(session.to_string())
                .or_default()
                .push(PaneCommand {
                    pane_id: pane_id.to_string(),
                    window_index,
                    command: command.to_string(),
                });
        }
        Ok(by_session)
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
