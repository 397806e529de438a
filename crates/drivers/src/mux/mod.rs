// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-multiplexer driver seam.

mod tmux;

pub use tmux::TmuxDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMuxDriver, MuxCall};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors from multiplexer operations, tagged with a kind discriminator the
/// HTTP layer maps to status codes.
#[derive(Debug, Clone, Error)]
pub enum MuxError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session already exists: {0}")]
    SessionExists(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("multiplexer server not running")]
    ServerNotRunning,
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Stable error-kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxErrorKind {
    SessionNotFound,
    SessionExists,
    NotFound,
    ServerNotRunning,
    CommandFailed,
}

impl MuxError {
    pub fn kind(&self) -> MuxErrorKind {
        match self {
            MuxError::SessionNotFound(_) => MuxErrorKind::SessionNotFound,
            MuxError::SessionExists(_) => MuxErrorKind::SessionExists,
            MuxError::NotFound(_) => MuxErrorKind::NotFound,
            MuxError::ServerNotRunning => MuxErrorKind::ServerNotRunning,
            MuxError::CommandFailed(_) => MuxErrorKind::CommandFailed,
        }
    }

    /// Contract-stable wire code.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            MuxErrorKind::SessionNotFound => "SESSION_NOT_FOUND",
            MuxErrorKind::SessionExists => "SESSION_EXISTS",
            MuxErrorKind::NotFound => "NOT_FOUND",
            MuxErrorKind::ServerNotRunning => "SERVER_NOT_RUNNING",
            MuxErrorKind::CommandFailed => "COMMAND_FAILED",
        }
    }
}

/// One multiplexer session as reported by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxSession {
    pub name: String,
    /// Number of attached clients.
    pub attached: u32,
    pub windows: u32,
    pub created_at: Option<DateTime<Utc>>,
}

/// One window of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxWindow {
    pub session: String,
    pub index: u32,
    pub name: String,
    pub active: bool,
    pub layout: String,
    pub activity_at: Option<DateTime<Utc>>,
    pub panes: u32,
}

/// One pane of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxPane {
    pub pane_id: String,
    pub session: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub title: String,
    pub active: bool,
    pub tty: String,
    pub current_path: String,
    pub start_command: String,
    pub current_command: String,
}

/// Result of creating a window: the richer contract so callers can apply
/// deterministic default names to the created window and pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWindow {
    pub index: u32,
    pub pane_id: String,
}

/// Per-pane command snapshot used by the activity collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneCommand {
    pub pane_id: String,
    pub window_index: u32,
    pub command: String,
}

/// Driver for the terminal multiplexer (tmux).
#[async_trait]
pub trait MuxDriver: Clone + Send + Sync + 'static {
    async fn list_sessions(&self) -> Result<Vec<MuxSession>, MuxError>;

    async fn list_windows(&self, session: &str) -> Result<Vec<MuxWindow>, MuxError>;

    async fn list_panes(&self, session: &str) -> Result<Vec<MuxPane>, MuxError>;

    async fn create_session(&self, name: &str, cwd: &Path) -> Result<MuxSession, MuxError>;

    async fn rename_session(&self, name: &str, new_name: &str) -> Result<(), MuxError>;

    async fn kill_session(&self, name: &str) -> Result<(), MuxError>;

    /// Create a window; returns the created window index and pane id.
    async fn new_window(
        &self,
        session: &str,
        name: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<NewWindow, MuxError>;

    async fn kill_window(&self, session: &str, window_index: u32) -> Result<(), MuxError>;

    /// Split a pane; returns the new pane id.
    async fn split_pane(
        &self,
        session: &str,
        pane_id: &str,
        vertical: bool,
    ) -> Result<String, MuxError>;

    async fn kill_pane(&self, session: &str, pane_id: &str) -> Result<(), MuxError>;

    async fn select_window(&self, session: &str, window_index: u32) -> Result<(), MuxError>;

    async fn select_pane(&self, session: &str, pane_id: &str) -> Result<(), MuxError>;

    async fn rename_window(
        &self,
        session: &str,
        window_index: u32,
        name: &str,
    ) -> Result<(), MuxError>;

    async fn rename_pane(&self, session: &str, pane_id: &str, title: &str)
        -> Result<(), MuxError>;

    /// Capture recent output of a pane.
    async fn capture_pane(&self, pane_id: &str, lines: u32) -> Result<String, MuxError>;

    /// Current foreground command per pane, grouped by session.
    async fn active_pane_commands(&self)
        -> Result<HashMap<String, Vec<PaneCommand>>, MuxError>;
}
