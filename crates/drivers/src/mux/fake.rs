// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake multiplexer driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MuxDriver, MuxError, MuxPane, MuxSession, MuxWindow, NewWindow, PaneCommand};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub enum MuxCall {
    ListSessions,
    ListWindows { session: String },
    ListPanes { session: String },
    CreateSession { name: String, cwd: PathBuf },
    RenameSession { name: String, new_name: String },
    KillSession { name: String },
    NewWindow { session: String, name: Option<String> },
    KillWindow { session: String, window_index: u32 },
    SplitPane { pane_id: String, vertical: bool },
    KillPane { pane_id: String },
    SelectWindow { session: String, window_index: u32 },
    SelectPane { pane_id: String },
    RenameWindow { session: String, window_index: u32, name: String },
    RenamePane { pane_id: String, title: String },
    CapturePane { pane_id: String, lines: u32 },
    ActivePaneCommands,
}

#[derive(Debug, Clone)]
struct FakeWindow {
    window: MuxWindow,
    panes: Vec<MuxPane>,
}

#[derive(Debug, Clone, Default)]
struct FakeSession {
    attached: u32,
    windows: Vec<FakeWindow>,
}

struct FakeMuxState {
    sessions: HashMap<String, FakeSession>,
    calls: Vec<MuxCall>,
    /// Per-method injected failures, keyed by method name.
    errors: HashMap<&'static str, MuxError>,
    captures: HashMap<String, String>,
    next_pane: u64,
}

/// Fake multiplexer driver for testing
#[derive(Clone)]
pub struct FakeMuxDriver {
    inner: Arc<Mutex<FakeMuxState>>,
}

impl Default for FakeMuxDriver {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeMuxState {
                sessions: HashMap::new(),
                calls: Vec::new(),
                errors: HashMap::new(),
                captures: HashMap::new(),
                next_pane: 0,
            })),
        }
    }
}

impl FakeMuxDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MuxCall> {
        self.inner.lock().calls.clone()
    }

    /// Count recorded calls matching a predicate.
    pub fn call_count(&self, matches: impl Fn(&MuxCall) -> bool) -> usize {
        self.inner.lock().calls.iter().filter(|c| matches(c)).count()
    }

    /// Inject a persistent failure for one method (`"list_sessions"`, ...).
    pub fn fail(&self, method: &'static str, error: MuxError) {
        self.inner.lock().errors.insert(method, error);
    }

    /// Clear an injected failure.
    pub fn unfail(&self, method: &'static str) {
        self.inner.lock().errors.remove(method);
    }

    /// Seed a session with one window and one pane.
    pub fn add_session(&self, name: &str) {
        let mut state = self.inner.lock();
        state.next_pane += 1;
        let pane_id = format!("%{}", state.next_pane);
        let pane = MuxPane {
            pane_id,
            session: name.to_string(),
            window_index: 0,
            pane_index: 0,
            title: String::new(),
            active: true,
            tty: "/dev/ttys000".to_string(),
            current_path: "/".to_string(),
            start_command: "sh".to_string(),
            current_command: "sh".to_string(),
        };
        let window = MuxWindow {
            session: name.to_string(),
            index: 0,
            name: "main".to_string(),
            active: true,
            layout: "tiled".to_string(),
            activity_at: None,
            panes: 1,
        };
        state.sessions.insert(
            name.to_string(),
            FakeSession {
                attached: 0,
                windows: vec![FakeWindow { window, panes: vec![pane] }],
            },
        );
    }

    /// Set the text returned by `capture_pane` for a pane.
    pub fn set_capture(&self, pane_id: &str, text: &str) {
        self.inner
            .lock()
            .captures
            .insert(pane_id.to_string(), text.to_string());
    }

    pub fn has_session(&self, name: &str) -> bool {
        self.inner.lock().sessions.contains_key(name)
    }

    fn check(&self, method: &'static str, call: MuxCall) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        state.calls.push(call);
        match state.errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MuxDriver for FakeMuxDriver {
    async fn list_sessions(&self) -> Result<Vec<MuxSession>, MuxError> {
        self.check("list_sessions", MuxCall::ListSessions)?;
        let state = self.inner.lock();
        let mut sessions: Vec<MuxSession> = state
            .sessions
            .iter()
            .map(|(name, s)| MuxSession {
                name: name.clone(),
                attached: s.attached,
                windows: s.windows.len() as u32,
                created_at: None,
            })
            .collect();
        sessions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sessions)
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<MuxWindow>, MuxError> {
        self.check(
            "list_windows",
            MuxCall::ListWindows { session: session.to_string() },
        )?;
        let state = self.inner.lock();
        let fake = state
            .sessions
            .get(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        Ok(fake.windows.iter().map(|w| w.window.clone()).collect())
    }

    async fn list_panes(&self, session: &str) -> Result<Vec<MuxPane>, MuxError> {
        self.check(
            "list_panes",
            MuxCall::ListPanes { session: session.to_string() },
        )?;
        let state = self.inner.lock();
        let fake = state
            .sessions
            .get(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        Ok(fake.windows.iter().flat_map(|w| w.panes.clone()).collect())
    }

    async fn create_session(&self, name: &str, cwd: &Path) -> Result<MuxSession, MuxError> {
        self.check(
            "create_session",
            MuxCall::CreateSession {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
            },
        )?;
        if self.has_session(name) {
            return Err(MuxError::SessionExists(name.to_string()));
        }
        self.add_session(name);
        Ok(MuxSession {
            name: name.to_string(),
            attached: 0,
            windows: 1,
            created_at: None,
        })
    }

    async fn rename_session(&self, name: &str, new_name: &str) -> Result<(), MuxError> {
        self.check(
            "rename_session",
            MuxCall::RenameSession {
                name: name.to_string(),
                new_name: new_name.to_string(),
            },
        )?;
        let mut state = self.inner.lock();
        let fake = state
            .sessions
            .remove(name)
            .ok_or_else(|| MuxError::SessionNotFound(name.to_string()))?;
        state.sessions.insert(new_name.to_string(), fake);
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), MuxError> {
        self.check(
            "kill_session",
            MuxCall::KillSession { name: name.to_string() },
        )?;
        let mut state = self.inner.lock();
        state
            .sessions
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MuxError::SessionNotFound(name.to_string()))
    }

    async fn new_window(
        &self,
        session: &str,
        name: Option<&str>,
        _cwd: Option<&Path>,
    ) -> Result<NewWindow, MuxError> {
        self.check(
            "new_window",
            MuxCall::NewWindow {
                session: session.to_string(),
                name: name.map(str::to_string),
            },
        )?;
        let mut state = self.inner.lock();
        state.next_pane += 1;
        let pane_id = format!("%{}", state.next_pane);
        let fake = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        let index = fake
            .windows
            .iter()
            .map(|w| w.window.index + 1)
            .max()
            .unwrap_or(0);
        let pane = MuxPane {
            pane_id: pane_id.clone(),
            session: session.to_string(),
            window_index: index,
            pane_index: 0,
            title: String::new(),
            active: true,
            tty: String::new(),
            current_path: "/".to_string(),
            start_command: "sh".to_string(),
            current_command: "sh".to_string(),
        };
        fake.windows.push(FakeWindow {
            window: MuxWindow {
                session: session.to_string(),
                index,
                name: name.unwrap_or("").to_string(),
                active: false,
                layout: "tiled".to_string(),
                activity_at: None,
                panes: 1,
            },
            panes: vec![pane],
        });
        Ok(NewWindow { index, pane_id })
    }

    async fn kill_window(&self, session: &str, window_index: u32) -> Result<(), MuxError> {
        self.check(
            "kill_window",
            MuxCall::KillWindow {
                session: session.to_string(),
                window_index,
            },
        )?;
        let mut state = self.inner.lock();
        let fake = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        let before = fake.windows.len();
        fake.windows.retain(|w| w.window.index != window_index);
        if fake.windows.len() == before {
            return Err(MuxError::NotFound(format!("window {window_index}")));
        }
        Ok(())
    }

    async fn split_pane(
        &self,
        session: &str,
        pane_id: &str,
        vertical: bool,
    ) -> Result<String, MuxError> {
        self.check(
            "split_pane",
            MuxCall::SplitPane {
                pane_id: pane_id.to_string(),
                vertical,
            },
        )?;
        let mut state = self.inner.lock();
        state.next_pane += 1;
        let new_id = format!("%{}", state.next_pane);
        let fake = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        let window = fake
            .windows
            .iter_mut()
            .find(|w| w.panes.iter().any(|p| p.pane_id == pane_id))
            .ok_or_else(|| MuxError::NotFound(format!("pane {pane_id}")))?;
        let pane_index = window.panes.len() as u32;
        let window_index = window.window.index;
        window.panes.push(MuxPane {
            pane_id: new_id.clone(),
            session: session.to_string(),
            window_index,
            pane_index,
            title: String::new(),
            active: false,
            tty: String::new(),
            current_path: "/".to_string(),
            start_command: "sh".to_string(),
            current_command: "sh".to_string(),
        });
        window.window.panes = window.panes.len() as u32;
        Ok(new_id)
    }

    async fn kill_pane(&self, session: &str, pane_id: &str) -> Result<(), MuxError> {
        self.check(
            "kill_pane",
            MuxCall::KillPane { pane_id: pane_id.to_string() },
        )?;
        let mut state = self.inner.lock();
        let fake = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        for window in &mut fake.windows {
            let before = window.panes.len();
            window.panes.retain(|p| p.pane_id != pane_id);
            if window.panes.len() != before {
                window.window.panes = window.panes.len() as u32;
                return Ok(());
            }
        }
        Err(MuxError::NotFound(format!("pane {pane_id}")))
    }

    async fn select_window(&self, session: &str, window_index: u32) -> Result<(), MuxError> {
        self.check(
            "select_window",
            MuxCall::SelectWindow {
                session: session.to_string(),
                window_index,
            },
        )
    }

    async fn select_pane(&self, _session: &str, pane_id: &str) -> Result<(), MuxError> {
        self.check(
            "select_pane",
            MuxCall::SelectPane { pane_id: pane_id.to_string() },
        )
    }

    async fn rename_window(
        &self,
        session: &str,
        window_index: u32,
        name: &str,
    ) -> Result<(), MuxError> {
        self.check(
            "rename_window",
            MuxCall::RenameWindow {
                session: session.to_string(),
                window_index,
                name: name.to_string(),
            },
        )?;
        let mut state = self.inner.lock();
        let fake = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        let window = fake
            .windows
            .iter_mut()
            .find(|w| w.window.index == window_index)
            .ok_or_else(|| MuxError::NotFound(format!("window {window_index}")))?;
        window.window.name = name.to_string();
        Ok(())
    }

    async fn rename_pane(
        &self,
        session: &str,
        pane_id: &str,
        title: &str,
    ) -> Result<(), MuxError> {
        self.check(
            "rename_pane",
            MuxCall::RenamePane {
                pane_id: pane_id.to_string(),
                title: title.to_string(),
            },
        )?;
        let mut state = self.inner.lock();
        let fake = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| MuxError::SessionNotFound(session.to_string()))?;
        for window in &mut fake.windows {
            if let Some(pane) = window.panes.iter_mut().find(|p| p.pane_id == pane_id) {
                pane.title = title.to_string();
                return Ok(());
            }
        }
        Err(MuxError::NotFound(format!("pane {pane_id}")))
    }

    async fn capture_pane(&self, pane_id: &str, lines: u32) -> Result<String, MuxError> {
        self.check(
            "capture_pane",
            MuxCall::CapturePane {
                pane_id: pane_id.to_string(),
                lines,
            },
        )?;
        let state = self.inner.lock();
        Ok(state.captures.get(pane_id).cloned().unwrap_or_default())
    }

    async fn active_pane_commands(
        &self,
    ) -> Result<HashMap<String, Vec<PaneCommand>>, MuxError> {
        self.check("active_pane_commands", MuxCall::ActivePaneCommands)?;
        let state = self.inner.lock();
        let mut out = HashMap::new();
        for (name, fake) in &state.sessions {
            let commands: Vec<PaneCommand> = fake
                .windows
                .iter()
                .flat_map(|w| {
                    w.panes.iter().map(|p| PaneCommand {
                        pane_id: p.pane_id.clone(),
                        window_index: p.window_index,
                        command: p.current_command.clone(),
                    })
                })
                .collect();
            out.insert(name.clone(), commands);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
