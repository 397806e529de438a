// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiplexer plane service.
//!
//! Handler-facing session/window/pane operations: validators first, then
//! the guardrail gate for destructive mutations, then the driver, then
//! projection upkeep and hub broadcast. Listing falls back to store
//! projections when the driver's `list_sessions` fails, so the UI keeps a
//! (possibly stale) view of the fleet while the multiplexer misbehaves.

use chrono::{DateTime, Utc};
use sentinel_core::validate::{self, ValidateError};
use sentinel_core::{session_meta_hash, Event, EventKind, GuardrailInput};
use sentinel_drivers::{MuxDriver, MuxError, MuxErrorKind, MuxPane, MuxWindow, NewWindow};
use sentinel_store::{SessionMeta, SessionObservation, Store, StoreError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::guardrail::{GuardrailError, GuardrailService};
use crate::hub::Hub;

/// Errors from mux plane operations.
#[derive(Debug, Error)]
pub enum MuxServiceError {
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error(transparent)]
    Guardrail(#[from] GuardrailError),
    #[error(transparent)]
    Driver(#[from] MuxError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A session row as served to the UI: driver facts merged with projection
/// counters and operator annotations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub name: String,
    pub attached: u32,
    pub windows: u32,
    pub panes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub unread_windows: u32,
    pub unread_panes: u32,
    pub rev: u64,
}

/// Result of creating a window through the service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWindow {
    pub index: u32,
    pub pane_id: String,
    pub name: String,
}

/// Guardrail-gated façade over the multiplexer driver.
#[derive(Clone)]
pub struct MuxService<M: MuxDriver> {
    driver: M,
    store: Store,
    guardrail: Arc<GuardrailService>,
    hub: Hub,
}

impl<M: MuxDriver> MuxService<M> {
    pub fn new(driver: M, store: Store, guardrail: Arc<GuardrailService>, hub: Hub) -> Self {
        Self {
            driver,
            store,
            guardrail,
            hub,
        }
    }

    pub fn driver(&self) -> &M {
        &self.driver
    }

    /// List sessions, merging driver facts with projections and metadata.
    ///
    /// When the driver cannot list (e.g. a wedged server socket returning
    /// `COMMAND_FAILED`), serves the stored projections instead.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, MuxServiceError> {
        match self.driver.list_sessions().await {
            Ok(live) => {
                let mut summaries = Vec::with_capacity(live.len());
                for session in live {
                    let projection = self.store.get_session(&session.name);
                    let meta = self.store.session_meta(&session.name);
                    let hash = meta.as_ref().map(|m| m.hash.clone()).or_else(|| {
                        session
                            .created_at
                            .map(|c| session_meta_hash(&session.name, c.timestamp()))
                    });
                    let panes = projection.as_ref().map(|p| p.panes).unwrap_or(0);
                    summaries.push(SessionSummary {
                        name: session.name,
                        attached: session.attached,
                        windows: session.windows,
                        panes,
                        activity_at: projection.as_ref().and_then(|p| p.activity_at),
                        last_content: meta
                            .as_ref()
                            .and_then(|m| m.last_content.clone())
                            .or_else(|| projection.as_ref().and_then(|p| p.last_preview.clone())),
                        hash,
                        icon: meta.as_ref().and_then(|m| m.icon.clone()),
                        unread_windows: projection.as_ref().map(|p| p.unread_windows).unwrap_or(0),
                        unread_panes: projection.as_ref().map(|p| p.unread_panes).unwrap_or(0),
                        rev: projection.as_ref().map(|p| p.rev).unwrap_or(0),
                    });
                }
                Ok(summaries)
            }
            Err(e) if e.kind() == MuxErrorKind::CommandFailed => {
                warn!(error = %e, "driver list failed, serving projections");
                Ok(self.sessions_from_projections())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn sessions_from_projections(&self) -> Vec<SessionSummary> {
        self.store
            .list_sessions()
            .into_iter()
            .map(|p| {
                let meta = self.store.session_meta(&p.name);
                SessionSummary {
                    name: p.name.clone(),
                    attached: p.attached,
                    windows: p.windows,
                    panes: p.panes,
                    activity_at: p.activity_at,
                    last_content: meta
                        .as_ref()
                        .and_then(|m| m.last_content.clone())
                        .or(p.last_preview),
                    hash: meta.as_ref().map(|m| m.hash.clone()),
                    icon: meta.as_ref().and_then(|m| m.icon.clone()),
                    unread_windows: p.unread_windows,
                    unread_panes: p.unread_panes,
                    rev: p.rev,
                }
            })
            .collect()
    }

    pub async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        at: DateTime<Utc>,
    ) -> Result<SessionSummary, MuxServiceError> {
        validate::session_name(name)?;
        let session = self.driver.create_session(name, cwd).await?;

        self.store.upsert_session(
            SessionObservation {
                name: session.name.clone(),
                attached: session.attached,
                windows: session.windows,
                panes: 0,
                activity_at: Some(at),
            },
            at,
        )?;
        let hash = session_meta_hash(
            &session.name,
            session.created_at.map(|c| c.timestamp()).unwrap_or(at.timestamp()),
        );
        self.store.set_session_meta(SessionMeta {
            name: session.name.clone(),
            hash: hash.clone(),
            icon: None,
            last_content: None,
        })?;
        self.emit_sessions();

        Ok(SessionSummary {
            name: session.name,
            attached: session.attached,
            windows: session.windows,
            panes: 0,
            activity_at: Some(at),
            last_content: None,
            hash: Some(hash),
            icon: None,
            unread_windows: 0,
            unread_panes: 0,
            rev: self.store.global_rev(),
        })
    }

    pub async fn rename_session(
        &self,
        name: &str,
        new_name: &str,
        at: DateTime<Utc>,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(name)?;
        validate::session_name(new_name)?;
        self.driver.rename_session(name, new_name).await?;
        // Projections re-key on the next collector pass; drop the old row.
        self.store.remove_session(name, at)?;
        self.emit_sessions();
        Ok(())
    }

    /// Kill a session. Gated: action `session.kill`.
    pub async fn kill_session(
        &self,
        name: &str,
        confirmed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(name)?;
        let mut input = GuardrailInput::action("session.kill");
        input.session_name = Some(name.to_string());
        self.guardrail.enforce(&input, confirmed, at)?;

        self.driver.kill_session(name).await?;
        self.store.remove_session(name, at)?;
        self.emit_sessions();
        Ok(())
    }

    pub async fn set_session_icon(
        &self,
        name: &str,
        icon: Option<&str>,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(name)?;
        if let Some(icon) = icon {
            validate::icon_key(icon)?;
        }
        let mut meta = self
            .store
            .session_meta(name)
            .unwrap_or_else(|| SessionMeta {
                name: name.to_string(),
                hash: session_meta_hash(name, 0),
                icon: None,
                last_content: None,
            });
        meta.icon = icon.map(str::to_string);
        self.store.set_session_meta(meta)?;
        self.emit_sessions();
        Ok(())
    }

    pub async fn list_windows(&self, session: &str) -> Result<Vec<MuxWindow>, MuxServiceError> {
        validate::session_name(session)?;
        Ok(self.driver.list_windows(session).await?)
    }

    pub async fn list_panes(&self, session: &str) -> Result<Vec<MuxPane>, MuxServiceError> {
        validate::session_name(session)?;
        Ok(self.driver.list_panes(session).await?)
    }

    /// Create a window. Without an explicit name, a unique default is
    /// allocated from the per-session sequence so recycled indices never
    /// collide.
    pub async fn new_window(
        &self,
        session: &str,
        name: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<CreatedWindow, MuxServiceError> {
        validate::session_name(session)?;
        let created: NewWindow = self.driver.new_window(session, name, cwd).await?;
        let window_name = match name {
            Some(name) => name.to_string(),
            None => {
                let seq = self.store.allocate_window_seq(session, created.index)?;
                let default = format!("window-{seq}");
                if let Err(error) = self
                    .driver
                    .rename_window(session, created.index, &default)
                    .await
                {
                    warn!(%error, "failed to apply default window name");
                }
                default
            }
        };
        self.emit_inspector(session);
        Ok(CreatedWindow {
            index: created.index,
            pane_id: created.pane_id,
            name: window_name,
        })
    }

    /// Kill a window. Gated: action `window.kill`.
    pub async fn kill_window(
        &self,
        session: &str,
        window_index: i64,
        confirmed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(session)?;
        let window_index = validate::window_index(window_index)?;
        let mut input = GuardrailInput::action("window.kill");
        input.session_name = Some(session.to_string());
        input.window_index = Some(window_index);
        self.guardrail.enforce(&input, confirmed, at)?;

        self.driver.kill_window(session, window_index).await?;
        self.store.remove_window(session, window_index, at)?;
        self.emit_inspector(session);
        Ok(())
    }

    pub async fn split_pane(
        &self,
        session: &str,
        pane_id: &str,
        vertical: bool,
    ) -> Result<String, MuxServiceError> {
        validate::session_name(session)?;
        validate::pane_id(pane_id)?;
        let new_pane = self.driver.split_pane(session, pane_id, vertical).await?;
        self.emit_inspector(session);
        Ok(new_pane)
    }

    /// Kill a pane. Gated: action `pane.kill`.
    pub async fn kill_pane(
        &self,
        session: &str,
        pane_id: &str,
        confirmed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(session)?;
        validate::pane_id(pane_id)?;
        let mut input = GuardrailInput::action("pane.kill");
        input.session_name = Some(session.to_string());
        input.pane_id = Some(pane_id.to_string());
        self.guardrail.enforce(&input, confirmed, at)?;

        self.driver.kill_pane(session, pane_id).await?;
        self.store.remove_pane(pane_id, at)?;
        self.emit_inspector(session);
        Ok(())
    }

    pub async fn select_window(
        &self,
        session: &str,
        window_index: i64,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(session)?;
        let window_index = validate::window_index(window_index)?;
        self.driver.select_window(session, window_index).await?;
        self.emit_inspector(session);
        Ok(())
    }

    pub async fn select_pane(&self, session: &str, pane_id: &str) -> Result<(), MuxServiceError> {
        validate::session_name(session)?;
        validate::pane_id(pane_id)?;
        self.driver.select_pane(session, pane_id).await?;
        self.emit_inspector(session);
        Ok(())
    }

    pub async fn rename_window(
        &self,
        session: &str,
        window_index: i64,
        name: &str,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(session)?;
        let window_index = validate::window_index(window_index)?;
        self.driver.rename_window(session, window_index, name).await?;
        self.emit_inspector(session);
        Ok(())
    }

    pub async fn rename_pane(
        &self,
        session: &str,
        pane_id: &str,
        title: &str,
    ) -> Result<(), MuxServiceError> {
        validate::session_name(session)?;
        validate::pane_id(pane_id)?;
        self.driver.rename_pane(session, pane_id, title).await?;
        self.emit_inspector(session);
        Ok(())
    }

    pub async fn capture_pane(
        &self,
        pane_id: &str,
        lines: u32,
    ) -> Result<String, MuxServiceError> {
        validate::pane_id(pane_id)?;
        Ok(self.driver.capture_pane(pane_id, lines).await?)
    }

    fn emit_sessions(&self) {
        self.hub
            .publish(&Event::with_rev(EventKind::TmuxSessions, self.store.global_rev()));
    }

    fn emit_inspector(&self, session: &str) {
        self.hub.publish(
            &Event::with_rev(EventKind::TmuxInspector, self.store.global_rev())
                .field("session", session),
        );
    }
}

#[cfg(test)]
#[path = "mux_tests.rs"]
mod tests;
