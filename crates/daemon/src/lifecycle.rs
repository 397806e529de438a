// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, serving, shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use sentinel_drivers::{SystemdManager, TmuxDriver};
use sentinel_store::{Store, StoreError};

use crate::config::{ConfigError, SentinelConfig};
use crate::http::{build_router, AppState};
use crate::pulse;

/// Grace window for draining tracked work at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Production state type: tmux + systemd drivers.
pub type DaemonState = AppState<TmuxDriver, SystemdManager>;

/// Errors from daemon lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("another daemon is already running (lock held on {0})")]
    LockFailed(PathBuf),
}

/// A started daemon holding the lock file and assembled state.
pub struct Daemon {
    pub state: Arc<DaemonState>,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

impl Daemon {
    /// Start the daemon: load config, take the pid lock, open the store,
    /// and assemble the component graph.
    pub fn startup(config_path: Option<&Path>) -> Result<Self, LifecycleError> {
        let config = match config_path {
            Some(path) => SentinelConfig::load(path)?,
            None => SentinelConfig::default(),
        };
        let state_dir = config.state_dir();
        std::fs::create_dir_all(&state_dir)?;

        let lock_path = state_dir.join("daemon.pid");
        let lock_file = acquire_lock(&lock_path)?;

        let store = Store::open(&state_dir)?;
        set_boot_id(&store)?;

        let state = AppState::assemble(
            config,
            config_path.map(Path::to_path_buf),
            store,
            TmuxDriver::new(),
            SystemdManager::new(),
        );

        info!(state_dir = %state_dir.display(), "daemon started");
        Ok(Self { state, lock_file })
    }

    /// Serve the HTTP surface until interrupted, then shut down.
    pub async fn serve(self) -> Result<(), LifecycleError> {
        let listen = self.state.config.read().listen.clone();
        let listener = tokio::net::TcpListener::bind(&listen).await?;
        info!(%listen, "listening");

        // Schedule pump rides the run context.
        let pump_interval = {
            let config = self.state.config.read();
            Duration::from_secs(config.schedule_pump_secs.max(1))
        };
        self.state.tracker.spawn(pulse::run(
            self.state.schedules.clone(),
            pump_interval,
            self.state.cancel.child_token(),
        ));

        // Group-commit flusher: bounds the WAL durability window even when
        // no further writes arrive.
        let flush_store = self.state.store.clone();
        let flush_cancel = self.state.cancel.child_token();
        self.state.tracker.spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(200));
            loop {
                tokio::select! {
                    _ = flush_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(error) = flush_store.flush_wal() {
                            warn!(%error, "periodic WAL flush failed");
                        }
                    }
                }
            }
        });

        let router = build_router(Arc::clone(&self.state));
        let state = Arc::clone(&self.state);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                wait_for_signal().await;
            })
            .await?;

        shutdown(&state, SHUTDOWN_GRACE).await
    }
}

/// Cancel the run context, drain tracked work, close the hub, and close
/// the store last.
pub async fn shutdown<M, S>(
    state: &Arc<AppState<M, S>>,
    grace: Duration,
) -> Result<(), LifecycleError>
where
    M: sentinel_drivers::MuxDriver,
    S: sentinel_drivers::ServiceManager,
{
    info!("shutting down");
    state.cancel.cancel();
    state.tracker.close();
    if tokio::time::timeout(grace, state.tracker.wait())
        .await
        .is_err()
    {
        warn!(grace_secs = grace.as_secs(), "tracked work did not drain in time");
    }
    state.hub.close();
    state.store.close()?;
    info!("shutdown complete");
    Ok(())
}

fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    if file.try_lock_exclusive().is_err() {
        return Err(LifecycleError::LockFailed(path.to_path_buf()));
    }
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

/// Record the host boot id so recovery can tell reboots apart. Falls back
/// to a per-start id off Linux.
fn set_boot_id(store: &Store) -> Result<(), StoreError> {
    let boot_id = std::fs::read_to_string("/proc/sys/kernel/random/boot_id")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());
    store.set_boot_id(&boot_id)
}

async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
