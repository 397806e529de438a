// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sentinel Daemon (sentineld)
//!
//! Owns the store, the event hub, and the HTTP control surface.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::{Path, PathBuf};

use tracing::info;

use sentinel_daemon::config::SentinelConfig;
use sentinel_daemon::lifecycle::{Daemon, LifecycleError};

/// Rotate the log once it grows past this size.
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

fn print_help() {
    println!("sentineld {}", env!("CARGO_PKG_VERSION"));
    println!("Sentinel daemon - operator control plane for multiplexer sessions and services");
    println!();
    println!("USAGE:");
    println!("    sentineld [--config <path>]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <path>  Path to the TOML configuration file");
    println!("    -h, --help           Print help information");
    println!("    -v, --version        Print version information");
}

fn parse_args() -> Result<Option<PathBuf>, String> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("sentineld {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" | "help" => {
                print_help();
                std::process::exit(0);
            }
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                config_path = Some(PathBuf::from(path));
            }
            other => {
                return Err(format!("unexpected argument '{other}'"));
            }
        }
    }
    Ok(config_path)
}

/// Keep the previous log around as `.1` once it grows too large.
fn rotate_log_if_needed(log_path: &Path) {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return;
    };
    if metadata.len() >= MAX_LOG_BYTES {
        let rotated = log_path.with_extension("log.1");
        let _ = std::fs::rename(log_path, rotated);
    }
}

fn setup_logging(
    state_dir: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    std::fs::create_dir_all(state_dir)?;
    let log_path = state_dir.join("daemon.log");
    rotate_log_if_needed(&log_path);

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match parse_args() {
        Ok(path) => path,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("Usage: sentineld [--config <path>]");
            std::process::exit(2);
        }
    };

    // Resolve the state dir up front so logging lands in the right place.
    let config = match &config_path {
        Some(path) => SentinelConfig::load(path)?,
        None => SentinelConfig::default(),
    };
    let _log_guard = setup_logging(&config.state_dir())?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting sentineld");

    let daemon = match Daemon::startup(config_path.as_deref()) {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(path)) => {
            eprintln!("error: another daemon is already running (lock: {})", path.display());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    daemon.serve().await?;
    Ok(())
}
