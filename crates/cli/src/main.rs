// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sentinel - Sentinel control-plane CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sentinel_daemon::config::SentinelConfig;
use sentinel_daemon::lifecycle::Daemon;

#[derive(Parser)]
#[command(
    name = "sentinel",
    version,
    about = "Sentinel - operator control plane for multiplexer sessions and services"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon in the foreground
    Serve {
        /// Path to the TOML configuration file
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved settings
    Check {
        /// Path to the TOML configuration file
        #[arg(value_name = "PATH")]
        config: PathBuf,
    },
}

fn check(path: &PathBuf) -> Result<()> {
    let config = SentinelConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    println!("config ok: {}", path.display());
    println!("  listen:            {}", config.listen);
    println!("  auth:              {}", if config.auth_token.is_some() { "token" } else { "disabled" });
    println!("  state dir:         {}", config.state_dir().display());
    println!("  default cwd:       {}", config.default_cwd().display());
    println!("  recovery:          {}", if config.recovery_enabled { "enabled" } else { "disabled" });
    println!("  schedule pump:     every {}s", config.schedule_pump_secs);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config } => {
            let daemon = Daemon::startup(config.as_deref())?;
            daemon.serve().await?;
            Ok(())
        }
        Commands::Check { config } => check(&config),
    }
}
