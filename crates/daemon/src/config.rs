// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file handling.
//!
//! The config is a TOML file rewritten atomically (temp file + rename).
//! PATCHes through the HTTP surface merge into the current file and record
//! a `config.updated` timeline marker via the orchestrator.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from config handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid patch: {0}")]
    Patch(String),
}

fn default_listen() -> String {
    "127.0.0.1:7070".to_string()
}

fn default_pump_secs() -> u64 {
    30
}

fn default_recovery_enabled() -> bool {
    true
}

/// Static daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SentinelConfig {
    /// Listen address for the HTTP surface.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Bearer/cookie token; `None` disables auth.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Origins allowed on cross-origin requests. Empty allows any.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Root state directory. Defaults to `~/.local/state/sentinel`.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Default working directory offered for new sessions.
    #[serde(default)]
    pub default_cwd: Option<PathBuf>,
    #[serde(default = "default_recovery_enabled")]
    pub recovery_enabled: bool,
    /// Poll interval of the schedule pump, in seconds.
    #[serde(default = "default_pump_secs")]
    pub schedule_pump_secs: u64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            auth_token: None,
            allowed_origins: Vec::new(),
            state_dir: None,
            default_cwd: None,
            recovery_enabled: default_recovery_enabled(),
            schedule_pump_secs: default_pump_secs(),
        }
    }
}

impl SentinelConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Apply a JSON patch (field subset) and return the merged config.
    ///
    /// Unknown fields are rejected so typos never pass silently.
    pub fn patched(&self, patch: &serde_json::Map<String, serde_json::Value>) -> Result<Self, ConfigError> {
        let mut merged = serde_json::to_value(self)
            .map_err(|e| ConfigError::Patch(e.to_string()))?;
        let Some(object) = merged.as_object_mut() else {
            return Err(ConfigError::Patch("config is not an object".to_string()));
        };
        for (key, value) in patch {
            if !object.contains_key(key) {
                return Err(ConfigError::Patch(format!("unknown field: {key}")));
            }
            object.insert(key.clone(), value.clone());
        }
        serde_json::from_value(merged).map_err(|e| ConfigError::Patch(e.to_string()))
    }

    /// Resolved state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("sentinel")
        })
    }

    /// Resolved default cwd for new sessions.
    pub fn default_cwd(&self) -> PathBuf {
        self.default_cwd
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
