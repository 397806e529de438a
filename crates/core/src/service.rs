// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-registered service units and session annotation helpers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Scope a service unit is managed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceScope {
    System,
    User,
}

impl ServiceScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceScope::System => "system",
            ServiceScope::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(ServiceScope::System),
            "user" => Some(ServiceScope::User),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator-registered unit, unique by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomService {
    pub name: String,
    pub display_name: String,
    /// Service manager backend (e.g. "systemd").
    pub manager: String,
    pub unit: String,
    pub scope: ServiceScope,
}

/// Deterministic per-session hash used as a UI cache key.
///
/// Derived from the session name and its creation time truncated to whole
/// seconds, so the key survives restarts but changes when the session is
/// recreated under the same name.
pub fn session_meta_hash(name: &str, created_at_seconds: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(created_at_seconds.to_string().as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for byte in &digest[..8] {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
