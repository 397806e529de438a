// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure syntactic validators shared by the HTTP layer and the engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Maximum length of a multiplexer session name.
pub const MAX_SESSION_NAME_LEN: usize = 64;

/// Maximum length of an icon key.
pub const MAX_ICON_KEY_LEN: usize = 32;

/// Errors from syntactic validation. Always maps to `400 INVALID_REQUEST`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("invalid session name: {0:?}")]
    SessionName(String),
    #[error("invalid icon key: {0:?}")]
    IconKey(String),
    #[error("invalid pane id: {0:?}")]
    PaneId(String),
    #[error("invalid window index: {0}")]
    WindowIndex(i64),
    #[error("invalid timestamp: {0:?}")]
    Timestamp(String),
}

/// Validate a session name: `[A-Za-z0-9._-]`, 1..=64 chars.
pub fn session_name(name: &str) -> Result<(), ValidateError> {
    let ok = !name.is_empty()
        && name.len() <= MAX_SESSION_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(ValidateError::SessionName(name.to_string()))
    }
}

/// Validate an icon key: `[a-z0-9-]`, 1..=32 chars.
pub fn icon_key(key: &str) -> Result<(), ValidateError> {
    let ok = !key.is_empty()
        && key.len() <= MAX_ICON_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ValidateError::IconKey(key.to_string()))
    }
}

/// Validate a pane id: `%` prefix with a non-empty tail (tmux `%12` style).
pub fn pane_id(id: &str) -> Result<(), ValidateError> {
    match id.strip_prefix('%') {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(ValidateError::PaneId(id.to_string())),
    }
}

/// Validate a window index and narrow it to `u32`.
pub fn window_index(index: i64) -> Result<u32, ValidateError> {
    u32::try_from(index).map_err(|_| ValidateError::WindowIndex(index))
}

/// Parse an RFC3339 timestamp into UTC.
pub fn rfc3339(value: &str) -> Result<DateTime<Utc>, ValidateError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidateError::Timestamp(value.to_string()))
}

/// Clamp a caller-supplied limit to `1..=max`, falling back to `default`
/// when absent or non-positive.
pub fn clamp_limit(requested: Option<i64>, default: usize, max: usize) -> usize {
    match requested {
        Some(n) if n >= 1 => (n as usize).min(max),
        _ => default.min(max),
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
