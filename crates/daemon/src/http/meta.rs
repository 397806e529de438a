// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meta endpoint and directory suggestions for the new-session cwd picker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Response;
use sentinel_drivers::{MuxDriver, ServiceManager};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{data, ApiError};
use super::AppState;

/// Suggestion limit bounds.
const MIN_SUGGESTIONS: usize = 1;
const MAX_SUGGESTIONS: usize = 64;
const DEFAULT_SUGGESTIONS: usize = 16;

/// `GET /api/meta`
pub async fn meta<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
) -> Response {
    let config = state.config.read();
    data(json!({
        "tokenRequired": config.auth_token.is_some(),
        "defaultCwd": config.default_cwd().display().to_string(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    limit: Option<i64>,
}

/// `GET /api/fs/suggest?prefix=&limit=`
pub async fn suggest<M: MuxDriver, S: ServiceManager>(
    State(state): State<Arc<AppState<M, S>>>,
    Query(query): Query<SuggestQuery>,
) -> Result<Response, ApiError> {
    let home = {
        let config = state.config.read();
        config.default_cwd()
    };
    let limit = clamp_suggest_limit(query.limit);
    let suggestions = list_directory_suggestions(&query.prefix, &home, limit);
    Ok(data(json!({ "suggestions": suggestions })))
}

fn clamp_suggest_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n >= 1 => (n as usize).min(MAX_SUGGESTIONS),
        Some(_) => MIN_SUGGESTIONS,
        None => DEFAULT_SUGGESTIONS,
    }
}

/// Directory completions for a path prefix.
///
/// `~` expands against `home`; a relative prefix resolves under `home`.
/// Only directories under the resolved base are returned, sorted
/// case-insensitively and capped to `limit`.
pub(crate) fn list_directory_suggestions(prefix: &str, home: &Path, limit: usize) -> Vec<String> {
    let expanded = if let Some(rest) = prefix.strip_prefix("~/") {
        home.join(rest)
    } else if prefix == "~" {
        home.to_path_buf()
    } else if prefix.is_empty() {
        home.to_path_buf()
    } else {
        PathBuf::from(prefix)
    };
    let expanded = if expanded.is_relative() {
        home.join(expanded)
    } else {
        expanded
    };

    // Split into the directory to scan and the name fragment to match.
    let (base, fragment) = if prefix.ends_with('/') || prefix.is_empty() || prefix == "~" {
        (expanded, String::new())
    } else {
        let fragment = expanded
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        let base = expanded.parent().map(Path::to_path_buf).unwrap_or(expanded);
        (base, fragment)
    };

    let Ok(entries) = std::fs::read_dir(&base) else {
        return Vec::new();
    };

    let fragment_lower = fragment.to_lowercase();
    let mut out: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') && !fragment.starts_with('.') {
                return None;
            }
            if !name.to_lowercase().starts_with(&fragment_lower) {
                return None;
            }
            Some(base.join(name).display().to_string())
        })
        .collect();
    out.sort_by_key(|path| path.to_lowercase());
    out.truncate(limit);
    out
}

#[cfg(test)]
#[path = "meta_tests.rs"]
mod tests;
