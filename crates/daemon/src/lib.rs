// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sentinel daemon library: configuration, lifecycle, the HTTP surface,
//! and the schedule pump.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod pulse;

pub use config::SentinelConfig;
pub use http::{build_router, AppState};
pub use lifecycle::{Daemon, LifecycleError};
