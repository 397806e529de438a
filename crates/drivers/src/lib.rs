// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Host-side drivers for Sentinel: the terminal-multiplexer driver and the
//! service-manager driver, plus fakes for tests.

pub mod mux;
pub mod service;

pub use mux::{
    MuxDriver, MuxError, MuxErrorKind, MuxPane, MuxSession, MuxWindow, NewWindow, PaneCommand,
    TmuxDriver,
};
pub use service::{
    HostOverview, ServiceAction, ServiceError, ServiceManager, ServiceStatus, SystemdManager,
};

#[cfg(any(test, feature = "test-support"))]
pub use mux::{FakeMuxDriver, MuxCall};
#[cfg(any(test, feature = "test-support"))]
pub use service::{FakeServiceManager, ServiceCall};
