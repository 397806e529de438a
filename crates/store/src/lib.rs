// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for Sentinel: journal WAL, snapshots, and the projection
//! state every other component reads through.

mod event;
mod projection;
mod snapshot;
mod state;
mod store;
mod store_ops;
mod store_recovery;
mod wal;

pub use event::StoreEvent;
pub use projection::{
    ChangeKind, EntityType, InspectorPatch, InspectorPane, InspectorWindow, JournalEntry,
    PaneObservation, PaneProjection, ResourceStats, SeenScope, SessionActivityPatch, SessionMeta,
    SessionObservation, SessionProjection, StorageResource, StorageStats, WindowObservation,
    WindowProjection,
};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use store::{MarkSeen, Store, StoreError};
pub use store_ops::{AlertSpec, TimelineFilter};
pub use wal::{Wal, WalError};
