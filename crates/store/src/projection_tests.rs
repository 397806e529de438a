// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use yare::parameterized;

#[test]
fn pane_unread_follows_revisions() {
    let mut pane = PaneProjection {
        pane_id: "%1".to_string(),
        session: "dev".to_string(),
        window_index: 0,
        pane_index: 0,
        title: String::new(),
        active: true,
        tty: String::new(),
        current_path: String::new(),
        start_command: String::new(),
        current_command: String::new(),
        tail_preview: None,
        tail_hash: None,
        tail_captured_at: None,
        revision: 3,
        seen_revision: 3,
        changed_at: Utc::now(),
    };
    assert!(!pane.has_unread());
    pane.revision = 4;
    assert!(pane.has_unread());
}

#[parameterized(
    timeline = { "timeline", Some(StorageResource::Timeline) },
    activity = { "activity_log", Some(StorageResource::ActivityLog) },
    guardrail = { "guardrail_log", Some(StorageResource::GuardrailLog) },
    recovery = { "recovery_log", Some(StorageResource::RecoveryLog) },
    unknown = { "wal", None },
)]
fn storage_resource_parse(input: &str, expected: Option<StorageResource>) {
    assert_eq!(StorageResource::parse(input), expected);
}

#[test]
fn storage_resource_round_trip() {
    for resource in StorageResource::all() {
        assert_eq!(StorageResource::parse(resource.as_str()), Some(resource));
    }
}

#[test]
fn seen_scope_parse() {
    assert_eq!(SeenScope::parse("pane"), Some(SeenScope::Pane));
    assert_eq!(SeenScope::parse("window"), Some(SeenScope::Window));
    assert_eq!(SeenScope::parse("session"), Some(SeenScope::Session));
    assert_eq!(SeenScope::parse("all"), None);
}

#[test]
fn journal_entry_serializes_camel_case() {
    let entry = JournalEntry {
        global_rev: 9,
        entity: EntityType::Pane,
        session: "dev".to_string(),
        window_index: Some(1),
        pane_id: Some("%4".to_string()),
        change: ChangeKind::Seen,
        changed_at: Utc::now(),
    };
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["globalRev"], 9);
    assert_eq!(json["entity"], "pane");
    assert_eq!(json["change"], "seen");
    assert_eq!(json["paneId"], "%4");
}
