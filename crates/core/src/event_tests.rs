// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn event_kind_wire_names() {
    assert_eq!(EventKind::TmuxSessions.as_str(), "tmux.sessions");
    assert_eq!(EventKind::OpsJob.as_str(), "ops.job");
    assert_eq!(EventKind::ScheduleUpdated.to_string(), "schedule.updated");
}

#[test]
fn event_serializes_with_type_tag() {
    let event = Event::with_rev(EventKind::OpsServices, 7).field("service", "nginx");
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "ops.services");
    assert_eq!(json["payload"]["globalRev"], 7);
    assert_eq!(json["payload"]["service"], "nginx");
}

#[test]
fn event_round_trips() {
    let event = Event::with_rev(EventKind::TmuxInspector, 42);
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
    assert_eq!(back.global_rev(), Some(42));
}

#[test]
fn global_rev_absent_on_empty_payload() {
    assert_eq!(Event::new(EventKind::OpsOverview).global_rev(), None);
}
