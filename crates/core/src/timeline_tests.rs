// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;

fn sample() -> TimelineEvent {
    TimelineEvent {
        id: "t-1".to_string(),
        source: EventSource::Service,
        event_type: "service.action".to_string(),
        severity: Severity::Info,
        resource: "nginx".to_string(),
        message: "restart requested".to_string(),
        details: None,
        metadata: Map::new(),
        created_at: Utc::now(),
    }
}

#[test]
fn severity_ordering() {
    assert!(Severity::Info < Severity::Warn);
    assert!(Severity::Warn < Severity::Error);
}

#[test]
fn severity_parse_round_trip() {
    for s in [Severity::Info, Severity::Warn, Severity::Error] {
        assert_eq!(Severity::parse(s.as_str()), Some(s));
    }
    assert_eq!(Severity::parse("fatal"), None);
}

#[test]
fn source_parse_round_trip() {
    for s in [
        EventSource::Service,
        EventSource::Alert,
        EventSource::Runbook,
        EventSource::Config,
    ] {
        assert_eq!(EventSource::parse(s.as_str()), Some(s));
    }
    assert_eq!(EventSource::parse("ui"), None);
}

#[test]
fn matches_query_is_case_insensitive() {
    let event = sample();
    assert!(event.matches_query(""));
    assert!(event.matches_query("RESTART"));
    assert!(event.matches_query("nginx"));
    assert!(event.matches_query("service.action"));
    assert!(!event.matches_query("postgres"));
}

#[test]
fn timeline_event_serializes_camel_case() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["eventType"], "service.action");
    assert_eq!(json["severity"], "info");
    assert!(json.get("details").is_none());
}
