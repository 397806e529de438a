// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn schedule_serializes_kind_as_schedule_type() {
    let schedule = Schedule {
        id: ScheduleId::new("s-1"),
        runbook_id: RunbookId::new("rb-1"),
        name: "hourly".to_string(),
        kind: ScheduleKind::Cron,
        cron_expr: Some("0 * * * *".to_string()),
        timezone: Some("UTC".to_string()),
        run_at: None,
        enabled: true,
        next_run_at: None,
        last_run_at: None,
        last_run_status: LastRunStatus::None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let json = serde_json::to_value(&schedule).unwrap();
    assert_eq!(json["scheduleType"], "cron");
    assert_eq!(json["cronExpr"], "0 * * * *");
    assert_eq!(json["lastRunStatus"], "none");
    assert!(json.get("runAt").is_none());
}

#[test]
fn schedule_round_trips() {
    let schedule = Schedule {
        id: ScheduleId::new("s-2"),
        runbook_id: RunbookId::new("rb-1"),
        name: "one-shot".to_string(),
        kind: ScheduleKind::Once,
        cron_expr: None,
        timezone: None,
        run_at: Some(Utc::now()),
        enabled: true,
        next_run_at: Some(Utc::now()),
        last_run_at: None,
        last_run_status: LastRunStatus::None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let json = serde_json::to_string(&schedule).unwrap();
    let back: Schedule = serde_json::from_str(&json).unwrap();
    assert_eq!(back, schedule);
}
