// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn step(title: &str, command: &str) -> RunbookStep {
    RunbookStep {
        kind: StepKind::Command,
        title: title.to_string(),
        command: command.to_string(),
    }
}

#[test]
fn validate_accepts_well_formed_steps() {
    let steps = vec![step("check disk", "df -h"), step("sync", "sync")];
    assert!(Runbook::validate("maintenance", &steps).is_ok());
}

#[test]
fn validate_rejects_empty_name() {
    assert_eq!(
        Runbook::validate("  ", &[step("a", "b")]),
        Err(RunbookDefError::EmptyName)
    );
}

#[test]
fn validate_rejects_no_steps() {
    assert_eq!(Runbook::validate("x", &[]), Err(RunbookDefError::NoSteps));
}

#[test]
fn validate_rejects_blank_title_and_command() {
    assert_eq!(
        Runbook::validate("x", &[step("", "ls")]),
        Err(RunbookDefError::EmptyStepTitle(0))
    );
    assert_eq!(
        Runbook::validate("x", &[step("ok", "ls"), step("bad", " ")]),
        Err(RunbookDefError::EmptyStepCommand(1))
    );
}

#[test]
fn step_serializes_type_tag() {
    let json = serde_json::to_value(step("t", "echo hi")).unwrap();
    assert_eq!(json["type"], "command");
    assert_eq!(json["title"], "t");
}
