// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn parse_sessions_splits_fields() {
    let stdout = "dev\t1\t3\t1700000000\nops\t0\t1\t1700000100\n";
    let sessions = parse_sessions(stdout);
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].name, "dev");
    assert_eq!(sessions[0].attached, 1);
    assert_eq!(sessions[0].windows, 3);
    assert!(sessions[0].created_at.is_some());
    assert_eq!(sessions[1].name, "ops");
    assert_eq!(sessions[1].attached, 0);
}

#[test]
fn parse_sessions_skips_malformed_lines() {
    let stdout = "dev\t1\t3\t1700000000\n\ngarbage-without-tabs\n";
    let sessions = parse_sessions(stdout);
    assert_eq!(sessions.len(), 1);
}

#[test]
fn parse_windows_reads_flags_and_layout() {
    let stdout = "0\tshell\t1\ttiled\t1700000000\t2\n1\teditor\t0\teven-horizontal\t\t1\n";
    let windows = parse_windows("dev", stdout);
    assert_eq!(windows.len(), 2);
    assert!(windows[0].active);
    assert_eq!(windows[0].layout, "tiled");
    assert_eq!(windows[0].panes, 2);
    assert!(!windows[1].active);
    assert!(windows[1].activity_at.is_none());
}

#[test]
fn parse_panes_requires_percent_ids() {
    let stdout = "%5\t0\t0\tvim\t1\t/dev/ttys003\t/home/op\tzsh\tvim\nbogus\t0\t1\tx\t0\tt\tp\tc\tc\n";
    let panes = parse_panes("dev", stdout);
    assert_eq!(panes.len(), 1);
    let pane = &panes[0];
    assert_eq!(pane.pane_id, "%5");
    assert_eq!(pane.session, "dev");
    assert_eq!(pane.current_command, "vim");
    assert!(pane.active);
}

#[parameterized(
    no_server = { "no server running on /tmp/tmux-501/default", MuxErrorKind::ServerNotRunning },
    connect = { "error connecting to /private/tmp/tmux-501/default (No such file or directory)", MuxErrorKind::ServerNotRunning },
    duplicate = { "duplicate session: dev", MuxErrorKind::SessionExists },
    missing = { "can't find session: dev", MuxErrorKind::SessionNotFound },
    missing_window = { "can't find window: 7", MuxErrorKind::NotFound },
    other = { "invalid option -z", MuxErrorKind::CommandFailed },
)]
fn classify_failure_kinds(stderr: &str, kind: MuxErrorKind) {
    assert_eq!(classify_failure(stderr).kind(), kind);
}

#[test]
fn classify_failure_extracts_session_name() {
    match classify_failure("duplicate session: dev") {
        MuxError::SessionExists(name) => assert_eq!(name, "dev"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn error_codes_are_contract_stable() {
    assert_eq!(MuxError::ServerNotRunning.code(), "SERVER_NOT_RUNNING");
    assert_eq!(
        MuxError::SessionNotFound("x".to_string()).code(),
        "SESSION_NOT_FOUND"
    );
    assert_eq!(
        MuxError::SessionExists("x".to_string()).code(),
        "SESSION_EXISTS"
    );
    assert_eq!(MuxError::NotFound("x".to_string()).code(), "NOT_FOUND");
    assert_eq!(
        MuxError::CommandFailed("x".to_string()).code(),
        "COMMAND_FAILED"
    );
}
