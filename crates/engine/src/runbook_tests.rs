// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::fake::FakeExecutor;
use chrono::TimeZone;
use sentinel_core::StepKind;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).single().unwrap()
}

fn step(title: &str) -> RunbookStep {
    RunbookStep {
        kind: StepKind::Command,
        title: title.to_string(),
        command: format!("echo {title}"),
    }
}

struct Setup {
    _dir: tempfile::TempDir,
    engine: RunbookEngine,
    executor: FakeExecutor,
    store: Store,
}

fn setup() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let hub = Hub::new();
    let orchestrator = Orchestrator::new(store.clone(), hub.clone());
    let executor = FakeExecutor::new();
    let engine = RunbookEngine::new(
        store.clone(),
        hub,
        orchestrator,
        Arc::new(executor.clone()),
    );
    Setup {
        _dir: dir,
        engine,
        executor,
        store,
    }
}

fn params(run: RunbookRun, steps: Vec<RunbookStep>) -> RunParams {
    RunParams {
        run,
        steps,
        step_timeout: Duration::from_secs(5),
        extra_metadata: Map::new(),
    }
}

#[test]
fn create_runbook_validates_steps() {
    let s = setup();
    let err = s
        .engine
        .create_runbook("deploy", "", vec![], true, at())
        .unwrap_err();
    assert!(matches!(err, RunbookError::Def(RunbookDefError::NoSteps)));

    let runbook = s
        .engine
        .create_runbook("deploy", "ship it", vec![step("a")], true, at())
        .unwrap();
    assert_eq!(s.engine.list_runbooks().len(), 1);
    assert_eq!(runbook.name, "deploy");
}

#[test]
fn update_runbook_preserves_created_at() {
    let s = setup();
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("a")], true, at())
        .unwrap();
    let later = at() + chrono::Duration::hours(1);
    let updated = s
        .engine
        .update_runbook(&runbook.id, "deploy-2", "", vec![step("b")], false, later)
        .unwrap();
    assert_eq!(updated.created_at, runbook.created_at);
    assert_eq!(updated.updated_at, later);
    assert_eq!(updated.name, "deploy-2");
    assert!(!updated.enabled);
}

#[test]
fn create_run_refuses_disabled_runbook() {
    let s = setup();
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("a")], false, at())
        .unwrap();
    let err = s.engine.create_run(&runbook.id, "manual", at()).unwrap_err();
    assert!(matches!(err, RunbookError::Disabled(_)));
}

#[tokio::test]
async fn successful_run_walks_all_steps() {
    let s = setup();
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("a"), step("b")], true, at())
        .unwrap();
    let (run, steps) = s.engine.create_run(&runbook.id, "manual", at()).unwrap();
    assert_eq!(run.status, RunStatus::Queued);

    let finished = s
        .engine
        .run(params(run, steps), CancellationToken::new())
        .await;

    assert_eq!(finished.status, RunStatus::Succeeded);
    assert!(finished.finished_at.is_some());
    assert!(finished.error.is_none());
    assert_eq!(finished.step_index, 2);
    assert_eq!(
        finished.step_statuses,
        vec![StepState::Succeeded, StepState::Succeeded]
    );
    assert_eq!(s.executor.executed(), vec!["a", "b"]);

    // Persisted row matches the returned one.
    let row = s.store.get_run(finished.id.as_str()).unwrap();
    assert_eq!(row.status, RunStatus::Succeeded);
}

#[tokio::test]
async fn failed_step_stops_the_run() {
    let s = setup();
    s.executor.fail_step("b", "disk full");
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("a"), step("b"), step("c")], true, at())
        .unwrap();
    let (run, steps) = s.engine.create_run(&runbook.id, "manual", at()).unwrap();

    let finished = s
        .engine
        .run(params(run, steps), CancellationToken::new())
        .await;

    assert_eq!(finished.status, RunStatus::Failed);
    assert!(finished.error.as_deref().unwrap().contains("disk full"));
    assert_eq!(
        finished.step_statuses,
        vec![StepState::Succeeded, StepState::Failed, StepState::Pending]
    );
    // Step c never executed.
    assert_eq!(s.executor.executed(), vec!["a", "b"]);
    assert!(finished.finished_at.is_some());
}

#[tokio::test]
async fn cancellation_yields_cancelled_not_failed() {
    let s = setup();
    s.executor.delay_step("slow", Duration::from_secs(1));
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("slow"), step("after")], true, at())
        .unwrap();
    let (run, steps) = s.engine.create_run(&runbook.id, "manual", at()).unwrap();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_clone.cancel();
    });

    let finished = s.engine.run(params(run, steps), cancel).await;

    assert_eq!(finished.status, RunStatus::Cancelled);
    assert_eq!(finished.step_statuses[0], StepState::Cancelled);
    assert_eq!(finished.step_statuses[1], StepState::Pending);
    assert!(finished.finished_at.is_some());
    assert!(finished.error.is_none());
}

#[tokio::test]
async fn already_cancelled_context_cancels_before_first_step() {
    let s = setup();
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("a")], true, at())
        .unwrap();
    let (run, steps) = s.engine.create_run(&runbook.id, "manual", at()).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let finished = s.engine.run(params(run, steps), cancel).await;

    assert_eq!(finished.status, RunStatus::Cancelled);
    assert!(s.executor.executed().is_empty());
}

#[tokio::test]
async fn timeout_fails_the_run() {
    let s = setup();
    s.executor.delay_step("slow", Duration::from_secs(10));
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("slow")], true, at())
        .unwrap();
    let (run, steps) = s.engine.create_run(&runbook.id, "manual", at()).unwrap();

    let finished = s
        .engine
        .run(
            RunParams {
                run,
                steps,
                step_timeout: Duration::from_millis(50),
                extra_metadata: Map::new(),
            },
            CancellationToken::new(),
        )
        .await;

    assert_eq!(finished.status, RunStatus::Failed);
    assert!(finished.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn terminal_run_appends_timeline_and_updates_schedule() {
    let s = setup();
    let runbook = s
        .engine
        .create_runbook("deploy", "", vec![step("a")], true, at())
        .unwrap();

    // A schedule owning the run via metadata.
    let schedule = sentinel_core::Schedule {
        id: sentinel_core::ScheduleId::new("s-1"),
        runbook_id: runbook.id.clone(),
        name: "hourly".to_string(),
        kind: sentinel_core::ScheduleKind::Cron,
        cron_expr: Some("0 * * * *".to_string()),
        timezone: Some("UTC".to_string()),
        run_at: None,
        enabled: true,
        next_run_at: None,
        last_run_at: None,
        last_run_status: sentinel_core::LastRunStatus::Running,
        created_at: at(),
        updated_at: at(),
    };
    s.store.upsert_schedule(schedule).unwrap();

    let (run, steps) = s.engine.create_run(&runbook.id, "schedule", at()).unwrap();
    let mut extra = Map::new();
    extra.insert("scheduleId".to_string(), Value::from("s-1"));

    s.engine
        .run(
            RunParams {
                run,
                steps,
                step_timeout: Duration::from_secs(5),
                extra_metadata: extra,
            },
            CancellationToken::new(),
        )
        .await;

    let schedule = s.store.get_schedule("s-1").unwrap();
    assert_eq!(schedule.last_run_status, LastRunStatus::Succeeded);

    let timeline = s
        .store
        .search_timeline(&sentinel_store::TimelineFilter::default(), 10);
    let types: Vec<&str> = timeline.iter().map(|t| t.event_type.as_str()).collect();
    assert!(types.contains(&"runbook.started"));
    assert!(types.contains(&"runbook.finished"));
}

#[tokio::test]
async fn job_events_are_published_through_the_hub() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let hub = Hub::new();
    let (mut rx, _sub) = hub.subscribe(64);
    let orchestrator = Orchestrator::new(store.clone(), hub.clone());
    let engine = RunbookEngine::new(
        store,
        hub,
        orchestrator,
        Arc::new(FakeExecutor::new()),
    );

    let runbook = engine
        .create_runbook("deploy", "", vec![step("a")], true, at())
        .unwrap();
    let (run, steps) = engine.create_run(&runbook.id, "manual", at()).unwrap();
    engine.run(params(run, steps), CancellationToken::new()).await;

    let mut statuses = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if event.kind == EventKind::OpsJob {
            statuses.push(
                event.payload["status"].as_str().unwrap_or("").to_string(),
            );
        }
    }
    assert_eq!(statuses.first().map(String::as_str), Some("queued"));
    assert!(statuses.contains(&"running".to_string()));
    assert_eq!(statuses.last().map(String::as_str), Some("succeeded"));
}
