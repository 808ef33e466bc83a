// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn git_template() -> Template {
    template("t", vec![git_step("push", "push")])
}

#[tokio::test]
async fn success_and_skipped_results_are_noops() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = git_template();
    let mut task = started_task(&fx, &tpl);

    for status in [StepResultStatus::Success, StepResultStatus::Skipped] {
        fx.orchestrator
            .handle_step_result(&mut task, &result_with(status), &tpl.steps[0], &fx.cancel)
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert!(task.metadata.is_empty());
    }
}

#[tokio::test]
async fn no_changes_sets_the_git_skip_flag() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = git_template();
    let mut task = started_task(&fx, &tpl);

    fx.orchestrator
        .handle_step_result(
            &mut task,
            &result_with(StepResultStatus::NoChanges),
            &tpl.steps[0],
            &fx.cancel,
        )
        .await
        .unwrap();

    assert!(task.metadata.flag("skip_git_steps"));
    assert_eq!(task.status, TaskStatus::Running);
}

#[tokio::test]
async fn awaiting_approval_passes_through_validating() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("review", StepKind::Human)]);
    let mut task = started_task(&fx, &tpl);

    fx.orchestrator
        .handle_step_result(
            &mut task,
            &result_with(StepResultStatus::AwaitingApproval),
            &tpl.steps[0],
            &fx.cancel,
        )
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    let tail: Vec<_> = task.transitions.iter().rev().take(2).map(|t| t.to).collect();
    assert_eq!(tail, vec![TaskStatus::AwaitingApproval, TaskStatus::Validating]);
}

#[tokio::test]
async fn unclassified_failure_uses_the_kind_mapping() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = git_template();
    let mut task = started_task(&fx, &tpl);

    let mut failed = result_with(StepResultStatus::Failed);
    failed.error = Some("remote rejected".to_string());

    let err = fx
        .orchestrator
        .handle_step_result(&mut task, &failed, &tpl.steps[0], &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StepFailed { .. }));

    assert_eq!(task.status, TaskStatus::GhFailed);
    assert_eq!(task.metadata.str_value("last_error"), Some("remote rejected"));
    assert!(task.metadata.str_value("retry_context").is_some());
    assert_eq!(reload(&fx, &task).status, TaskStatus::GhFailed);
}

#[tokio::test]
async fn unknown_result_status_is_rejected() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = git_template();
    let mut task = started_task(&fx, &tpl);

    let err = fx
        .orchestrator
        .handle_step_result(
            &mut task,
            &result_with(StepResultStatus::Unknown),
            &tpl.steps[0],
            &fx.cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownStepResultStatus { .. }));
    assert_eq!(task.status, TaskStatus::Running);
}

#[tokio::test]
async fn execute_step_reports_missing_executor() {
    let (_dir, fx) = fixture(ExecutorRegistry::new());
    let tpl = git_template();
    let mut task = started_task(&fx, &tpl);

    let err = fx
        .orchestrator
        .execute_step(&mut task, &tpl.steps[0], &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExecutorNotFound(StepKind::Git)));
}

#[tokio::test]
async fn execute_step_fills_bookkeeping_fields() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = started_task(&fx, &tpl);

    fx.clock.advance(chrono::Duration::seconds(1));
    let result = fx
        .orchestrator
        .execute_step(&mut task, &tpl.steps[0], &fx.cancel)
        .await
        .unwrap();

    assert_eq!(result.step_index, 0);
    assert_eq!(result.name, "implement");
    assert_eq!(result.started_at, fx.clock.now());
    assert_eq!(task.steps[0].attempts, 1);
    assert_eq!(task.steps[0].status, StepExecStatus::Completed);
    assert_eq!(task.step_results.len(), 1);
}

#[tokio::test]
async fn execute_step_survives_out_of_range_current_step() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = started_task(&fx, &tpl);
    task.current_step = 99;

    // Guarded mutations: no panic, the step records stay untouched.
    let result = fx
        .orchestrator
        .execute_step(&mut task, &tpl.steps[0], &fx.cancel)
        .await
        .unwrap();
    assert_eq!(result.step_index, 99);
    assert_eq!(task.steps[0].attempts, 0);
}

#[tokio::test]
async fn hook_failures_never_surface() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = atlas_storage::TaskStore::with_clock(dir.path(), clock.clone());
    let orchestrator = OrchestratorBuilder::with_clock(
        store,
        Arc::new(all_success_registry()),
        clock.clone(),
    )
    .hook(Arc::new(crate::FakeHook::failing()))
    .build();

    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let cancel = CancellationToken::new();
    let task = orchestrator
        .start("ws", "main", &tpl, "", &cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::AwaitingApproval);
}
