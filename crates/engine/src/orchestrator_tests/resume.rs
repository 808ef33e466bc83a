// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn resume_rejects_terminal_tasks() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = started_task(&fx, &tpl);
    fx.orchestrator
        .abandon(&mut task, "user", true, &fx.cancel)
        .await
        .unwrap();

    let err = fx
        .orchestrator
        .resume(&mut task, &tpl, &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
}

#[tokio::test]
async fn resume_heals_an_error_task() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template(
        "t",
        vec![step("implement", StepKind::Ai), step("validate", StepKind::Validation)],
    );
    let mut task = started_task(&fx, &tpl);

    // Fail at the first step and land in an error state.
    fx.orchestrator
        .transition(&mut task, TaskStatus::GhFailed, None)
        .unwrap();
    fx.orchestrator.checkpoint(&mut task, &fx.cancel).unwrap();

    fx.orchestrator.resume(&mut task, &tpl, &fx.cancel).await.unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    // The healing edge comes first.
    let healing = task
        .transitions
        .iter()
        .find(|t| t.from == TaskStatus::GhFailed)
        .unwrap();
    assert_eq!(healing.to, TaskStatus::Running);
    assert_eq!(task.step_results.len(), 2);
}

#[tokio::test]
async fn resume_running_task_enters_loop_without_transition() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = started_task(&fx, &tpl);
    let transitions_before = task.transitions.len();

    fx.orchestrator.resume(&mut task, &tpl, &fx.cancel).await.unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    // No healing edge was inserted; the next transition is validating.
    assert_eq!(task.transitions[transitions_before].to, TaskStatus::Validating);
}

#[tokio::test]
async fn resume_pending_task_starts_it() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = atlas_core::test_support::task(&tpl, &fx.clock);
    fx.orchestrator.store().create("ws", &task, &fx.cancel).unwrap();

    fx.orchestrator.resume(&mut task, &tpl, &fx.cancel).await.unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(task.transitions[0].from, TaskStatus::Pending);
}

#[tokio::test]
async fn resume_validating_heals_through_interrupted() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = started_task(&fx, &tpl);
    task.current_step = 1; // crashed mid-completion
    fx.orchestrator
        .transition(&mut task, TaskStatus::Validating, None)
        .unwrap();
    fx.orchestrator.checkpoint(&mut task, &fx.cancel).unwrap();

    fx.orchestrator.resume(&mut task, &tpl, &fx.cancel).await.unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    let chain: Vec<_> = task.transitions.iter().map(|t| t.to).collect();
    assert!(chain
        .windows(2)
        .any(|w| w == [TaskStatus::Interrupted, TaskStatus::Running]));
}

#[tokio::test]
async fn resume_approval_walks_past_optional_steps() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template(
        "t",
        vec![
            step("implement", StepKind::Ai),
            optional_step("cleanup", StepKind::Git),
        ],
    );
    let mut task = started_task(&fx, &tpl);

    // Simulate a pause at the optional tail in awaiting_approval.
    task.current_step = 1;
    fx.orchestrator
        .transition(&mut task, TaskStatus::Validating, None)
        .unwrap();
    fx.orchestrator
        .transition(&mut task, TaskStatus::AwaitingApproval, None)
        .unwrap();
    fx.orchestrator.checkpoint(&mut task, &fx.cancel).unwrap();

    fx.orchestrator.resume(&mut task, &tpl, &fx.cancel).await.unwrap();

    // Walked past the skippable step and re-entered the approval gate.
    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(task.current_step, 2);
    assert_eq!(
        task.step_results.last().unwrap().status,
        StepResultStatus::Skipped
    );
}

#[tokio::test]
async fn resume_checks_cancellation_at_entry() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = started_task(&fx, &tpl);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = fx
        .orchestrator
        .resume(&mut task, &tpl, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
}
