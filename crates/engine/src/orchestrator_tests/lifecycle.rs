// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::hook::HookCall;
use atlas_adapters::NotifyEvent;
use std::sync::atomic::Ordering;

fn impl_validate_template() -> Template {
    template(
        "fix",
        vec![step("implement", StepKind::Ai), step("validate", StepKind::Validation)],
    )
}

#[tokio::test]
async fn happy_path_runs_to_awaiting_approval() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = impl_validate_template();

    let task = fx
        .orchestrator
        .start("ws", "main", &tpl, "fix bug", &fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(task.step_results.len(), 2);
    assert!(task
        .step_results
        .iter()
        .all(|r| r.status == StepResultStatus::Success));
    assert!(task
        .steps
        .iter()
        .all(|s| s.status == StepExecStatus::Completed));
    assert_eq!(task.metadata.str_value("branch"), Some("main"));

    // Transition chain: pending → running → validating → awaiting_approval.
    let chain: Vec<_> = task.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        chain,
        vec![
            TaskStatus::Running,
            TaskStatus::Validating,
            TaskStatus::AwaitingApproval
        ]
    );

    // Persisted state matches the returned task.
    assert_eq!(reload(&fx, &task).status, TaskStatus::AwaitingApproval);

    // Metrics and hooks observed the run.
    assert_eq!(fx.metrics.tasks_started.load(Ordering::SeqCst), 1);
    assert_eq!(fx.metrics.steps_executed.load(Ordering::SeqCst), 2);
    assert!(fx.metrics.loop_iterations.load(Ordering::SeqCst) >= 2);
    let calls = fx.hook.calls();
    assert!(calls.contains(&HookCall::TransitionStep {
        step: "implement".to_string(),
        index: 0
    }));
    assert!(calls.contains(&HookCall::CompleteStep {
        step: "validate".to_string(),
        files_changed: 0
    }));
    assert!(calls.contains(&HookCall::CompleteTask));

    // One attention notification for the approval gate.
    assert_eq!(fx.notifier.events(), vec![NotifyEvent::AwaitingApproval]);
}

#[tokio::test]
async fn empty_template_goes_straight_to_approval() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("empty", vec![]);

    let task = fx
        .orchestrator
        .start("ws", "main", &tpl, "", &fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert!(task.step_results.is_empty());
    let chain: Vec<_> = task.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        chain,
        vec![
            TaskStatus::Running,
            TaskStatus::Validating,
            TaskStatus::AwaitingApproval
        ]
    );
}

#[tokio::test]
async fn no_changes_skips_push_and_pr_steps() {
    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(SuccessExecutor::new(StepKind::Ai)));
    registry.register(Arc::new(SuccessExecutor::new(StepKind::Ci)));
    let git = ScriptedExecutor::new(StepKind::Git);
    git.push_status(StepResultStatus::NoChanges);
    registry.register(Arc::new(git.clone()));

    let (_dir, fx) = fixture(registry);
    let tpl = template(
        "ship",
        vec![
            step("implement", StepKind::Ai),
            git_step("commit", "commit"),
            git_step("push", "push"),
            git_step("pr", "create_pr"),
            step("ci", StepKind::Ci),
        ],
    );

    let task = fx
        .orchestrator
        .start("ws", "main", &tpl, "fix bug", &fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert!(task.metadata.flag("skip_git_steps"));

    let statuses: Vec<_> = task.step_results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            StepResultStatus::Success,
            StepResultStatus::NoChanges,
            StepResultStatus::Skipped,
            StepResultStatus::Skipped,
            StepResultStatus::Success,
        ]
    );
    // The git executor only ever saw the commit step.
    assert_eq!(git.executed(), vec!["commit".to_string()]);
}

#[tokio::test]
async fn generic_failure_lands_in_kind_mapped_state() {
    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(SuccessExecutor::new(StepKind::Ai)));
    registry.register(Arc::new(FailingExecutor::new(
        StepKind::Validation,
        "lint exploded",
    )));

    let (_dir, fx) = fixture(registry);
    let tpl = impl_validate_template();

    let err = fx
        .orchestrator
        .start("ws", "main", &tpl, "fix bug", &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StepFailed { .. }));

    let tasks = fx.orchestrator.store().list("ws", &fx.cancel).unwrap();
    let task = &tasks[0];
    assert_eq!(task.status, TaskStatus::ValidationFailed);
    // validation_failed is only reachable through validating.
    let chain: Vec<_> = task.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        chain,
        vec![
            TaskStatus::Running,
            TaskStatus::Validating,
            TaskStatus::ValidationFailed
        ]
    );
    assert!(task
        .metadata
        .str_value("last_error")
        .unwrap()
        .contains("lint exploded"));
    assert!(task.metadata.str_value("retry_context").is_some());

    assert!(fx
        .hook
        .calls()
        .iter()
        .any(|c| matches!(c, HookCall::FailStep { step, .. } if step == "validate")));
}

#[tokio::test]
async fn executor_cancellation_interrupts_the_task() {
    let mut registry = ExecutorRegistry::new();
    let ai = ScriptedExecutor::new(StepKind::Ai);
    ai.push(ScriptedOutcome::Cancelled);
    registry.register(Arc::new(ai));

    let (_dir, fx) = fixture(registry);
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);

    let err = fx
        .orchestrator
        .start("ws", "main", &tpl, "", &fx.cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());

    let tasks = fx.orchestrator.store().list("ws", &fx.cancel).unwrap();
    assert_eq!(tasks[0].status, TaskStatus::Interrupted);
    assert!(fx
        .hook
        .calls()
        .iter()
        .any(|c| matches!(c, HookCall::InterruptStep { step } if step == "implement")));
}

#[tokio::test]
async fn abandon_requires_force_while_running() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = impl_validate_template();
    let mut task = started_task(&fx, &tpl);

    let err = fx
        .orchestrator
        .abandon(&mut task, "user", false, &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
    assert_eq!(task.status, TaskStatus::Running);

    fx.orchestrator
        .abandon(&mut task, "user", true, &fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Abandoned);
    assert!(task.completed_at.is_some());
    assert_eq!(task.transitions.last().unwrap().reason.as_deref(), Some("user"));
    assert!(fx
        .hook
        .calls()
        .iter()
        .any(|c| matches!(c, HookCall::FailTask { .. })));
}

#[tokio::test]
async fn abandon_preserves_task_directory() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = impl_validate_template();
    let mut task = started_task(&fx, &tpl);

    fx.orchestrator
        .store()
        .save_artifact(&task.workspace, &task.id, "notes.md", b"keep me", &fx.cancel)
        .unwrap();
    fx.orchestrator
        .abandon(&mut task, "user", true, &fx.cancel)
        .await
        .unwrap();

    let artifact = fx
        .orchestrator
        .store()
        .get_artifact(&task.workspace, &task.id, "notes.md")
        .unwrap();
    assert_eq!(artifact, b"keep me");
    assert_eq!(reload(&fx, &task).status, TaskStatus::Abandoned);
}

#[tokio::test]
async fn approve_and_reject_close_the_gate() {
    let (_dir, fx) = fixture(all_success_registry());
    let tpl = template("empty", vec![]);

    let mut approved = fx
        .orchestrator
        .start("ws", "main", &tpl, "", &fx.cancel)
        .await
        .unwrap();
    fx.orchestrator.approve(&mut approved, &fx.cancel).await.unwrap();
    assert_eq!(approved.status, TaskStatus::Completed);
    assert!(approved.completed_at.is_some());

    let mut rejected = fx
        .orchestrator
        .start("ws", "main", &tpl, "", &fx.cancel)
        .await
        .unwrap();
    fx.orchestrator
        .reject(&mut rejected, "not good enough", &fx.cancel)
        .await
        .unwrap();
    assert_eq!(rejected.status, TaskStatus::Rejected);
    assert_eq!(
        rejected.transitions.last().unwrap().reason.as_deref(),
        Some("not good enough")
    );
}

#[tokio::test]
async fn human_gate_pauses_the_loop() {
    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(SuccessExecutor::new(StepKind::Ai)));
    let human = ScriptedExecutor::new(StepKind::Human);
    human.push_status(StepResultStatus::AwaitingApproval);
    registry.register(Arc::new(human));

    let (_dir, fx) = fixture(registry);
    let tpl = template(
        "t",
        vec![step("implement", StepKind::Ai), step("review", StepKind::Human)],
    );

    let task = fx
        .orchestrator
        .start("ws", "main", &tpl, "", &fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    // Paused at the human step, not past it.
    assert_eq!(task.current_step, 1);
    assert_eq!(fx.notifier.events(), vec![NotifyEvent::AwaitingApproval]);
}

#[tokio::test]
async fn start_checks_cancellation_at_entry() {
    let (_dir, fx) = fixture(all_success_registry());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = fx
        .orchestrator
        .start("ws", "main", &impl_validate_template(), "", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert!(fx.orchestrator.store().list("ws", &fx.cancel).unwrap().is_empty());
}
