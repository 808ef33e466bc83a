// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{all_success_registry, engine_fixture, engine_fixture_with_config, EngineFixture};
use crate::OrchestratorConfig;
use atlas_adapters::ForgeCall;
use atlas_core::test_support::{ci_failure, step, task as build_task, template};
use atlas_core::Template;

fn implement_template() -> Template {
    template(
        "t",
        vec![
            step("implement", StepKind::Ai),
            step("push", StepKind::Git),
            step("ci", StepKind::Ci),
        ],
    )
}

/// A task parked in the given error status at the CI step.
fn parked_task(fx: &EngineFixture, status: TaskStatus) -> Task {
    let tpl = implement_template();
    let mut task = build_task(&tpl, &fx.clock);
    fx.orchestrator.store().create("ws", &task, &fx.cancel).unwrap();
    fx.orchestrator
        .transition(&mut task, TaskStatus::Running, None)
        .unwrap();
    task.current_step = 2;
    task.metadata.set_str(keys::LAST_ERROR, "2 checks failed");
    fx.orchestrator.transition(&mut task, status, None).unwrap();
    fx.orchestrator.checkpoint(&mut task, &fx.cancel).unwrap();
    task
}

fn fixture() -> (tempfile::TempDir, EngineFixture) {
    let dir = tempfile::tempdir().unwrap();
    let fx = engine_fixture(dir.path(), all_success_registry());
    (dir, fx)
}

#[yare::parameterized(
    view_logs       = { "view_logs", Some(CiFailureAction::ViewLogs) },
    retry_implement = { "retry_implement", Some(CiFailureAction::RetryImplement) },
    fix_manually    = { "fix_manually", Some(CiFailureAction::FixManually) },
    abandon         = { "abandon", Some(CiFailureAction::Abandon) },
    unknown         = { "panic", None },
)]
fn ci_action_parsing(name: &str, expected: Option<CiFailureAction>) {
    assert_eq!(name.parse::<CiFailureAction>().ok(), expected);
}

#[test]
fn menus_match_the_error_statuses() {
    assert_eq!(
        action_menu(TaskStatus::CiFailed),
        ["view_logs", "retry_implement", "fix_manually", "abandon"]
    );
    assert_eq!(action_menu(TaskStatus::GhFailed), ["retry", "fix_and_retry", "abandon"]);
    assert_eq!(
        action_menu(TaskStatus::CiTimeout),
        ["continue_waiting", "retry", "fix_manually", "abandon"]
    );
    assert!(action_menu(TaskStatus::Running).is_empty());
    assert!(action_menu(TaskStatus::ValidationFailed).is_empty());
}

#[tokio::test]
async fn view_logs_opens_the_best_check_url() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);
    task.metadata
        .set_json(keys::CI_FAILURE_RESULT, &ci_failure("https://ci.example/run/1"))
        .unwrap();

    fx.orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::ViewLogs, &fx.cancel)
        .await
        .unwrap();

    assert_eq!(fx.browser.opened(), vec!["https://ci.example/run/1".to_string()]);
    assert_eq!(task.status, TaskStatus::CiFailed);
}

#[tokio::test]
async fn view_logs_without_stored_result_is_empty_value() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);

    let err = fx
        .orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::ViewLogs, &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyValue(_)));
    assert!(fx.browser.opened().is_empty());
}

#[tokio::test]
async fn view_logs_without_any_url_is_empty_value() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);
    task.metadata
        .set_json(keys::CI_FAILURE_RESULT, &ci_failure(""))
        .unwrap();

    let err = fx
        .orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::ViewLogs, &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyValue(_)));
}

#[tokio::test]
async fn retry_implement_rewinds_to_the_implement_step() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);

    fx.orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::RetryImplement, &fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.current_step, 0);
    assert_eq!(task.status, TaskStatus::Running);
    assert!(task.metadata.str_value(keys::RETRY_CONTEXT).is_some());

    let reloaded = fx
        .orchestrator
        .store()
        .get("ws", &task.id, &fx.cancel)
        .unwrap();
    assert_eq!(reloaded.current_step, 0);
    assert_eq!(reloaded.status, TaskStatus::Running);
}

#[tokio::test]
async fn retry_falls_back_to_the_first_ai_step() {
    let dir = tempfile::tempdir().unwrap();
    let fx = engine_fixture(dir.path(), all_success_registry());
    let tpl = template(
        "t",
        vec![
            step("plan", StepKind::Sdd),
            step("write_code", StepKind::Ai),
            step("ci", StepKind::Ci),
        ],
    );
    let mut task = build_task(&tpl, &fx.clock);
    fx.orchestrator.store().create("ws", &task, &fx.cancel).unwrap();
    fx.orchestrator
        .transition(&mut task, TaskStatus::Running, None)
        .unwrap();
    task.current_step = 2;
    fx.orchestrator
        .transition(&mut task, TaskStatus::CiFailed, None)
        .unwrap();
    fx.orchestrator.checkpoint(&mut task, &fx.cancel).unwrap();

    fx.orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::RetryImplement, &fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.current_step, 1);
}

#[tokio::test]
async fn fix_manually_stores_instructions_and_stays_parked() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);

    fx.orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::FixManually, &fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::CiFailed);
    let text = task
        .metadata
        .str_value(keys::MANUAL_FIX_INSTRUCTIONS)
        .unwrap();
    assert!(text.contains(task.id.as_str()));
    assert!(text.contains("2 checks failed"));
}

#[tokio::test]
async fn ci_abandon_converts_the_pr_to_draft() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);
    task.metadata.insert(keys::PR_NUMBER, 42);

    fx.orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::Abandon, &fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Abandoned);
    assert!(fx
        .forge
        .calls()
        .contains(&ForgeCall::ConvertToDraft { number: 42 }));
}

#[tokio::test]
async fn abandon_survives_a_failed_draft_conversion() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);
    task.metadata.insert(keys::PR_NUMBER, 42);
    fx.forge.fail_convert_to_draft("pr already merged");

    fx.orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::Abandon, &fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Abandoned);
}

#[tokio::test]
async fn gh_retry_returns_to_running() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::GhFailed);

    fx.orchestrator
        .process_gh_failure_action(&mut task, GhFailureAction::Retry, &fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Running);
}

#[tokio::test]
async fn gh_fix_and_retry_flags_the_manual_fix() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::GhFailed);

    fx.orchestrator
        .process_gh_failure_action(&mut task, GhFailureAction::FixAndRetry, &fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::GhFailed);
    assert!(task.metadata.flag(keys::AWAITING_MANUAL_FIX));
}

#[tokio::test]
async fn timeout_continue_waiting_extends_and_reruns() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiTimeout);

    fx.orchestrator
        .process_ci_timeout_action(&mut task, CiTimeoutAction::ContinueWaiting, &fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Running);
    assert!(task.metadata.flag(keys::EXTENDED_CI_TIMEOUT));
    // Still parked at the CI step, not rewound.
    assert_eq!(task.current_step, 2);
}

#[tokio::test]
async fn timeout_retry_rewinds_like_ci_retry() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiTimeout);

    fx.orchestrator
        .process_ci_timeout_action(&mut task, CiTimeoutAction::Retry, &fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.current_step, 0);
    assert_eq!(task.status, TaskStatus::Running);
}

#[tokio::test]
async fn artifact_written_when_directory_configured() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_dir = dir.path().join("ci-artifacts");
    let fx = engine_fixture_with_config(
        dir.path(),
        all_success_registry(),
        OrchestratorConfig {
            ci_artifact_dir: Some(artifact_dir.clone()),
        },
    );
    let mut task = parked_task(&fx, TaskStatus::CiFailed);
    task.metadata
        .set_json(keys::CI_FAILURE_RESULT, &ci_failure("https://ci.example/run/1"))
        .unwrap();

    fx.orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::FixManually, &fx.cancel)
        .await
        .unwrap();

    let raw = std::fs::read(artifact_dir.join("ci-result.json")).unwrap();
    let artifact: CiResultArtifact = serde_json::from_slice(&raw).unwrap();
    assert_eq!(artifact.elapsed_time, "5m0s");
    assert_eq!(artifact.failed_checks.len(), 1);
}

#[tokio::test]
async fn artifact_requires_directory_and_result() {
    let (_dir, fx) = fixture();

    // No directory configured.
    let err = fx
        .orchestrator
        .write_ci_result_artifact(Some(&ci_failure("u")))
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyValue(_)));

    // Directory configured but no result.
    let dir = tempfile::tempdir().unwrap();
    let fx = engine_fixture_with_config(
        dir.path(),
        all_success_registry(),
        OrchestratorConfig {
            ci_artifact_dir: Some(dir.path().join("out")),
        },
    );
    let err = fx.orchestrator.write_ci_result_artifact(None).unwrap_err();
    assert!(matches!(err, EngineError::EmptyValue(_)));
}

#[tokio::test]
async fn processors_check_cancellation_at_entry() {
    let (_dir, fx) = fixture();
    let mut task = parked_task(&fx, TaskStatus::CiFailed);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = fx
        .orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::FixManually, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert!(task.metadata.str_value(keys::MANUAL_FIX_INSTRUCTIONS).is_none());
}
