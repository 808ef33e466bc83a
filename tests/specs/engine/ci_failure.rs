//! Spec: a classified CI failure parks the task and retry_implement
//! rewinds it.

use crate::prelude::*;

fn ship_template() -> Template {
    template(
        "ship",
        vec![
            step("implement", StepKind::Ai),
            git_step("push", "push"),
            step("ci", StepKind::Ci),
        ],
    )
}

#[tokio::test]
async fn ci_failure_with_retry_implement() {
    let watch = ci_failure("https://ci.example/run/7");
    let ci = ScriptedExecutor::new(StepKind::Ci);
    ci.push_result(ci_failure_result("ci_failed", "2 checks failed", &watch));

    let spec = spec(registry_with_ci(&ci));
    let template = ship_template();

    // The classified failure is absorbed; the task parks in ci_failed.
    let mut task = spec
        .fx
        .orchestrator
        .start("ws", "main", &template, "fix bug", &spec.fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::CiFailed);
    let stored: CiWatchResult = task.metadata.json_value("ci_failure_result").unwrap();
    assert_eq!(stored, watch);
    assert_eq!(task.metadata.str_value("last_error"), Some("2 checks failed"));

    // User picks retry_implement: back to the implement step, running.
    spec.fx
        .orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::RetryImplement, &spec.fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.current_step, 0);
    assert_eq!(task.status, TaskStatus::Running);

    let reloaded = spec
        .fx
        .orchestrator
        .store()
        .get("ws", &task.id, &spec.fx.cancel)
        .unwrap();
    assert_eq!(reloaded.current_step, 0);
    assert_eq!(reloaded.status, TaskStatus::Running);
}

#[tokio::test]
async fn resumed_task_reruns_from_the_implement_step() {
    let watch = ci_failure("https://ci.example/run/7");
    let ci = ScriptedExecutor::new(StepKind::Ci);
    ci.push_result(ci_failure_result("ci_failed", "2 checks failed", &watch));
    // Second CI run (after the retry) passes via the exhausted script.

    let spec = spec(registry_with_ci(&ci));
    let template = ship_template();

    let mut task = spec
        .fx
        .orchestrator
        .start("ws", "main", &template, "fix bug", &spec.fx.cancel)
        .await
        .unwrap();
    spec.fx
        .orchestrator
        .process_ci_failure_action(&mut task, CiFailureAction::RetryImplement, &spec.fx.cancel)
        .await
        .unwrap();

    // The task is already running; resume drives the loop to completion.
    spec.fx
        .orchestrator
        .resume(&mut task, &template, &spec.fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(ci.executed(), vec!["ci".to_string(), "ci".to_string()]);
}
