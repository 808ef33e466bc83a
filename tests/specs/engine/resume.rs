//! Spec: resume heals non-terminal tasks and walks optional tails.

use crate::prelude::*;

#[tokio::test]
async fn resume_after_validation_failure() {
    let validation = ScriptedExecutor::new(StepKind::Validation);
    validation.push_error("lint exploded");
    let mut registry = all_success_registry();
    registry.register(Arc::new(validation.clone()));

    let spec = spec(registry);
    let template = template(
        "fix",
        vec![
            step("implement", StepKind::Ai),
            step("validate", StepKind::Validation),
        ],
    );

    let err = spec
        .fx
        .orchestrator
        .start("ws", "main", &template, "fix bug", &spec.fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StepFailed { .. }));

    let mut task = spec
        .fx
        .orchestrator
        .store()
        .list("ws", &spec.fx.cancel)
        .unwrap()
        .remove(0);
    assert_eq!(task.status, TaskStatus::ValidationFailed);
    // Paused at the failed step, ready to re-run it.
    assert_eq!(task.current_step, 1);

    // The script is exhausted, so validation passes on resume.
    spec.fx
        .orchestrator
        .resume(&mut task, &template, &spec.fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(validation.executed(), vec!["validate".to_string(), "validate".to_string()]);
    // The second attempt is visible on the step record.
    assert_eq!(task.steps[1].attempts, 2);
}

#[tokio::test]
async fn resume_approval_with_optional_tail_reenters_approval() {
    // The review step pauses the task the first time through; on resume
    // its script is exhausted and it succeeds.
    let human = ScriptedExecutor::new(StepKind::Human);
    human.push_status(StepResultStatus::AwaitingApproval);
    let mut registry = all_success_registry();
    registry.register(Arc::new(human));

    let spec = spec(registry);
    let template = template(
        "fix",
        vec![
            step("review", StepKind::Human),
            optional_step("cleanup", StepKind::Git),
        ],
    );

    let mut task = spec
        .fx
        .orchestrator
        .start("ws", "main", &template, "fix bug", &spec.fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(task.current_step, 0);

    // Resume walks past the skippable tail and re-enters the gate.
    spec.fx
        .orchestrator
        .resume(&mut task, &template, &spec.fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(task.current_step, 2);
    let skipped: Vec<_> = task
        .step_results
        .iter()
        .filter(|r| r.status == StepResultStatus::Skipped)
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(skipped, vec!["cleanup".to_string()]);
}
