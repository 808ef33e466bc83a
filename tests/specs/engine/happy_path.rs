//! Spec: a two-step template runs to the approval gate.

use crate::prelude::*;

#[tokio::test]
async fn happy_path() {
    let spec = spec(all_success_registry());
    let template = template(
        "fix",
        vec![
            step("implement", StepKind::Ai),
            step("validate", StepKind::Validation),
        ],
    );

    let task = spec
        .fx
        .orchestrator
        .start("ws", "main", &template, "fix bug", &spec.fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert_eq!(task.step_results.len(), 2);
    assert!(task
        .step_results
        .iter()
        .all(|r| r.status == StepResultStatus::Success));

    // The persisted document matches what the engine returned.
    let stored = spec
        .fx
        .orchestrator
        .store()
        .get("ws", &task.id, &spec.fx.cancel)
        .unwrap();
    assert_eq!(stored, task);

    // Checkpoints: at least one per step plus completion.
    // The fake clock pins updated_at, so count transitions instead.
    assert_eq!(stored.transitions.len(), 3);
}

#[tokio::test]
async fn empty_template_reaches_approval_in_one_call() {
    let spec = spec(all_success_registry());
    let template = template("noop", vec![]);

    let task = spec
        .fx
        .orchestrator
        .start("ws", "main", &template, "", &spec.fx.cancel)
        .await
        .unwrap();

    let statuses: Vec<_> = task.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        statuses,
        vec![
            TaskStatus::Running,
            TaskStatus::Validating,
            TaskStatus::AwaitingApproval
        ]
    );
    assert!(task.step_results.is_empty());
}
