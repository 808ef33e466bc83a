//! Spec: a no-changes commit suppresses the push and PR steps.

use crate::prelude::*;

#[tokio::test]
async fn no_changes_skips_forge_steps() {
    let git = ScriptedExecutor::new(StepKind::Git);
    git.push_status(StepResultStatus::NoChanges); // commit

    let mut registry = all_success_registry();
    registry.register(Arc::new(git.clone()));
    let spec = spec(registry);

    let template = template(
        "ship",
        vec![
            step("implement", StepKind::Ai),
            git_step("commit", "commit"),
            git_step("push", "push"),
            git_step("pr", "create_pr"),
            step("ci", StepKind::Ci),
        ],
    );

    let task = spec
        .fx
        .orchestrator
        .start("ws", "main", &template, "fix bug", &spec.fx.cancel)
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::AwaitingApproval);
    assert!(task.metadata.flag("skip_git_steps"));

    let by_name: Vec<(String, StepResultStatus)> = task
        .step_results
        .iter()
        .map(|r| (r.name.clone(), r.status))
        .collect();
    assert_eq!(
        by_name,
        vec![
            ("implement".to_string(), StepResultStatus::Success),
            ("commit".to_string(), StepResultStatus::NoChanges),
            ("push".to_string(), StepResultStatus::Skipped),
            ("pr".to_string(), StepResultStatus::Skipped),
            ("ci".to_string(), StepResultStatus::Success),
        ]
    );
    // The git executor never saw the suppressed operations.
    assert_eq!(git.executed(), vec!["commit".to_string()]);
}
