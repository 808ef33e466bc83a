//! Spec: first failure in a parallel group cancels the siblings.

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn first_error_cancels_the_group() {
    let ai = RoutingExecutor::new(StepKind::Ai);
    ai.delay("s1", Duration::from_secs(30));
    ai.fail("s2", "model refused");
    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(ai));

    let spec = spec(registry);
    let template = template("par", vec![step("s1", StepKind::Ai), step("s2", StepKind::Ai)]);
    let task = build_task(&template, &spec.fx.clock);

    let outcome = spec
        .fx
        .orchestrator
        .execute_parallel_group(&task, &template, &[0, 1], &spec.fx.cancel)
        .await;

    assert_eq!(outcome.results.len(), 2);
    match outcome.error {
        Some(EngineError::StepFailed { step, message }) => {
            assert_eq!(step, "s2");
            assert_eq!(message, "model refused");
        }
        other => panic!("expected s2's error, got {other:?}"),
    }
    // The slow sibling was cancelled before producing a result.
    assert!(outcome.results[0].is_none());
}

#[tokio::test]
async fn parallel_group_leaves_step_records_alone() {
    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(SuccessExecutor::new(StepKind::Ai)));

    let spec = spec(registry);
    let template = template("par", vec![step("s1", StepKind::Ai), step("s2", StepKind::Ai)]);
    let task = build_task(&template, &spec.fx.clock);

    let outcome = spec
        .fx
        .orchestrator
        .execute_parallel_group(&task, &template, &[0, 1], &spec.fx.cancel)
        .await;

    assert!(outcome.error.is_none());
    assert!(outcome.results.iter().all(Option::is_some));
    // Slot order matches the group's indices.
    assert_eq!(outcome.results[0].as_ref().unwrap().name, "s1");
    assert_eq!(outcome.results[1].as_ref().unwrap().name, "s2");
    // The internal path does not touch per-step records.
    assert!(task.steps.iter().all(|s| s.attempts == 0));
    assert!(task.step_results.is_empty());
}
