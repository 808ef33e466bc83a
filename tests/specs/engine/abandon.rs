//! Spec: abandoning a running task requires force and preserves state.

use crate::prelude::*;

#[tokio::test]
async fn force_abandon_running_task() {
    let spec = spec(all_success_registry());
    let template = template("t", vec![step("implement", StepKind::Ai)]);

    // Park a task in running without driving the loop.
    let mut task = build_task(&template, &spec.fx.clock);
    let store = spec.fx.orchestrator.store();
    store.create("ws", &task, &spec.fx.cancel).unwrap();
    task.apply_transition(TaskStatus::Running, None, spec.fx.clock.now())
        .unwrap();
    store.update("ws", &mut task, &spec.fx.cancel).unwrap();
    store
        .save_artifact("ws", &task.id, "draft.md", b"wip", &spec.fx.cancel)
        .unwrap();
    store
        .append_log("ws", &task.id, r#"{"event":"step_started"}"#, &spec.fx.cancel)
        .unwrap();

    // Plain abandon refuses a running task.
    let err = spec
        .fx
        .orchestrator
        .abandon(&mut task, "user", false, &spec.fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));

    // Force is allowed and terminal.
    spec.fx
        .orchestrator
        .abandon(&mut task, "user", true, &spec.fx.cancel)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Abandoned);
    assert!(task.completed_at.is_some());

    // Artifacts and logs are preserved on disk.
    assert_eq!(
        store.get_artifact("ws", &task.id, "draft.md").unwrap(),
        b"wip"
    );
    assert_eq!(
        store.list_artifacts("ws", &task.id).unwrap(),
        vec!["draft.md".to_string()]
    );
    let reloaded = store.get("ws", &task.id, &spec.fx.cancel).unwrap();
    assert_eq!(reloaded.status, TaskStatus::Abandoned);
}
