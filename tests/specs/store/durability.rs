//! Spec: store round-trips, versioned artifacts, and the event log.

use crate::prelude::*;
use atlas_storage::{StoreError, TaskStore};

struct StoreSpec {
    #[allow(dead_code)]
    dir: tempfile::TempDir,
    clock: FakeClock,
    store: TaskStore<FakeClock>,
    cancel: CancellationToken,
}

fn store_spec() -> StoreSpec {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = TaskStore::with_clock(dir.path(), clock.clone());
    StoreSpec {
        dir,
        clock,
        store,
        cancel: CancellationToken::new(),
    }
}

#[test]
fn create_then_get_is_deep_equal() {
    let s = store_spec();
    let template = template("t", vec![step("implement", StepKind::Ai)]);
    let task = build_task(&template, &s.clock);

    s.store.create("ws", &task, &s.cancel).unwrap();
    let loaded = s.store.get("ws", &task.id, &s.cancel).unwrap();
    assert_eq!(loaded, task);
}

#[test]
fn versioned_artifacts_take_the_lowest_free_slot() {
    let s = store_spec();
    let template = template("t", vec![step("implement", StepKind::Ai)]);
    let task = build_task(&template, &s.clock);
    s.store.create("ws", &task, &s.cancel).unwrap();

    for (expected, content) in [("review.1.md", "one"), ("review.2.md", "two")] {
        let name = s
            .store
            .save_versioned_artifact("ws", &task.id, "review.md", content.as_bytes(), &s.cancel)
            .unwrap();
        assert_eq!(name, expected);
        assert_eq!(
            s.store.get_artifact("ws", &task.id, &name).unwrap(),
            content.as_bytes()
        );
    }
}

#[test]
fn traversal_names_are_rejected() {
    let s = store_spec();
    let template = template("t", vec![step("implement", StepKind::Ai)]);
    let task = build_task(&template, &s.clock);
    s.store.create("ws", &task, &s.cancel).unwrap();

    for name in ["../escape", "a/b", "a\\b"] {
        let err = s
            .store
            .save_artifact("ws", &task.id, name, b"x", &s.cancel)
            .unwrap_err();
        assert!(matches!(err, StoreError::PathTraversal(_)), "{name}");
    }
}

#[test]
fn log_appends_in_order_with_newlines() {
    let s = store_spec();
    let template = template("t", vec![step("implement", StepKind::Ai)]);
    let task = build_task(&template, &s.clock);
    s.store.create("ws", &task, &s.cancel).unwrap();

    s.store
        .append_log("ws", &task.id, r#"{"event":"started"}"#, &s.cancel)
        .unwrap();
    s.store
        .append_log("ws", &task.id, r#"{"event":"finished"}"#, &s.cancel)
        .unwrap();

    let path = s
        .store
        .base()
        .join("workspaces/ws/tasks")
        .join(task.id.as_str())
        .join("log.jsonl");
    let contents = std::fs::read_to_string(path).unwrap();
    assert_eq!(contents, "{\"event\":\"started\"}\n{\"event\":\"finished\"}\n");
}

#[test]
fn task_document_round_trips_bytes() {
    let s = store_spec();
    let template = template("t", vec![step("implement", StepKind::Ai)]);
    let mut task = build_task(&template, &s.clock);
    task.metadata.set_str("branch", "main");
    s.store.create("ws", &task, &s.cancel).unwrap();

    let path = s
        .store
        .base()
        .join("workspaces/ws/tasks")
        .join(task.id.as_str())
        .join("task.json");
    let first = std::fs::read(&path).unwrap();
    let parsed: Task = serde_json::from_slice(&first).unwrap();
    let second = serde_json::to_vec_pretty(&parsed).unwrap();
    assert_eq!(first, second);
}
