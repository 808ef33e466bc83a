// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;

#[test]
fn create_then_get_round_trips() {
    let fx = fixture();
    let task = sample_task(&fx.clock);

    fx.store.create("ws", &task, &fx.cancel).unwrap();
    let loaded = fx.store.get("ws", &task.id, &fx.cancel).unwrap();

    assert_eq!(loaded, task);
}

#[test]
fn create_on_existing_task_fails() {
    let fx = fixture();
    let task = sample_task(&fx.clock);

    fx.store.create("ws", &task, &fx.cancel).unwrap();
    let err = fx.store.create("ws", &task, &fx.cancel).unwrap_err();
    assert!(matches!(err, StoreError::TaskExists(id) if id == task.id));
}

#[test]
fn get_missing_task_is_not_found() {
    let fx = fixture();
    let err = fx
        .store
        .get("ws", &TaskId::new("task-20260101-000000"), &fx.cancel)
        .unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
}

#[test]
fn corrupt_document_is_a_parse_error_not_not_found() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let path = fx
        .store
        .base()
        .join("workspaces/ws/tasks")
        .join(task.id.as_str())
        .join("task.json");
    fs::write(&path, b"{ not json").unwrap();

    let err = fx.store.get("ws", &task.id, &fx.cancel).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }));
}

#[test]
fn foreign_schema_version_is_refused() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let path = fx
        .store
        .base()
        .join("workspaces/ws/tasks")
        .join(task.id.as_str())
        .join("task.json");
    let mut doc: serde_json::Value =
        serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    doc["schema_version"] = serde_json::json!(99);
    fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

    let err = fx.store.get("ws", &task.id, &fx.cancel).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedSchema { found: 99 }));
}

#[test]
fn update_bumps_updated_at_and_is_visible() {
    let fx = fixture();
    let mut task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    fx.clock.advance(chrono::Duration::seconds(30));
    task.apply_transition(TaskStatus::Running, None, fx.clock.now()).unwrap();
    fx.store.update("ws", &mut task, &fx.cancel).unwrap();

    assert_eq!(task.updated_at, fx.clock.now());
    let loaded = fx.store.get("ws", &task.id, &fx.cancel).unwrap();
    assert_eq!(loaded.status, TaskStatus::Running);
    assert_eq!(loaded.updated_at, fx.clock.now());
}

#[test]
fn update_missing_task_is_not_found() {
    let fx = fixture();
    let mut task = sample_task(&fx.clock);
    let err = fx.store.update("ws", &mut task, &fx.cancel).unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
}

#[test]
fn delete_removes_directory_and_lock() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    fx.store.delete("ws", &task.id, &fx.cancel).unwrap();

    let tasks_dir = fx.store.base().join("workspaces/ws/tasks");
    assert!(!tasks_dir.join(task.id.as_str()).exists());
    assert!(!tasks_dir.join(format!("{}.lock", task.id)).exists());

    let err = fx.store.get("ws", &task.id, &fx.cancel).unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
}

#[test]
fn delete_missing_task_is_not_found() {
    let fx = fixture();
    let err = fx
        .store
        .delete("ws", &TaskId::new("task-20260101-000000"), &fx.cancel)
        .unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
}

#[test]
fn workspaces_are_isolated() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("alpha", &task, &fx.cancel).unwrap();

    let err = fx.store.get("beta", &task.id, &fx.cancel).unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
}

#[test]
fn cancelled_token_aborts_operations() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = fx.store.get("ws", &task.id, &cancel).unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
}
