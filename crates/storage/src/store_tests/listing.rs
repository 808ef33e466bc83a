// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atlas_core::task::TaskConfig;
use atlas_core::TaskSettings;
use std::fs;

fn task_with_id(fx: &Fixture, id: &str) -> Task {
    Task::new(
        TaskConfig {
            id: TaskId::new(id),
            workspace: "ws".to_string(),
            template_name: "fix".to_string(),
            description: String::new(),
            settings: TaskSettings::default(),
        },
        &sample_template(),
        fx.clock.now(),
    )
}

#[test]
fn empty_workspace_lists_nothing() {
    let fx = fixture();
    assert!(fx.store.list("ws", &fx.cancel).unwrap().is_empty());
}

#[test]
fn list_sorts_newest_first() {
    let fx = fixture();

    let older = task_with_id(&fx, "task-20260101-080000");
    fx.store.create("ws", &older, &fx.cancel).unwrap();

    fx.clock.advance(chrono::Duration::hours(2));
    let newer = task_with_id(&fx, "task-20260101-100000");
    fx.store.create("ws", &newer, &fx.cancel).unwrap();

    let listed = fx.store.list("ws", &fx.cancel).unwrap();
    let ids: Vec<_> = listed.iter().map(|t| t.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["task-20260101-100000", "task-20260101-080000"]);
}

#[test]
fn list_ignores_foreign_directory_names() {
    let fx = fixture();
    let task = task_with_id(&fx, "task-20260101-080000");
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let tasks_dir = fx.store.base().join("workspaces/ws/tasks");
    fs::create_dir_all(tasks_dir.join("scratch")).unwrap();
    fs::create_dir_all(tasks_dir.join("task-notanid")).unwrap();

    let listed = fx.store.list("ws", &fx.cancel).unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn list_skips_unreadable_tasks() {
    let fx = fixture();
    let good = task_with_id(&fx, "task-20260101-080000");
    fx.store.create("ws", &good, &fx.cancel).unwrap();
    let bad = task_with_id(&fx, "task-20260101-090000");
    fx.store.create("ws", &bad, &fx.cancel).unwrap();

    let bad_path = fx
        .store
        .base()
        .join("workspaces/ws/tasks/task-20260101-090000/task.json");
    fs::write(&bad_path, b"garbage").unwrap();

    let listed = fx.store.list("ws", &fx.cancel).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, good.id);
}

#[test]
fn millisecond_suffixed_ids_are_listed() {
    let fx = fixture();
    let task = task_with_id(&fx, "task-20260101-080000-123");
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let listed = fx.store.list("ws", &fx.cancel).unwrap();
    assert_eq!(listed.len(), 1);
}
