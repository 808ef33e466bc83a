// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;

#[test]
fn append_log_terminates_entries_with_newline() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    fx.store
        .append_log("ws", &task.id, r#"{"event":"started"}"#, &fx.cancel)
        .unwrap();
    fx.store
        .append_log("ws", &task.id, "{\"event\":\"step\"}\n", &fx.cancel)
        .unwrap();

    let path = fx
        .store
        .base()
        .join("workspaces/ws/tasks")
        .join(task.id.as_str())
        .join("log.jsonl");
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "{\"event\":\"started\"}\n{\"event\":\"step\"}\n");
}

#[test]
fn append_log_to_missing_task_fails() {
    let fx = fixture();
    let err = fx
        .store
        .append_log("ws", &TaskId::new("task-20260101-000000"), "{}", &fx.cancel)
        .unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
}

#[test]
fn log_lines_stay_in_append_order() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    for i in 0..5 {
        fx.store
            .append_log("ws", &task.id, &format!("{{\"seq\":{i}}}"), &fx.cancel)
            .unwrap();
    }

    let path = fx
        .store
        .base()
        .join("workspaces/ws/tasks")
        .join(task.id.as_str())
        .join("log.jsonl");
    let lines: Vec<String> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(lines.len(), 5);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line, &format!("{{\"seq\":{i}}}"));
    }
}
