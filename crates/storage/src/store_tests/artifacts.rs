// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn save_and_get_artifact() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    fx.store
        .save_artifact("ws", &task.id, "report.md", b"# done", &fx.cancel)
        .unwrap();
    let data = fx.store.get_artifact("ws", &task.id, "report.md").unwrap();
    assert_eq!(data, b"# done");
}

#[test]
fn get_missing_artifact_is_distinct_error() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let err = fx.store.get_artifact("ws", &task.id, "absent.txt").unwrap_err();
    assert!(matches!(err, StoreError::ArtifactNotFound(_)));
}

#[yare::parameterized(
    parent_escape   = { "../task.json" },
    nested          = { "sub/dir.txt" },
    backslash       = { "sub\\dir.txt" },
    dotdot_inline   = { "a..b" },
    empty           = { "" },
)]
fn traversal_names_rejected(name: &str) {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let save = fx
        .store
        .save_artifact("ws", &task.id, name, b"x", &fx.cancel)
        .unwrap_err();
    assert!(matches!(save, StoreError::PathTraversal(_)));

    let get = fx.store.get_artifact("ws", &task.id, name).unwrap_err();
    assert!(matches!(get, StoreError::PathTraversal(_)));
}

#[test]
fn versioned_artifact_picks_lowest_free_slot() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let first = fx
        .store
        .save_versioned_artifact("ws", &task.id, "review.md", b"one", &fx.cancel)
        .unwrap();
    assert_eq!(first, "review.1.md");

    let second = fx
        .store
        .save_versioned_artifact("ws", &task.id, "review.md", b"two", &fx.cancel)
        .unwrap();
    assert_eq!(second, "review.2.md");

    // Content lands under the chosen name.
    assert_eq!(fx.store.get_artifact("ws", &task.id, "review.2.md").unwrap(), b"two");

    // Freeing a hole makes it the next pick.
    std::fs::remove_file(
        fx.store
            .base()
            .join("workspaces/ws/tasks")
            .join(task.id.as_str())
            .join("artifacts/review.1.md"),
    )
    .unwrap();
    let reused = fx
        .store
        .save_versioned_artifact("ws", &task.id, "review.md", b"three", &fx.cancel)
        .unwrap();
    assert_eq!(reused, "review.1.md");
}

#[test]
fn versioned_artifact_without_extension() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    let name = fx
        .store
        .save_versioned_artifact("ws", &task.id, "transcript", b"...", &fx.cancel)
        .unwrap();
    assert_eq!(name, "transcript.1");
}

#[test]
fn split_base_name_cases() {
    assert_eq!(split_base_name("review.md"), ("review", ".md"));
    assert_eq!(split_base_name("archive.tar.gz"), ("archive.tar", ".gz"));
    assert_eq!(split_base_name("transcript"), ("transcript", ""));
    assert_eq!(split_base_name(".hidden"), (".hidden", ""));
}

#[test]
fn list_artifacts_sorted() {
    let fx = fixture();
    let task = sample_task(&fx.clock);
    fx.store.create("ws", &task, &fx.cancel).unwrap();

    assert!(fx.store.list_artifacts("ws", &task.id).unwrap().is_empty());

    fx.store
        .save_artifact("ws", &task.id, "b.txt", b"b", &fx.cancel)
        .unwrap();
    fx.store
        .save_artifact("ws", &task.id, "a.txt", b"a", &fx.cancel)
        .unwrap();

    assert_eq!(
        fx.store.list_artifacts("ws", &task.id).unwrap(),
        vec!["a.txt".to_string(), "b.txt".to_string()]
    );
}
