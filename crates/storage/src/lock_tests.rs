// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn token() -> CancellationToken {
    CancellationToken::new()
}

#[test]
fn acquire_creates_lock_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task-20260101-000000.lock");

    let lock = TaskLock::acquire(&path, &token()).unwrap();
    assert!(path.exists());
    assert_eq!(lock.path(), path);
}

#[test]
fn reacquire_after_release() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.lock");

    let lock = TaskLock::acquire(&path, &token()).unwrap();
    drop(lock);
    // Released on drop, so a second acquisition succeeds immediately.
    TaskLock::acquire(&path, &token()).unwrap();
}

#[test]
fn contended_lock_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.lock");

    let _held = TaskLock::acquire(&path, &token()).unwrap();

    // Same-process contention: fs2 advisory locks are per-file-handle, so
    // a second open handle observes the held lock.
    let started = Instant::now();
    let err = TaskLock::acquire(&path, &token()).unwrap_err();
    assert!(matches!(err, StoreError::LockTimeout { .. }));
    assert!(started.elapsed() >= LOCK_TIMEOUT - LOCK_RETRY_INTERVAL);
}

#[test]
fn cancellation_checked_between_retries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.lock");

    let _held = TaskLock::acquire(&path, &token()).unwrap();

    let cancel = token();
    cancel.cancel();
    let started = Instant::now();
    let err = TaskLock::acquire(&path, &cancel).unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
    assert!(started.elapsed() < LOCK_TIMEOUT);
}
