// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atlas_core::test_support::{step, task as build_task, template};
use atlas_core::{FakeClock, StepKind, TaskStatus, Template};

mod artifacts;
mod crud;
mod listing;
mod locking;
mod log;

pub(crate) struct Fixture {
    // NOTE(lifetime): keeps the temp dir alive for the store's lifetime
    #[allow(dead_code)]
    dir: tempfile::TempDir,
    pub store: TaskStore<FakeClock>,
    pub clock: FakeClock,
    pub cancel: CancellationToken,
}

pub(crate) fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = TaskStore::with_clock(dir.path(), clock.clone());
    Fixture {
        dir,
        store,
        clock,
        cancel: CancellationToken::new(),
    }
}

pub(crate) fn sample_template() -> Template {
    template(
        "fix",
        vec![step("implement", StepKind::Ai), step("validate", StepKind::Validation)],
    )
}

pub(crate) fn sample_task(clock: &FakeClock) -> Task {
    build_task(&sample_template(), clock)
}
