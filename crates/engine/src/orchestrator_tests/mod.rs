// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{
    all_success_registry, engine_fixture, result_with, EngineFixture, FailingExecutor,
    ScriptedExecutor, ScriptedOutcome, SuccessExecutor,
};
use atlas_core::test_support::{git_step, optional_step, step, task as build_task, template};
use atlas_core::{FakeClock, StepExecStatus, StepKind};

mod dispatch;
mod lifecycle;
mod resume;

pub(crate) fn fixture(registry: ExecutorRegistry) -> (tempfile::TempDir, EngineFixture) {
    let dir = tempfile::tempdir().unwrap();
    let fx = engine_fixture(dir.path(), registry);
    (dir, fx)
}

/// A task persisted in `running`, outside the main loop.
pub(crate) fn started_task(fx: &EngineFixture, tpl: &Template) -> Task {
    let mut task = build_task(tpl, &fx.clock);
    fx.orchestrator.store().create("ws", &task, &fx.cancel).unwrap();
    fx.orchestrator
        .transition(&mut task, TaskStatus::Running, None)
        .unwrap();
    fx.orchestrator.checkpoint(&mut task, &fx.cancel).unwrap();
    task
}

/// Reload the persisted document for a task.
pub(crate) fn reload(fx: &EngineFixture, task: &Task) -> Task {
    fx.orchestrator
        .store()
        .get(&task.workspace, &task.id, &fx.cancel)
        .unwrap()
}
