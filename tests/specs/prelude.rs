//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

pub use atlas_core::test_support::{
    ci_failure, git_step, optional_step, step, task as build_task, template,
};
pub use atlas_core::{
    CiWatchResult, Clock, FakeClock, StepKind, StepResultStatus, Task, TaskStatus, Template,
};
pub use atlas_engine::test_support::{
    all_success_registry, ci_failure_result, engine_fixture, result_with, EngineFixture,
    RoutingExecutor, ScriptedExecutor, SuccessExecutor,
};
pub use atlas_engine::{CiFailureAction, EngineError, ExecutorRegistry};
pub use std::sync::Arc;
pub use tokio_util::sync::CancellationToken;

/// A spec fixture: fake-clock engine over a temp state directory.
pub struct Spec {
    // NOTE(lifetime): keeps the state directory alive for the fixture
    #[allow(dead_code)]
    dir: tempfile::TempDir,
    pub fx: EngineFixture,
}

pub fn spec(registry: ExecutorRegistry) -> Spec {
    let dir = tempfile::tempdir().unwrap();
    let fx = engine_fixture(dir.path(), registry);
    Spec { dir, fx }
}

/// Registry where the CI kind is scripted and everything else succeeds.
pub fn registry_with_ci(ci: &ScriptedExecutor) -> ExecutorRegistry {
    let mut registry = all_success_registry();
    registry.register(Arc::new(ci.clone()));
    registry
}
