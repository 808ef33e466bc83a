// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted executors and fixtures shared by engine and workspace tests.
#![cfg_attr(coverage_nightly, coverage(off))]
#![allow(clippy::unwrap_used)]

use crate::executor::{StepError, StepExecutor};
use async_trait::async_trait;
use atlas_core::metadata::keys;
use atlas_core::test_support::step_result;
use atlas_core::{CiWatchResult, StepDefinition, StepKind, StepResult, StepResultStatus, Task};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A bare result with the given status; the orchestrator fills in the
/// bookkeeping fields.
pub fn result_with(status: StepResultStatus) -> StepResult {
    step_result(0, "", status)
}

/// A failed result carrying a `failure_type` classification.
pub fn classified_failure(failure_type: &str, error: &str) -> StepResult {
    let mut result = result_with(StepResultStatus::Failed);
    result.error = Some(error.to_string());
    result.metadata.set_str(keys::FAILURE_TYPE, failure_type);
    result
}

/// A failed CI result carrying both the classification and a watch result.
pub fn ci_failure_result(failure_type: &str, error: &str, watch: &CiWatchResult) -> StepResult {
    let mut result = classified_failure(failure_type, error);
    result.metadata.set_json(keys::CI_RESULT, watch).unwrap();
    result
}

/// Executor that always succeeds.
pub struct SuccessExecutor {
    kind: StepKind,
}

impl SuccessExecutor {
    pub fn new(kind: StepKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl StepExecutor for SuccessExecutor {
    fn kind(&self) -> StepKind {
        self.kind
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        _task: &Task,
        _step: &StepDefinition,
    ) -> Result<StepResult, StepError> {
        Ok(result_with(StepResultStatus::Success))
    }
}

/// Executor that always fails hard (no result).
pub struct FailingExecutor {
    kind: StepKind,
    message: String,
}

impl FailingExecutor {
    pub fn new(kind: StepKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[async_trait]
impl StepExecutor for FailingExecutor {
    fn kind(&self) -> StepKind {
        self.kind
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        _task: &Task,
        _step: &StepDefinition,
    ) -> Result<StepResult, StepError> {
        Err(StepError::Failed(self.message.clone()))
    }
}

/// One scripted response from a [`ScriptedExecutor`].
pub enum ScriptedOutcome {
    Result(StepResult),
    Error(String),
    Cancelled,
}

/// Executor that pops scripted outcomes per call and records the steps it
/// ran. An exhausted script succeeds.
#[derive(Clone)]
pub struct ScriptedExecutor {
    kind: StepKind,
    script: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            script: Arc::default(),
            executed: Arc::default(),
        }
    }

    pub fn push(&self, outcome: ScriptedOutcome) -> &Self {
        self.script.lock().push_back(outcome);
        self
    }

    pub fn push_result(&self, result: StepResult) -> &Self {
        self.push(ScriptedOutcome::Result(result))
    }

    pub fn push_status(&self, status: StepResultStatus) -> &Self {
        self.push_result(result_with(status))
    }

    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.push(ScriptedOutcome::Error(message.into()))
    }

    /// Names of the steps this executor actually ran, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    fn kind(&self) -> StepKind {
        self.kind
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        _task: &Task,
        step: &StepDefinition,
    ) -> Result<StepResult, StepError> {
        self.executed.lock().push(step.name.clone());
        match self.script.lock().pop_front() {
            None => Ok(result_with(StepResultStatus::Success)),
            Some(ScriptedOutcome::Result(result)) => Ok(result),
            Some(ScriptedOutcome::Error(message)) => Err(StepError::Failed(message)),
            Some(ScriptedOutcome::Cancelled) => Err(StepError::Cancelled),
        }
    }
}

/// Executor dispatching on step name, so one kind can behave differently
/// per step (e.g. a slow success beside a fast failure in one parallel
/// group). Unknown names succeed.
#[derive(Clone)]
pub struct RoutingExecutor {
    kind: StepKind,
    delays: Arc<Mutex<std::collections::HashMap<String, Duration>>>,
    failures: Arc<Mutex<std::collections::HashMap<String, String>>>,
}

impl RoutingExecutor {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            delays: Arc::default(),
            failures: Arc::default(),
        }
    }

    /// Sleep (honoring cancellation) before resolving this step.
    pub fn delay(&self, step_name: &str, delay: Duration) -> &Self {
        self.delays.lock().insert(step_name.to_string(), delay);
        self
    }

    /// Fail this step hard with the given message.
    pub fn fail(&self, step_name: &str, message: impl Into<String>) -> &Self {
        self.failures
            .lock()
            .insert(step_name.to_string(), message.into());
        self
    }
}

#[async_trait]
impl StepExecutor for RoutingExecutor {
    fn kind(&self) -> StepKind {
        self.kind
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _task: &Task,
        step: &StepDefinition,
    ) -> Result<StepResult, StepError> {
        let delay = self.delays.lock().get(&step.name).copied();
        if let Some(delay) = delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(StepError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if let Some(message) = self.failures.lock().get(&step.name).cloned() {
            return Err(StepError::Failed(message));
        }
        Ok(result_with(StepResultStatus::Success))
    }
}

/// Executor that sleeps before succeeding, honoring cancellation. Used to
/// exercise parallel-group first-error semantics.
pub struct SlowExecutor {
    kind: StepKind,
    delay: Duration,
}

impl SlowExecutor {
    pub fn new(kind: StepKind, delay: Duration) -> Self {
        Self { kind, delay }
    }
}

#[async_trait]
impl StepExecutor for SlowExecutor {
    fn kind(&self) -> StepKind {
        self.kind
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _task: &Task,
        _step: &StepDefinition,
    ) -> Result<StepResult, StepError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(StepError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {
                let mut result = result_with(StepResultStatus::Success);
                result.output = Some("slow done".to_string());
                Ok(result)
            }
        }
    }
}

/// Build a registry-ready executor set where every kind succeeds.
pub fn all_success_registry() -> crate::registry::ExecutorRegistry {
    let mut registry = crate::registry::ExecutorRegistry::new();
    for kind in [
        StepKind::Ai,
        StepKind::Validation,
        StepKind::Git,
        StepKind::Ci,
        StepKind::Human,
        StepKind::Sdd,
        StepKind::Verify,
        StepKind::Loop,
    ] {
        registry.register(Arc::new(SuccessExecutor::new(kind)));
    }
    registry
}

/// An orchestrator wired to fake observers over a store rooted at `base`
/// (callers own the directory's lifetime), plus handles to every fake.
pub struct EngineFixture {
    pub orchestrator: crate::Orchestrator<atlas_core::FakeClock>,
    pub clock: atlas_core::FakeClock,
    pub hook: crate::FakeHook,
    pub notifier: atlas_adapters::FakeNotifier,
    pub metrics: crate::FakeMetrics,
    pub forge: atlas_adapters::FakeForgeRunner,
    pub browser: atlas_adapters::FakeBrowser,
    pub cancel: CancellationToken,
}

pub fn engine_fixture(
    base: &std::path::Path,
    registry: crate::registry::ExecutorRegistry,
) -> EngineFixture {
    engine_fixture_with_config(base, registry, crate::OrchestratorConfig::default())
}

pub fn engine_fixture_with_config(
    base: &std::path::Path,
    registry: crate::registry::ExecutorRegistry,
    config: crate::OrchestratorConfig,
) -> EngineFixture {
    let clock = atlas_core::FakeClock::new();
    let store = atlas_storage::TaskStore::with_clock(base, clock.clone());
    let hook = crate::FakeHook::new();
    let notifier = atlas_adapters::FakeNotifier::new();
    let metrics = crate::FakeMetrics::new();
    let forge = atlas_adapters::FakeForgeRunner::new();
    let browser = atlas_adapters::FakeBrowser::new();

    let orchestrator =
        crate::OrchestratorBuilder::with_clock(store, Arc::new(registry), clock.clone())
            .hook(Arc::new(hook.clone()))
            .notifier(Arc::new(notifier.clone()))
            .metrics(Arc::new(metrics.clone()))
            .forge(Arc::new(forge.clone()))
            .browser(Arc::new(browser.clone()))
            .config(config)
            .build();

    EngineFixture {
        orchestrator,
        clock,
        hook,
        notifier,
        metrics,
        forge,
        browser,
        cancel: CancellationToken::new(),
    }
}
