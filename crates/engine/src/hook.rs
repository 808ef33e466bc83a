// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Out-of-band observers of step and task boundaries.
//!
//! Hooks enable external logging, resumability breadcrumbs, and interval
//! snapshots. Every call from the orchestrator is best-effort: a hook
//! error is logged and swallowed, never surfaced to the caller.
//!
//! Recoverable failures (CI, CI timeout, source-forge, validation,
//! interruption) report through `fail_step` so a later resume stays
//! semantically valid; only terminal failures (abandon) use `fail_task`.

use async_trait::async_trait;
use atlas_core::Task;
use thiserror::Error;

/// Errors from hook operations
#[derive(Debug, Error)]
#[error("hook error: {0}")]
pub struct HookError(pub String);

/// Observer notified at step and task boundaries.
#[async_trait]
pub trait TaskHook: Send + Sync {
    /// A step is about to run.
    async fn transition_step(
        &self,
        task: &Task,
        step_name: &str,
        step_index: usize,
    ) -> Result<(), HookError>;

    /// Begin emitting intermediate checkpoints for the running step.
    async fn start_interval_checkpointing(&self, task: &Task) -> Result<(), HookError>;

    /// Stop emitting intermediate checkpoints. Paired with every step
    /// completion or failure.
    async fn stop_interval_checkpointing(&self, task: &Task) -> Result<(), HookError>;

    async fn complete_step(
        &self,
        task: &Task,
        step_name: &str,
        files_changed: u32,
    ) -> Result<(), HookError>;

    /// A step failed recoverably; resume remains valid.
    async fn fail_step(&self, task: &Task, step_name: &str, error: &str) -> Result<(), HookError>;

    /// A step was interrupted by user cancellation.
    async fn interrupt_step(&self, task: &Task, step_name: &str) -> Result<(), HookError>;

    /// The task reached terminal success.
    async fn complete_task(&self, task: &Task) -> Result<(), HookError>;

    /// The task failed terminally (abandon).
    async fn fail_task(&self, task: &Task, error: &str) -> Result<(), HookError>;
}

/// Hook that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

#[async_trait]
impl TaskHook for NoopHook {
    async fn transition_step(
        &self,
        _task: &Task,
        _step_name: &str,
        _step_index: usize,
    ) -> Result<(), HookError> {
        Ok(())
    }

    async fn start_interval_checkpointing(&self, _task: &Task) -> Result<(), HookError> {
        Ok(())
    }

    async fn stop_interval_checkpointing(&self, _task: &Task) -> Result<(), HookError> {
        Ok(())
    }

    async fn complete_step(
        &self,
        _task: &Task,
        _step_name: &str,
        _files_changed: u32,
    ) -> Result<(), HookError> {
        Ok(())
    }

    async fn fail_step(
        &self,
        _task: &Task,
        _step_name: &str,
        _error: &str,
    ) -> Result<(), HookError> {
        Ok(())
    }

    async fn interrupt_step(&self, _task: &Task, _step_name: &str) -> Result<(), HookError> {
        Ok(())
    }

    async fn complete_task(&self, _task: &Task) -> Result<(), HookError> {
        Ok(())
    }

    async fn fail_task(&self, _task: &Task, _error: &str) -> Result<(), HookError> {
        Ok(())
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded hook invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HookCall {
        TransitionStep { step: String, index: usize },
        StartIntervalCheckpointing,
        StopIntervalCheckpointing,
        CompleteStep { step: String, files_changed: u32 },
        FailStep { step: String, error: String },
        InterruptStep { step: String },
        CompleteTask,
        FailTask { error: String },
    }

    /// Fake hook that records calls; optionally fails every call to
    /// exercise the best-effort swallowing.
    #[derive(Clone, Default)]
    pub struct FakeHook {
        calls: Arc<Mutex<Vec<HookCall>>>,
        failing: bool,
    }

    impl FakeHook {
        pub fn new() -> Self {
            Self::default()
        }

        /// A hook whose every call errors.
        pub fn failing() -> Self {
            Self {
                calls: Arc::default(),
                failing: true,
            }
        }

        pub fn calls(&self) -> Vec<HookCall> {
            self.calls.lock().clone()
        }

        fn record(&self, call: HookCall) -> Result<(), HookError> {
            self.calls.lock().push(call);
            if self.failing {
                Err(HookError("induced failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaskHook for FakeHook {
        async fn transition_step(
            &self,
            _task: &Task,
            step_name: &str,
            step_index: usize,
        ) -> Result<(), HookError> {
            self.record(HookCall::TransitionStep {
                step: step_name.to_string(),
                index: step_index,
            })
        }

        async fn start_interval_checkpointing(&self, _task: &Task) -> Result<(), HookError> {
            self.record(HookCall::StartIntervalCheckpointing)
        }

        async fn stop_interval_checkpointing(&self, _task: &Task) -> Result<(), HookError> {
            self.record(HookCall::StopIntervalCheckpointing)
        }

        async fn complete_step(
            &self,
            _task: &Task,
            step_name: &str,
            files_changed: u32,
        ) -> Result<(), HookError> {
            self.record(HookCall::CompleteStep {
                step: step_name.to_string(),
                files_changed,
            })
        }

        async fn fail_step(
            &self,
            _task: &Task,
            step_name: &str,
            error: &str,
        ) -> Result<(), HookError> {
            self.record(HookCall::FailStep {
                step: step_name.to_string(),
                error: error.to_string(),
            })
        }

        async fn interrupt_step(&self, _task: &Task, step_name: &str) -> Result<(), HookError> {
            self.record(HookCall::InterruptStep {
                step: step_name.to_string(),
            })
        }

        async fn complete_task(&self, _task: &Task) -> Result<(), HookError> {
            self.record(HookCall::CompleteTask)
        }

        async fn fail_task(&self, _task: &Task, error: &str) -> Result<(), HookError> {
            self.record(HookCall::FailTask {
                error: error.to_string(),
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeHook, HookCall};
