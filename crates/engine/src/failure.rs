// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure router: classified step failures to error states.
//!
//! Step executors tag failed results with `failure_type`. Each known tag
//! gets its own transition and remediation context; unknown or missing
//! tags fall back to the generic kind-based transition in the dispatcher.

use crate::error::EngineError;
use crate::orchestrator::Orchestrator;
use crate::retry;
use atlas_core::metadata::keys;
use atlas_core::{
    CiWatchResult, Clock, FailureKind, StepDefinition, StepResult, Task, TaskStatus,
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Error-string prefix a git executor uses to carry a push failure
/// sub-classification (e.g. `gh_failed: non_fast_forward`).
const GH_FAILED_PREFIX: &str = "gh_failed: ";

/// What the router did with a failed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouteOutcome {
    /// Transitioned the task; the error is absorbed.
    Routed(TaskStatus),
    /// No recognized classification; the dispatcher falls back.
    NotHandled,
}

impl<C: Clock> Orchestrator<C> {
    /// Route a classified failure. On a match this transitions the task,
    /// records remediation context, reports the recoverable failure, and
    /// persists. Cancellation during handling still persists the
    /// transition before surfacing.
    pub(crate) async fn route_failure(
        &self,
        task: &mut Task,
        result: &StepResult,
        step: &StepDefinition,
        cancel: &CancellationToken,
    ) -> Result<RouteOutcome, EngineError> {
        let Some(kind) = result.metadata.failure_kind() else {
            return Ok(RouteOutcome::NotHandled);
        };
        let message = result
            .error
            .clone()
            .unwrap_or_else(|| format!("step '{}' failed", step.name));

        let target = match kind {
            FailureKind::CiFailed => {
                self.stash_ci_result(task, result, keys::CI_FAILURE_RESULT);
                retry::record_error_context(task, &step.name, &message);
                self.transition(task, TaskStatus::CiFailed, None)?;
                self.report_recoverable(task, &step.name, &message).await;
                TaskStatus::CiFailed
            }
            FailureKind::CiTimeout => {
                self.stash_ci_result(task, result, keys::CI_TIMEOUT_RESULT);
                retry::record_error_context(task, &step.name, &message);
                self.transition(task, TaskStatus::CiTimeout, None)?;
                self.report_recoverable(task, &step.name, &message).await;
                TaskStatus::CiTimeout
            }
            FailureKind::GhFailed => {
                retry::record_error_context(task, &step.name, &message);
                if let Some(suffix) = message.strip_prefix(GH_FAILED_PREFIX) {
                    task.metadata.set_str(keys::PUSH_ERROR_TYPE, suffix);
                }
                self.transition(task, TaskStatus::GhFailed, None)?;
                self.report_recoverable(task, &step.name, &message).await;
                TaskStatus::GhFailed
            }
            FailureKind::CiFetchError => {
                // CI state could not be fetched at all: surface the task to
                // the human gate instead of an error state.
                task.metadata.set_flag(keys::CI_FETCH_ERROR);
                let original = result
                    .metadata
                    .str_value(keys::ORIGINAL_ERROR)
                    .unwrap_or(&message)
                    .to_string();
                task.metadata.set_str(keys::LAST_ERROR, original);
                if task.status == TaskStatus::Running {
                    self.transition(task, TaskStatus::Validating, None)?;
                }
                self.transition(task, TaskStatus::AwaitingApproval, None)?;
                TaskStatus::AwaitingApproval
            }
        };

        self.checkpoint_best_effort(task, cancel);
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(RouteOutcome::Routed(target))
    }

    /// Copy the CI watch result off the step result into task metadata.
    fn stash_ci_result(&self, task: &mut Task, result: &StepResult, key: &str) {
        let Some(watch) = result.metadata.json_value::<CiWatchResult>(keys::CI_RESULT) else {
            return;
        };
        if let Err(error) = task.metadata.set_json(key, &watch) {
            warn!(task = %task.id, %error, "failed to store CI result");
        }
    }

    async fn report_recoverable(&self, task: &Task, step_name: &str, message: &str) {
        if let Err(error) = self.hook.fail_step(task, step_name, message).await {
            warn!(task = %task.id, %error, "fail_step hook failed");
        }
    }
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
