// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-action processors.
//!
//! Each attention-requiring error status exposes a fixed menu of user
//! actions; every action maps to a deterministic processor. Processors
//! check cancellation at entry and persist the task on success.

use crate::error::EngineError;
use crate::orchestrator::Orchestrator;
use crate::retry;
use atlas_core::metadata::keys;
use atlas_core::{CiResultArtifact, CiWatchResult, Clock, StepKind, Task, TaskStatus};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Key under which an AI analysis of the failure may ride on a failed
/// result; `retry_implement` carries it into the retry context.
const ERROR_CONTEXT: &str = "error_context";

/// Error for parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

/// Remediations for a task in `ci_failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiFailureAction {
    ViewLogs,
    RetryImplement,
    FixManually,
    Abandon,
}

impl CiFailureAction {
    pub const MENU: [CiFailureAction; 4] = [
        Self::ViewLogs,
        Self::RetryImplement,
        Self::FixManually,
        Self::Abandon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ViewLogs => "view_logs",
            Self::RetryImplement => "retry_implement",
            Self::FixManually => "fix_manually",
            Self::Abandon => "abandon",
        }
    }
}

impl FromStr for CiFailureAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::MENU
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Remediations for a task in `gh_failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhFailureAction {
    Retry,
    FixAndRetry,
    Abandon,
}

impl GhFailureAction {
    pub const MENU: [GhFailureAction; 3] = [Self::Retry, Self::FixAndRetry, Self::Abandon];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::FixAndRetry => "fix_and_retry",
            Self::Abandon => "abandon",
        }
    }
}

impl FromStr for GhFailureAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::MENU
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Remediations for a task in `ci_timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiTimeoutAction {
    ContinueWaiting,
    Retry,
    FixManually,
    Abandon,
}

impl CiTimeoutAction {
    pub const MENU: [CiTimeoutAction; 4] = [
        Self::ContinueWaiting,
        Self::Retry,
        Self::FixManually,
        Self::Abandon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContinueWaiting => "continue_waiting",
            Self::Retry => "retry",
            Self::FixManually => "fix_manually",
            Self::Abandon => "abandon",
        }
    }
}

impl FromStr for CiTimeoutAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::MENU
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// The action menu shown for an attention status. Approval and plain
/// resume/abandon states have no dedicated processors.
pub fn action_menu(status: TaskStatus) -> &'static [&'static str] {
    match status {
        TaskStatus::CiFailed => &["view_logs", "retry_implement", "fix_manually", "abandon"],
        TaskStatus::GhFailed => &["retry", "fix_and_retry", "abandon"],
        TaskStatus::CiTimeout => &["continue_waiting", "retry", "fix_manually", "abandon"],
        _ => &[],
    }
}

impl<C: Clock> Orchestrator<C> {
    /// Process a user remediation for a `ci_failed` task.
    pub async fn process_ci_failure_action(
        &self,
        task: &mut Task,
        action: CiFailureAction,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        match action {
            CiFailureAction::ViewLogs => {
                let watch: CiWatchResult = task
                    .metadata
                    .json_value(keys::CI_FAILURE_RESULT)
                    .ok_or_else(|| EngineError::EmptyValue("ci_failure_result".to_string()))?;
                let url = watch
                    .best_url()
                    .ok_or_else(|| EngineError::EmptyValue("check url".to_string()))?
                    .to_string();
                self.browser.open(&url)?;
                self.write_ci_artifact_best_effort(task, keys::CI_FAILURE_RESULT);
            }
            CiFailureAction::RetryImplement => {
                self.jump_to_implement(task);
                self.write_ci_artifact_best_effort(task, keys::CI_FAILURE_RESULT);
                self.transition(task, TaskStatus::Running, None)?;
            }
            CiFailureAction::FixManually => {
                let text = manual_fix_instructions(task);
                task.metadata.set_str(keys::MANUAL_FIX_INSTRUCTIONS, text);
                self.write_ci_artifact_best_effort(task, keys::CI_FAILURE_RESULT);
            }
            CiFailureAction::Abandon => {
                return self.abandon(task, "abandoned after CI failure", false, cancel).await;
            }
        }
        self.checkpoint(task, cancel)?;
        Ok(())
    }

    /// Process a user remediation for a `gh_failed` task.
    pub async fn process_gh_failure_action(
        &self,
        task: &mut Task,
        action: GhFailureAction,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        match action {
            GhFailureAction::Retry => {
                self.transition(task, TaskStatus::Running, None)?;
            }
            GhFailureAction::FixAndRetry => {
                task.metadata.set_flag(keys::AWAITING_MANUAL_FIX);
            }
            GhFailureAction::Abandon => {
                return self
                    .abandon(task, "abandoned after push failure", false, cancel)
                    .await;
            }
        }
        self.checkpoint(task, cancel)?;
        Ok(())
    }

    /// Process a user remediation for a `ci_timeout` task.
    pub async fn process_ci_timeout_action(
        &self,
        task: &mut Task,
        action: CiTimeoutAction,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        match action {
            CiTimeoutAction::ContinueWaiting => {
                task.metadata.set_flag(keys::EXTENDED_CI_TIMEOUT);
                self.transition(task, TaskStatus::Running, None)?;
            }
            CiTimeoutAction::Retry => {
                self.jump_to_implement(task);
                self.write_ci_artifact_best_effort(task, keys::CI_TIMEOUT_RESULT);
                self.transition(task, TaskStatus::Running, None)?;
            }
            CiTimeoutAction::FixManually => {
                let text = manual_fix_instructions(task);
                task.metadata.set_str(keys::MANUAL_FIX_INSTRUCTIONS, text);
                self.write_ci_artifact_best_effort(task, keys::CI_TIMEOUT_RESULT);
            }
            CiTimeoutAction::Abandon => {
                return self
                    .abandon(task, "abandoned after CI timeout", false, cancel)
                    .await;
            }
        }
        self.checkpoint(task, cancel)?;
        Ok(())
    }

    /// Write the CI result artifact for a task. `EmptyValue` when no
    /// directory is configured or no result is supplied.
    pub fn write_ci_result_artifact(
        &self,
        watch: Option<&CiWatchResult>,
    ) -> Result<PathBuf, EngineError> {
        let dir = self
            .config
            .ci_artifact_dir
            .as_ref()
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(|| EngineError::EmptyValue("ci artifact directory".to_string()))?;
        let watch = watch.ok_or_else(|| EngineError::EmptyValue("ci result".to_string()))?;

        let artifact = CiResultArtifact::from_watch(watch, self.clock.now());
        let bytes = serde_json::to_vec_pretty(&artifact)?;
        let path = dir.join("ci-result.json");
        atlas_storage::write_atomic(&path, &bytes)
            .map_err(|e| EngineError::Store(e.into()))?;
        Ok(path)
    }

    /// Rewind the task to its implement step: the step named `implement`,
    /// else the first AI step, else index 0.
    fn jump_to_implement(&self, task: &mut Task) {
        let index = task
            .step_index_named("implement")
            .or_else(|| task.first_step_of_kind(StepKind::Ai))
            .unwrap_or(0);
        task.current_step = index;

        // Carry the failure analysis into the retry context the AI step
        // reads on its next attempt.
        let extracted = task
            .failed_results()
            .last()
            .and_then(|r| r.metadata.str_value(ERROR_CONTEXT))
            .map(str::to_string);
        match extracted {
            Some(context) => task.metadata.set_str(keys::RETRY_CONTEXT, context),
            None => {
                let error = task
                    .metadata
                    .str_value(keys::LAST_ERROR)
                    .unwrap_or("ci failure")
                    .to_string();
                let step_name = task
                    .steps
                    .get(index)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                retry::record_error_context(task, &step_name, &error);
            }
        }
    }

    fn write_ci_artifact_best_effort(&self, task: &Task, key: &str) {
        if self.config.ci_artifact_dir.is_none() {
            return;
        }
        let watch = task.metadata.json_value::<CiWatchResult>(key);
        match self.write_ci_result_artifact(watch.as_ref()) {
            Ok(path) => info!(task = %task.id, path = %path.display(), "wrote CI result artifact"),
            Err(error) => warn!(task = %task.id, %error, "failed to write CI result artifact"),
        }
    }

    /// Best-effort PR-to-draft conversion for an abandoned task.
    pub(crate) async fn convert_pr_to_draft(&self, task: &Task, cancel: &CancellationToken) {
        let Some(forge) = &self.forge else {
            return;
        };
        let Some(number) = task.metadata.u64_value(keys::PR_NUMBER) else {
            return;
        };
        if let Err(error) = forge.convert_to_draft(cancel, number).await {
            warn!(task = %task.id, pr = number, %error, "failed to convert PR to draft");
        }
    }
}

fn manual_fix_instructions(task: &Task) -> String {
    let error = task
        .metadata
        .str_value(keys::LAST_ERROR)
        .unwrap_or("unknown error");
    format!(
        "Manual fix required for task {id} on branch {branch}.\n\n\
         Last error:\n{error}\n\n\
         Push the fix to the task branch, then resume the task to re-run \
         the remaining steps.",
        id = task.id,
        branch = task.metadata.str_value(keys::BRANCH).unwrap_or("unknown"),
    )
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
