// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The step orchestrator: one loop driving a template over a task.
//!
//! The loop asks the state machine whether to continue, consults the skip
//! rules, invokes the executor via the registry, feeds the result back
//! through the state machine (directly or via the failure router), notifies
//! observers, then checkpoints through the task store. One task is mutated
//! by exactly one worker; the store lock only serializes cross-process
//! access.

use crate::error::EngineError;
use crate::executor::StepError;
use crate::failure::RouteOutcome;
use crate::hook::{NoopHook, TaskHook};
use crate::progress::{MetricsSink, NoopMetrics, ProgressEventKind, ProgressSink, StepProgressEvent};
use crate::registry::ExecutorRegistry;
use crate::{retry, skip};
use atlas_adapters::{
    BrowserOpener, ForgeRunner, NoOpNotifier, StatusNotifier, SystemBrowser,
};
use atlas_core::metadata::keys;
use atlas_core::{
    Clock, StepDefinition, StepResult, StepResultStatus, SystemClock, Task, TaskConfig, TaskId,
    TaskSettings, TaskStatus, Template, TransitionError,
};
use atlas_storage::{StoreError, TaskStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Engine-level settings.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Where CI failure actions drop `ci-result.json`. Unset disables the
    /// artifact side effect.
    pub ci_artifact_dir: Option<PathBuf>,
}

/// Builder for [`Orchestrator`]. Observers are individually optional and
/// default to no-ops.
pub struct OrchestratorBuilder<C: Clock = SystemClock> {
    store: TaskStore<C>,
    registry: Arc<ExecutorRegistry>,
    clock: C,
    hook: Arc<dyn TaskHook>,
    notifier: Arc<dyn StatusNotifier>,
    progress: Option<Arc<dyn ProgressSink>>,
    metrics: Arc<dyn MetricsSink>,
    forge: Option<Arc<dyn ForgeRunner>>,
    browser: Arc<dyn BrowserOpener>,
    config: OrchestratorConfig,
}

impl<C: Clock> OrchestratorBuilder<C> {
    pub fn with_clock(store: TaskStore<C>, registry: Arc<ExecutorRegistry>, clock: C) -> Self {
        Self {
            store,
            registry,
            clock,
            hook: Arc::new(NoopHook),
            notifier: Arc::new(NoOpNotifier),
            progress: None,
            metrics: Arc::new(NoopMetrics),
            forge: None,
            browser: Arc::new(SystemBrowser::new()),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn hook(mut self, hook: Arc<dyn TaskHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn StatusNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn forge(mut self, forge: Arc<dyn ForgeRunner>) -> Self {
        self.forge = Some(forge);
        self
    }

    pub fn browser(mut self, browser: Arc<dyn BrowserOpener>) -> Self {
        self.browser = browser;
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Orchestrator<C> {
        Orchestrator {
            store: self.store,
            registry: self.registry,
            clock: self.clock,
            hook: self.hook,
            notifier: self.notifier,
            progress: self.progress,
            metrics: self.metrics,
            forge: self.forge,
            browser: self.browser,
            config: self.config,
        }
    }
}

/// Drives templates over tasks. Not safe for concurrent use on the same
/// task; different tasks may be driven concurrently.
pub struct Orchestrator<C: Clock = SystemClock> {
    pub(crate) store: TaskStore<C>,
    pub(crate) registry: Arc<ExecutorRegistry>,
    pub(crate) clock: C,
    pub(crate) hook: Arc<dyn TaskHook>,
    pub(crate) notifier: Arc<dyn StatusNotifier>,
    pub(crate) progress: Option<Arc<dyn ProgressSink>>,
    pub(crate) metrics: Arc<dyn MetricsSink>,
    pub(crate) forge: Option<Arc<dyn ForgeRunner>>,
    pub(crate) browser: Arc<dyn BrowserOpener>,
    pub(crate) config: OrchestratorConfig,
}

impl Orchestrator<SystemClock> {
    pub fn builder(
        store: TaskStore<SystemClock>,
        registry: Arc<ExecutorRegistry>,
    ) -> OrchestratorBuilder<SystemClock> {
        OrchestratorBuilder::with_clock(store, registry, SystemClock)
    }
}

impl<C: Clock> Orchestrator<C> {
    pub fn store(&self) -> &TaskStore<C> {
        &self.store
    }

    /// Create a task from a template and drive it until it completes,
    /// pauses, or fails. Returns the task in its final persisted state.
    pub async fn start(
        &self,
        workspace: &str,
        branch: &str,
        template: &Template,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<Task, EngineError> {
        self.start_with_settings(
            workspace,
            branch,
            template,
            description,
            TaskSettings::default(),
            cancel,
        )
        .await
    }

    pub async fn start_with_settings(
        &self,
        workspace: &str,
        branch: &str,
        template: &Template,
        description: &str,
        settings: TaskSettings,
        cancel: &CancellationToken,
    ) -> Result<Task, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let now = self.clock.now();
        let mut task = Task::new(
            TaskConfig {
                id: TaskId::generate(now),
                workspace: workspace.to_string(),
                template_name: template.name.clone(),
                description: description.to_string(),
                settings,
            },
            template,
            now,
        );
        task.metadata.set_str(keys::BRANCH, branch);

        // Same-second collision: fall back to the millisecond suffix.
        match self.store.create(workspace, &task, cancel) {
            Err(StoreError::TaskExists(_)) => {
                task.id = TaskId::generate_with_millis(now);
                self.store.create(workspace, &task, cancel)?;
            }
            other => other?,
        }
        info!(task = %task.id, %workspace, template = %template.name, "task created");
        self.metrics.task_started();

        self.transition(&mut task, TaskStatus::Running, None)?;
        self.checkpoint(&mut task, cancel)?;

        self.run_loop(&mut task, template, cancel).await?;
        Ok(task)
    }

    /// Continue a persisted task from `current_step`.
    ///
    /// Terminal tasks are refused. Error and approval states transition
    /// back to `running` first; a task stranded in `validating` by a crash
    /// heals through `interrupted`.
    pub async fn resume(
        &self,
        task: &mut Task,
        template: &Template,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if task.status.is_terminal() {
            return Err(TransitionError {
                from: task.status,
                to: TaskStatus::Running,
            }
            .into());
        }

        match task.status {
            TaskStatus::Running => {}
            TaskStatus::Validating => {
                self.transition(task, TaskStatus::Interrupted, None)?;
                self.transition(task, TaskStatus::Running, None)?;
                self.checkpoint(task, cancel)?;
            }
            _ => {
                // Pending, awaiting_approval, and every error state all
                // have a direct edge back to running.
                self.transition(task, TaskStatus::Running, None)?;
                self.checkpoint(task, cancel)?;
            }
        }

        self.run_loop(task, template, cancel).await
    }

    /// Abandon a task, preserving its artifacts and logs. `force` admits
    /// abandoning a running task.
    pub async fn abandon(
        &self,
        task: &mut Task,
        reason: &str,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let allowed = if force {
            task.status.can_force_abandon()
        } else {
            task.status.can_abandon()
        };
        if !allowed {
            return Err(TransitionError {
                from: task.status,
                to: TaskStatus::Abandoned,
            }
            .into());
        }

        self.convert_pr_to_draft(task, cancel).await;
        self.transition(task, TaskStatus::Abandoned, Some(reason.to_string()))?;
        if let Err(error) = self.hook.fail_task(task, reason).await {
            warn!(task = %task.id, %error, "fail_task hook failed");
        }
        self.metrics.task_completed();
        self.checkpoint(task, cancel)?;
        Ok(())
    }

    /// Accept an awaiting-approval task; terminal success.
    pub async fn approve(
        &self,
        task: &mut Task,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        self.transition(task, TaskStatus::Completed, None)?;
        if let Err(error) = self.hook.complete_task(task).await {
            warn!(task = %task.id, %error, "complete_task hook failed");
        }
        self.metrics.task_completed();
        self.checkpoint(task, cancel)?;
        Ok(())
    }

    /// Reject an awaiting-approval task; terminal.
    pub async fn reject(
        &self,
        task: &mut Task,
        reason: &str,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        self.transition(task, TaskStatus::Rejected, Some(reason.to_string()))?;
        self.metrics.task_completed();
        self.checkpoint(task, cancel)?;
        Ok(())
    }

    /// The main loop. Runs until the template is exhausted, the task
    /// pauses in an attention state, or an error surfaces.
    async fn run_loop(
        &self,
        task: &mut Task,
        template: &Template,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        while task.current_step < template.steps.len() {
            if cancel.is_cancelled() {
                let name = template.steps[task.current_step].name.clone();
                if let Err(error) = self.hook.fail_step(task, &name, "cancelled").await {
                    warn!(task = %task.id, %error, "fail_step hook failed");
                }
                return Err(EngineError::Cancelled);
            }
            self.metrics.loop_iteration();

            let step = template.steps[task.current_step].clone();
            if skip::should_skip(task, &step) {
                let now = self.clock.now();
                let index = task.current_step;
                task.skip_step(index, now);
                task.record_result(StepResult {
                    step_index: index,
                    name: step.name.clone(),
                    status: StepResultStatus::Skipped,
                    output: None,
                    error: None,
                    started_at: now,
                    completed_at: now,
                    duration_ms: 0,
                    metadata: Default::default(),
                });
                info!(task = %task.id, step = %step.name, "step skipped");
                task.current_step += 1;
                self.checkpoint(task, cancel)?;
                continue;
            }

            match self.execute_step(task, &step, cancel).await {
                Ok(result) => {
                    self.handle_step_result(task, &result, &step, cancel).await?;
                }
                Err(error) => {
                    self.fail_to_error_state(
                        task,
                        &step,
                        &error.to_string(),
                        error.is_cancelled(),
                        cancel,
                    )
                    .await;
                    return Err(error);
                }
            }

            if self.should_pause(task) {
                if let Err(error) = self.hook.stop_interval_checkpointing(task).await {
                    warn!(task = %task.id, %error, "stop_interval_checkpointing hook failed");
                }
                self.checkpoint(task, cancel)?;
                return Ok(());
            }

            task.current_step += 1;
            self.checkpoint(task, cancel)?;
        }

        self.complete_task(task, cancel).await
    }

    /// Execute the step at `task.current_step`. Mutates the task's step
    /// record and appends the result; the task's status is left to
    /// [`Orchestrator::handle_step_result`].
    pub async fn execute_step(
        &self,
        task: &mut Task,
        step: &StepDefinition,
        cancel: &CancellationToken,
    ) -> Result<StepResult, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let index = task.current_step;
        let executor = self
            .registry
            .get(step.kind)
            .cloned()
            .ok_or(EngineError::ExecutorNotFound(step.kind))?;

        let started = self.clock.now();
        task.begin_step(index, started);
        if let Err(error) = self.hook.transition_step(task, &step.name, index).await {
            warn!(task = %task.id, %error, "transition_step hook failed");
        }
        if let Err(error) = self.hook.start_interval_checkpointing(task).await {
            warn!(task = %task.id, %error, "start_interval_checkpointing hook failed");
        }
        self.emit_progress(ProgressEventKind::Start, task, step, None);
        self.checkpoint(task, cancel)?;

        info!(task = %task.id, step = %step.name, kind = %step.kind, attempt = task.steps.get(index).map_or(1, |s| s.attempts), "executing step");
        let outcome = executor.execute(cancel, task, step).await;
        let finished = self.clock.now();
        let duration_ms = (finished - started).num_milliseconds().max(0) as u64;

        match outcome {
            Ok(mut result) => {
                // The orchestrator owns the bookkeeping fields.
                result.step_index = index;
                result.name = step.name.clone();
                result.started_at = started;
                result.completed_at = finished;
                result.duration_ms = duration_ms;

                match result.status {
                    StepResultStatus::Failed => {
                        let message = result
                            .error
                            .clone()
                            .unwrap_or_else(|| "step failed".to_string());
                        task.fail_step(index, message, finished);
                    }
                    StepResultStatus::Skipped => task.skip_step(index, finished),
                    StepResultStatus::Unknown => {}
                    _ => task.complete_step(index, finished),
                }
                task.record_result(result.clone());

                self.metrics.step_executed(step.kind, result.status, duration_ms);
                self.emit_progress(ProgressEventKind::Complete, task, step, Some(&result));
                if matches!(
                    result.status,
                    StepResultStatus::Success | StepResultStatus::NoChanges
                ) {
                    let files_changed = result
                        .metadata
                        .u64_value(keys::FILES_CHANGED)
                        .unwrap_or(0) as u32;
                    if let Err(error) =
                        self.hook.complete_step(task, &step.name, files_changed).await
                    {
                        warn!(task = %task.id, %error, "complete_step hook failed");
                    }
                }
                if let Err(error) = self.hook.stop_interval_checkpointing(task).await {
                    warn!(task = %task.id, %error, "stop_interval_checkpointing hook failed");
                }
                Ok(result)
            }
            Err(StepError::Cancelled) => {
                task.fail_step(index, "cancelled", finished);
                if let Err(error) = self.hook.stop_interval_checkpointing(task).await {
                    warn!(task = %task.id, %error, "stop_interval_checkpointing hook failed");
                }
                Err(EngineError::Cancelled)
            }
            Err(StepError::Failed(message)) => {
                task.fail_step(index, &message, finished);
                if let Err(error) = self.hook.stop_interval_checkpointing(task).await {
                    warn!(task = %task.id, %error, "stop_interval_checkpointing hook failed");
                }
                Err(EngineError::StepFailed {
                    step: step.name.clone(),
                    message,
                })
            }
        }
    }

    /// Dispatch on a step result's status.
    pub async fn handle_step_result(
        &self,
        task: &mut Task,
        result: &StepResult,
        step: &StepDefinition,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        match result.status {
            StepResultStatus::Success | StepResultStatus::Skipped => Ok(()),
            StepResultStatus::NoChanges => {
                // Later push / create_pr steps become pointless.
                task.metadata.set_flag(keys::SKIP_GIT_STEPS);
                Ok(())
            }
            StepResultStatus::AwaitingApproval => {
                if task.status == TaskStatus::Running {
                    self.transition(task, TaskStatus::Validating, None)?;
                }
                self.transition(task, TaskStatus::AwaitingApproval, None)?;
                Ok(())
            }
            StepResultStatus::Failed => {
                let message = result
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("step '{}' failed", step.name));
                match self.route_failure(task, result, step, cancel).await? {
                    RouteOutcome::Routed(_) => Ok(()),
                    RouteOutcome::NotHandled => {
                        self.fail_to_error_state(task, step, &message, false, cancel).await;
                        Err(EngineError::StepFailed {
                            step: step.name.clone(),
                            message,
                        })
                    }
                }
            }
            StepResultStatus::Unknown => Err(EngineError::UnknownStepResultStatus {
                step: step.name.clone(),
            }),
        }
    }

    /// Template exhausted: hand the task to the human gate.
    async fn complete_task(
        &self,
        task: &mut Task,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        self.transition(task, TaskStatus::Validating, None)?;
        self.transition(task, TaskStatus::AwaitingApproval, None)?;
        self.checkpoint(task, cancel)?;
        if let Err(error) = self.hook.complete_task(task).await {
            warn!(task = %task.id, %error, "complete_task hook failed");
        }
        Ok(())
    }

    fn should_pause(&self, task: &Task) -> bool {
        task.status != TaskStatus::Running
    }

    /// Apply a transition and let the notifier see the edge. The notifier
    /// is best-effort.
    pub(crate) fn transition(
        &self,
        task: &mut Task,
        to: TaskStatus,
        reason: Option<String>,
    ) -> Result<(), EngineError> {
        let from = task.status;
        task.apply_transition(to, reason, self.clock.now())?;
        info!(task = %task.id, %from, %to, "transition");
        if let Err(error) = self.notifier.task_transition(task, from, to) {
            warn!(task = %task.id, %error, "notifier failed");
        }
        Ok(())
    }

    /// Move a failed task into its error state: record the retry context,
    /// transition (through `validating` where the graph demands it), report
    /// the recoverable failure or interruption, and persist best-effort.
    /// The caller returns its own original error.
    pub(crate) async fn fail_to_error_state(
        &self,
        task: &mut Task,
        step: &StepDefinition,
        message: &str,
        interrupted: bool,
        cancel: &CancellationToken,
    ) {
        let target = if interrupted {
            TaskStatus::Interrupted
        } else {
            step.kind.error_status()
        };
        retry::record_error_context(task, &step.name, message);

        let transitioned = if target == TaskStatus::ValidationFailed
            && task.status == TaskStatus::Running
        {
            self.transition(task, TaskStatus::Validating, None)
                .and_then(|()| self.transition(task, TaskStatus::ValidationFailed, None))
        } else {
            self.transition(task, target, None)
        };
        if let Err(error) = transitioned {
            warn!(task = %task.id, %target, %error, "error transition failed");
        }

        let hooked = if interrupted {
            self.hook.interrupt_step(task, &step.name).await
        } else {
            self.hook.fail_step(task, &step.name, message).await
        };
        if let Err(error) = hooked {
            warn!(task = %task.id, %error, "failure hook failed");
        }

        self.checkpoint_best_effort(task, cancel);
    }

    /// Persist the task; a failure here aborts the advance loop.
    pub(crate) fn checkpoint(
        &self,
        task: &mut Task,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let workspace = task.workspace.clone();
        self.store
            .update(&workspace, task, cancel)
            .map_err(|source| match source {
                StoreError::Cancelled => EngineError::Cancelled,
                source => EngineError::Checkpoint {
                    task: task.id.to_string(),
                    source,
                },
            })
    }

    /// Persist the task inside an error handler; failures are logged and
    /// the original error wins.
    pub(crate) fn checkpoint_best_effort(&self, task: &mut Task, cancel: &CancellationToken) {
        if let Err(error) = self.checkpoint(task, cancel) {
            warn!(task = %task.id, %error, "checkpoint failed during error handling");
        }
    }

    fn emit_progress(
        &self,
        kind: ProgressEventKind,
        task: &Task,
        step: &StepDefinition,
        result: Option<&StepResult>,
    ) {
        let Some(progress) = &self.progress else {
            return;
        };
        let event = StepProgressEvent {
            kind,
            task_id: task.id.to_string(),
            workspace: task.workspace.clone(),
            step_index: task.current_step,
            total_steps: task.steps.len(),
            step_name: step.name.clone(),
            step_kind: step.kind,
            agent: task.settings.agent.clone(),
            model: task.settings.model.clone(),
            status: result.map(|r| r.status.to_string()),
            duration_ms: result.map(|r| r.duration_ms),
            turns: result.and_then(|r| r.metadata.u64_value(keys::TURNS)),
            files_changed: result.and_then(|r| r.metadata.u64_value(keys::FILES_CHANGED)),
            output: result.and_then(|r| r.output.clone()),
        };
        progress.step_progress(&event);
    }
}

#[cfg(test)]
#[path = "orchestrator_tests/mod.rs"]
mod tests;
