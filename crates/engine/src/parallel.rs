// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parallel step groups.
//!
//! A group is a set of template step indices executed concurrently under a
//! shared cancellation scope. The first failure cancels the scope; the
//! remaining workers observe cancellation. Results land in a fixed-index
//! slot vector whose positions match the group's order, so a partial
//! outcome is still attributable. The task's per-step records are not
//! mutated here; parallel execution uses the internal path that leaves
//! bookkeeping to the caller.

use crate::error::EngineError;
use crate::executor::StepError;
use crate::orchestrator::Orchestrator;
use atlas_core::{Clock, StepResult, StepResultStatus, Task, Template};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of a parallel group: the populated (possibly partial) slot
/// vector plus the first error, if any.
#[derive(Debug)]
pub struct ParallelOutcome {
    pub results: Vec<Option<StepResult>>,
    pub error: Option<EngineError>,
}

impl<C: Clock> Orchestrator<C> {
    /// Execute the steps at `indices` concurrently.
    pub async fn execute_parallel_group(
        &self,
        task: &Task,
        template: &Template,
        indices: &[usize],
        cancel: &CancellationToken,
    ) -> ParallelOutcome {
        let scope = cancel.child_token();
        let slots: Arc<Mutex<Vec<Option<StepResult>>>> =
            Arc::new(Mutex::new(vec![None; indices.len()]));
        let first_error: Arc<Mutex<Option<EngineError>>> = Arc::new(Mutex::new(None));
        let shared_task = Arc::new(task.clone());

        let mut workers = JoinSet::new();
        for (slot, &index) in indices.iter().enumerate() {
            let Some(step) = template.steps.get(index).cloned() else {
                record_error(
                    &first_error,
                    EngineError::EmptyValue(format!("step index {index} out of range")),
                    &scope,
                );
                continue;
            };
            let Some(executor) = self.registry.get(step.kind).cloned() else {
                record_error(&first_error, EngineError::ExecutorNotFound(step.kind), &scope);
                continue;
            };

            let scope = scope.clone();
            let slots = Arc::clone(&slots);
            let first_error = Arc::clone(&first_error);
            let shared_task = Arc::clone(&shared_task);
            let clock = self.clock.clone();

            workers.spawn(async move {
                let started = clock.now();
                match executor.execute(&scope, &shared_task, &step).await {
                    Ok(mut result) => {
                        let finished = clock.now();
                        result.step_index = index;
                        result.name = step.name.clone();
                        result.started_at = started;
                        result.completed_at = finished;
                        result.duration_ms =
                            (finished - started).num_milliseconds().max(0) as u64;

                        if result.status == StepResultStatus::Failed {
                            let message = result
                                .error
                                .clone()
                                .unwrap_or_else(|| "step failed".to_string());
                            record_error(
                                &first_error,
                                EngineError::StepFailed {
                                    step: step.name.clone(),
                                    message,
                                },
                                &scope,
                            );
                        }
                        slots.lock()[slot] = Some(result);
                    }
                    Err(StepError::Cancelled) => {
                        record_error(&first_error, EngineError::Cancelled, &scope);
                    }
                    Err(StepError::Failed(message)) => {
                        record_error(
                            &first_error,
                            EngineError::StepFailed {
                                step: step.name.clone(),
                                message,
                            },
                            &scope,
                        );
                    }
                }
            });
        }

        while workers.join_next().await.is_some() {}

        let results = std::mem::take(&mut *slots.lock());
        let error = first_error.lock().take();
        ParallelOutcome { results, error }
    }
}

/// Keep the first error only; any error cancels the shared scope.
fn record_error(
    first_error: &Arc<Mutex<Option<EngineError>>>,
    error: EngineError,
    scope: &CancellationToken,
) {
    let mut slot = first_error.lock();
    if slot.is_none() {
        *slot = Some(error);
    }
    scope.cancel();
}

#[cfg(test)]
#[path = "parallel_tests.rs"]
mod tests;
