// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step executor interface.
//!
//! Executors are external collaborators: the engine only needs them to run
//! one step and report a [`StepResult`]. The orchestrator owns all
//! bookkeeping — it overwrites the result's index, name, timestamps, and
//! duration — so executors only fill in status, output, error, and
//! metadata (including `failure_type` for classified failures).

use async_trait::async_trait;
use atlas_core::{StepDefinition, StepKind, StepResult, Task};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A hard executor failure that produced no result.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

/// Runs steps of one kind.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// The step kind this executor handles.
    fn kind(&self) -> StepKind;

    /// Execute one step. Must honor the cancellation token.
    async fn execute(
        &self,
        cancel: &CancellationToken,
        task: &Task,
        step: &StepDefinition,
    ) -> Result<StepResult, StepError>;
}
