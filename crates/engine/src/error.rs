// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use atlas_adapters::BrowserError;
use atlas_core::{StepKind, TransitionError};
use atlas_storage::StoreError;
use thiserror::Error;

/// Errors that can occur while orchestrating a task
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("no executor registered for step kind: {0}")]
    ExecutorNotFound(StepKind),
    #[error("unknown step result status from step '{step}'")]
    UnknownStepResultStatus { step: String },
    #[error("required value missing: {0}")]
    EmptyValue(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },
    #[error("checkpoint failed for task {task}: {source}")]
    Checkpoint {
        task: String,
        #[source]
        source: StoreError,
    },
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether this error stems from a fired cancellation token, at any
    /// layer.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            EngineError::Cancelled | EngineError::Store(StoreError::Cancelled)
        )
    }
}
