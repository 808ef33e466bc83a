// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the task store

use atlas_core::{TaskId, SCHEMA_VERSION};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task already exists: {0}")]
    TaskExists(TaskId),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
    #[error("artifact name escapes the artifacts directory: {0}")]
    PathTraversal(String),
    #[error("timed out acquiring lock: {}", path.display())]
    LockTimeout { path: PathBuf },
    #[error("no free version below {limit} for artifact {base}")]
    TooManyVersions { base: String, limit: u32 },
    #[error("unsupported task schema version {found} (this build reads {SCHEMA_VERSION})")]
    UnsupportedSchema { found: u32 },
    #[error("corrupt task document at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("operation cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
