// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workspace, per-task persistence.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/workspaces/<workspace>/tasks/<taskID>/
//!     task.json            # canonical task document
//!     log.jsonl            # append-only event log
//!     artifacts/<file>     # artifact files
//! <base>/workspaces/<workspace>/tasks/<taskID>.lock
//! ```
//!
//! The lock file sits beside the task directory rather than inside it, so
//! `delete` can hold the lock across the directory removal without racing
//! another acquirer on a freshly unlinked lock file.

use crate::atomic::{create_dir_private, write_atomic};
use crate::error::StoreError;
use crate::lock::TaskLock;
use atlas_core::{Clock, SystemClock, Task, TaskId, SCHEMA_VERSION};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Highest version index `save_versioned_artifact` will probe.
const MAX_ARTIFACT_VERSIONS: u32 = 10_000;

/// Filesystem store for tasks, rooted at a base directory.
///
/// The store itself is cheap to clone; every operation acquires the
/// per-task lock for its own duration only.
#[derive(Debug, Clone)]
pub struct TaskStore<C: Clock = SystemClock> {
    base: PathBuf,
    clock: C,
}

impl TaskStore<SystemClock> {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            clock: SystemClock,
        }
    }

    /// The conventional base directory: `<home>/.atlas`.
    pub fn default_base() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".atlas"))
    }
}

impl<C: Clock> TaskStore<C> {
    pub fn with_clock(base: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            base: base.into(),
            clock,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn tasks_dir(&self, workspace: &str) -> PathBuf {
        self.base.join("workspaces").join(workspace).join("tasks")
    }

    fn task_dir(&self, workspace: &str, id: &TaskId) -> PathBuf {
        self.tasks_dir(workspace).join(id.as_str())
    }

    fn task_file(&self, workspace: &str, id: &TaskId) -> PathBuf {
        self.task_dir(workspace, id).join("task.json")
    }

    fn log_file(&self, workspace: &str, id: &TaskId) -> PathBuf {
        self.task_dir(workspace, id).join("log.jsonl")
    }

    fn artifacts_dir(&self, workspace: &str, id: &TaskId) -> PathBuf {
        self.task_dir(workspace, id).join("artifacts")
    }

    fn lock_path(&self, workspace: &str, id: &TaskId) -> PathBuf {
        self.tasks_dir(workspace).join(format!("{}.lock", id))
    }

    fn lock(
        &self,
        workspace: &str,
        id: &TaskId,
        cancel: &CancellationToken,
    ) -> Result<TaskLock, StoreError> {
        TaskLock::acquire(&self.lock_path(workspace, id), cancel)
    }

    /// Persist a new task. Fails with `TaskExists` if its directory is
    /// already present; rolls the directory back on any later failure.
    pub fn create(
        &self,
        workspace: &str,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let dir = self.task_dir(workspace, &task.id);
        if dir.exists() {
            return Err(StoreError::TaskExists(task.id.clone()));
        }
        create_dir_private(&dir)?;

        let result = (|| {
            let _lock = self.lock(workspace, &task.id, cancel)?;
            let mut doc = task.clone();
            doc.schema_version = SCHEMA_VERSION;
            let bytes = serde_json::to_vec_pretty(&doc)?;
            write_atomic(&self.task_file(workspace, &task.id), &bytes)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_dir_all(&dir);
            let _ = fs::remove_file(self.lock_path(workspace, &task.id));
        }
        result
    }

    /// Load a task. A corrupted document surfaces as a parse error,
    /// distinct from `TaskNotFound`; a foreign schema version is refused.
    pub fn get(
        &self,
        workspace: &str,
        id: &TaskId,
        cancel: &CancellationToken,
    ) -> Result<Task, StoreError> {
        let path = self.task_file(workspace, id);
        if !path.exists() {
            return Err(StoreError::TaskNotFound(id.clone()));
        }
        let _lock = self.lock(workspace, id, cancel)?;

        let bytes = fs::read(&path)?;
        let task: Task = serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;
        if task.schema_version != SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: task.schema_version,
            });
        }
        Ok(task)
    }

    /// Rewrite a task document, bumping `updated_at`.
    pub fn update(
        &self,
        workspace: &str,
        task: &mut Task,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let path = self.task_file(workspace, &task.id);
        if !path.exists() {
            return Err(StoreError::TaskNotFound(task.id.clone()));
        }
        let _lock = self.lock(workspace, &task.id, cancel)?;

        task.updated_at = self.clock.now();
        let bytes = serde_json::to_vec_pretty(task)?;
        write_atomic(&path, &bytes)?;
        Ok(())
    }

    /// Remove a task directory and its lock file. Artifacts and logs go
    /// with it; abandonment does not call this.
    pub fn delete(
        &self,
        workspace: &str,
        id: &TaskId,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let dir = self.task_dir(workspace, id);
        if !dir.exists() {
            return Err(StoreError::TaskNotFound(id.clone()));
        }
        {
            // The lock lives beside the directory, so it stays held for
            // the whole removal.
            let _lock = self.lock(workspace, id, cancel)?;
            fs::remove_dir_all(&dir)?;
        }
        if let Err(error) = fs::remove_file(self.lock_path(workspace, id)) {
            warn!(id = %id, %error, "failed to remove lock file after delete");
        }
        Ok(())
    }

    /// All tasks in a workspace, newest first. Directory entries that do
    /// not match the task-ID shape are ignored; entries that fail to load
    /// are skipped with a warning so one corrupt task cannot hide the rest.
    pub fn list(
        &self,
        workspace: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Task>, StoreError> {
        let dir = self.tasks_dir(workspace);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut tasks = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !TaskId::is_valid_dir_name(&name) {
                continue;
            }
            match self.get(workspace, &TaskId::new(name.as_str()), cancel) {
                Ok(task) => tasks.push(task),
                Err(StoreError::Cancelled) => return Err(StoreError::Cancelled),
                Err(error) => {
                    warn!(task = %name, %error, "skipping unreadable task");
                }
            }
        }
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    /// Append one entry to the task's event log. The entry is
    /// newline-terminated and fsync'd before returning.
    pub fn append_log(
        &self,
        workspace: &str,
        id: &TaskId,
        entry: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let path = self.log_file(workspace, id);
        if !self.task_dir(workspace, id).exists() {
            return Err(StoreError::TaskNotFound(id.clone()));
        }
        let _lock = self.lock(workspace, id, cancel)?;

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(entry.as_bytes())?;
        if !entry.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        file.sync_all()?;
        Ok(())
    }

    /// Write an artifact atomically under the task's artifacts directory.
    pub fn save_artifact(
        &self,
        workspace: &str,
        id: &TaskId,
        filename: &str,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<PathBuf, StoreError> {
        validate_artifact_name(filename)?;
        if !self.task_dir(workspace, id).exists() {
            return Err(StoreError::TaskNotFound(id.clone()));
        }
        let _lock = self.lock(workspace, id, cancel)?;

        let path = self.artifacts_dir(workspace, id).join(filename);
        write_atomic(&path, data)?;
        Ok(path)
    }

    /// Write an artifact under the lowest free versioned name
    /// `<stem>.N<ext>` (N ≥ 1) and return the chosen filename.
    pub fn save_versioned_artifact(
        &self,
        workspace: &str,
        id: &TaskId,
        base_name: &str,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<String, StoreError> {
        validate_artifact_name(base_name)?;
        if !self.task_dir(workspace, id).exists() {
            return Err(StoreError::TaskNotFound(id.clone()));
        }
        let _lock = self.lock(workspace, id, cancel)?;

        let (stem, ext) = split_base_name(base_name);
        let dir = self.artifacts_dir(workspace, id);
        for n in 1..=MAX_ARTIFACT_VERSIONS {
            let candidate = format!("{stem}.{n}{ext}");
            let path = dir.join(&candidate);
            if !path.exists() {
                write_atomic(&path, data)?;
                return Ok(candidate);
            }
        }
        Err(StoreError::TooManyVersions {
            base: base_name.to_string(),
            limit: MAX_ARTIFACT_VERSIONS,
        })
    }

    /// Read an artifact back.
    pub fn get_artifact(
        &self,
        workspace: &str,
        id: &TaskId,
        filename: &str,
    ) -> Result<Vec<u8>, StoreError> {
        validate_artifact_name(filename)?;
        let path = self.artifacts_dir(workspace, id).join(filename);
        if !path.exists() {
            return Err(StoreError::ArtifactNotFound(filename.to_string()));
        }
        Ok(fs::read(&path)?)
    }

    /// Names of all artifacts for a task, sorted.
    pub fn list_artifacts(&self, workspace: &str, id: &TaskId) -> Result<Vec<String>, StoreError> {
        let dir = self.artifacts_dir(workspace, id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Reject artifact names that could escape the artifacts directory.
fn validate_artifact_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(StoreError::PathTraversal(name.to_string()));
    }
    Ok(())
}

/// Split `report.md` into `("report", ".md")`; extensionless names keep
/// an empty suffix.
fn split_base_name(base: &str) -> (&str, &str) {
    match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], &base[idx..]),
        _ => (base, ""),
    }
}

#[cfg(test)]
#[path = "store_tests/mod.rs"]
mod tests;
