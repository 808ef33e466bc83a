// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory exclusive file lock with polled acquisition.
//!
//! Locks serialize cross-process access to a single task. Acquisition
//! retries every [`LOCK_RETRY_INTERVAL`] until [`LOCK_TIMEOUT`] elapses,
//! checking the caller's cancellation token between attempts. The lock is
//! released on drop; a release failure is logged, never propagated.

use crate::error::StoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// How often acquisition retries a held lock.
pub(crate) const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// How long acquisition keeps retrying before giving up.
pub(crate) const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// An acquired exclusive lock. Held for the duration of a single store
/// operation, never across step execution.
#[derive(Debug)]
pub struct TaskLock {
    file: File,
    path: PathBuf,
}

impl TaskLock {
    /// Acquire the lock at `path`, creating the lock file if needed.
    pub fn acquire(path: &Path, cancel: &CancellationToken) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            crate::atomic::create_dir_private(parent)?;
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(path)?;

        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            match file.try_lock_exclusive() {
                Ok(()) => {
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    })
                }
                Err(_) if Instant::now() + LOCK_RETRY_INTERVAL > deadline => {
                    return Err(StoreError::LockTimeout {
                        path: path.to_path_buf(),
                    })
                }
                Err(_) => std::thread::sleep(LOCK_RETRY_INTERVAL),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TaskLock {
    fn drop(&mut self) {
        if let Err(error) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), %error, "failed to release task lock");
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
