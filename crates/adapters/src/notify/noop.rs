// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notification adapter

use super::{NotifyError, StatusNotifier};
use atlas_core::{Task, TaskStatus};

/// Notifier that discards every transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

impl StatusNotifier for NoOpNotifier {
    fn task_transition(
        &self,
        _task: &Task,
        _from: TaskStatus,
        _to: TaskStatus,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}
