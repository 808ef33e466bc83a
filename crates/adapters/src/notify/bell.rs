// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-bell notifier

use super::{NotifyConfig, NotifyError, NotifyEvent, StatusNotifier};
use atlas_core::{Task, TaskStatus};
use parking_lot::Mutex;
use std::io::{self, Write};

/// Rings the terminal bell (`\a`) when a task enters an attention state.
pub struct BellNotifier<W: Write + Send> {
    out: Mutex<W>,
    config: NotifyConfig,
}

impl BellNotifier<io::Stderr> {
    /// Bell on stderr with the given configuration.
    pub fn stderr(config: NotifyConfig) -> Self {
        Self::new(io::stderr(), config)
    }
}

impl<W: Write + Send> BellNotifier<W> {
    pub fn new(out: W, config: NotifyConfig) -> Self {
        Self {
            out: Mutex::new(out),
            config,
        }
    }
}

impl<W: Write + Send> StatusNotifier for BellNotifier<W> {
    fn task_transition(
        &self,
        _task: &Task,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<(), NotifyError> {
        let Some(event) = NotifyEvent::for_transition(from, to) else {
            return Ok(());
        };
        if !self.config.should_ring(event) {
            return Ok(());
        }
        let mut out = self.out.lock();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "bell_tests.rs"]
mod tests;
