// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyError, NotifyEvent, StatusNotifier};
use atlas_core::{Task, TaskStatus};
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded transition notification
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// The attention event this transition mapped to, if any.
    pub event: Option<NotifyEvent>,
}

struct FakeNotifierState {
    calls: Vec<NotifyCall>,
}

/// Fake notifier that records every transition it observes.
#[derive(Clone)]
pub struct FakeNotifier {
    inner: Arc<Mutex<FakeNotifierState>>,
}

impl Default for FakeNotifier {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeNotifierState { calls: Vec::new() })),
        }
    }
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded transitions.
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.inner.lock().calls.clone()
    }

    /// Only the transitions that mapped to an attention event.
    pub fn events(&self) -> Vec<NotifyEvent> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| c.event)
            .collect()
    }
}

impl StatusNotifier for FakeNotifier {
    fn task_transition(
        &self,
        task: &Task,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<(), NotifyError> {
        self.inner.lock().calls.push(NotifyCall {
            task_id: task.id.as_str().to_string(),
            from,
            to,
            event: NotifyEvent::for_transition(from, to),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
