// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress and metrics observers

use atlas_core::{StepKind, StepResultStatus};

/// Phase of a step progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEventKind {
    Start,
    Complete,
}

/// Snapshot of one step starting or completing, for live UIs.
#[derive(Debug, Clone)]
pub struct StepProgressEvent {
    pub kind: ProgressEventKind,
    pub task_id: String,
    pub workspace: String,
    pub step_index: usize,
    pub total_steps: usize,
    pub step_name: String,
    pub step_kind: StepKind,
    pub agent: Option<String>,
    pub model: Option<String>,
    /// Result status; only on `Complete` events.
    pub status: Option<String>,
    pub duration_ms: Option<u64>,
    pub turns: Option<u64>,
    pub files_changed: Option<u64>,
    pub output: Option<String>,
}

/// Receiver of step progress events.
pub trait ProgressSink: Send + Sync {
    fn step_progress(&self, event: &StepProgressEvent);
}

/// Receiver of engine counters. A nil implementation is permitted; the
/// orchestrator defaults to [`NoopMetrics`].
pub trait MetricsSink: Send + Sync {
    fn task_started(&self);
    fn task_completed(&self);
    fn step_executed(&self, kind: StepKind, status: StepResultStatus, duration_ms: u64);
    fn loop_iteration(&self);
}

/// Metrics sink that counts nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn task_started(&self) {}
    fn task_completed(&self) {}
    fn step_executed(&self, _kind: StepKind, _status: StepResultStatus, _duration_ms: u64) {}
    fn loop_iteration(&self) {}
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Progress sink that records every event.
    #[derive(Clone, Default)]
    pub struct FakeProgress {
        events: Arc<Mutex<Vec<StepProgressEvent>>>,
    }

    impl FakeProgress {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<StepProgressEvent> {
            self.events.lock().clone()
        }
    }

    impl ProgressSink for FakeProgress {
        fn step_progress(&self, event: &StepProgressEvent) {
            self.events.lock().push(event.clone());
        }
    }

    /// Metrics sink backed by plain counters.
    #[derive(Clone, Default)]
    pub struct FakeMetrics {
        pub tasks_started: Arc<AtomicU64>,
        pub tasks_completed: Arc<AtomicU64>,
        pub steps_executed: Arc<AtomicU64>,
        pub loop_iterations: Arc<AtomicU64>,
    }

    impl FakeMetrics {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl MetricsSink for FakeMetrics {
        fn task_started(&self) {
            self.tasks_started.fetch_add(1, Ordering::SeqCst);
        }

        fn task_completed(&self) {
            self.tasks_completed.fetch_add(1, Ordering::SeqCst);
        }

        fn step_executed(&self, _kind: StepKind, _status: StepResultStatus, _duration_ms: u64) {
            self.steps_executed.fetch_add(1, Ordering::SeqCst);
        }

        fn loop_iteration(&self) {
            self.loop_iterations.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMetrics, FakeProgress};
