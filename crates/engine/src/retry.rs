// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry context written alongside error transitions.
//!
//! The markdown summary lands in task metadata under `retry_context` and
//! is fed to AI step executors on the next attempt so they see what
//! already went wrong.

use atlas_core::metadata::keys;
use atlas_core::Task;
use std::fmt::Write;

/// Build the markdown retry summary for a failing step.
pub(crate) fn build_retry_context(task: &Task, failing_step: &str, error: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Retry context");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Task: {}", task.id);
    let _ = writeln!(out, "- Current step: {}", task.current_step);
    let _ = writeln!(out, "- Failing step: {}", failing_step);
    let _ = writeln!(out, "- Error: {}", error);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Previous failures");
    let _ = writeln!(out);

    let mut any = false;
    for result in task.failed_results() {
        let detail = result.error.as_deref().unwrap_or("no error recorded");
        let _ = writeln!(out, "- {} (step {}): {}", result.name, result.step_index, detail);
        any = true;
    }
    if !any {
        let _ = writeln!(out, "- none");
    }
    out
}

/// Record `last_error` and `retry_context` on the task.
pub(crate) fn record_error_context(task: &mut Task, failing_step: &str, error: &str) {
    let context = build_retry_context(task, failing_step, error);
    task.metadata.set_str(keys::LAST_ERROR, error);
    task.metadata.set_str(keys::RETRY_CONTEXT, context);
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
