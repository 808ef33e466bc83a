// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step skip rules

use atlas_core::metadata::keys;
use atlas_core::{StepDefinition, StepKind, Task};

/// Git operations that become pointless once a run produced no changes.
const SKIPPABLE_GIT_OPS: [&str; 2] = ["push", "create_pr"];

/// Whether the orchestrator should skip this step outright.
pub(crate) fn should_skip(task: &Task, step: &StepDefinition) -> bool {
    // Optional steps are default-skipped.
    if !step.required {
        return true;
    }

    // No changes upstream: nothing to push or open a PR for.
    if step.kind == StepKind::Git && task.metadata.flag(keys::SKIP_GIT_STEPS) {
        if let Some(op) = step.git_operation() {
            if SKIPPABLE_GIT_OPS.contains(&op) {
                return true;
            }
        }
    }

    // A clean detection pass skips AI work entirely and validation unless
    // the step exists purely to detect.
    if task.metadata.flag(keys::NO_ISSUES_DETECTED) {
        match step.kind {
            StepKind::Ai => return true,
            StepKind::Validation if !step.config_flag("detect_only") => return true,
            _ => {}
        }
    }

    if let Some(condition) = step.skip_condition {
        if condition.is_met(&task.description) {
            return true;
        }
    }

    false
}

#[cfg(test)]
#[path = "skip_tests.rs"]
mod tests;
