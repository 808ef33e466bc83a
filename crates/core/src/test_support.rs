// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and fixtures shared by tests across the workspace.
#![cfg_attr(coverage_nightly, coverage(off))]
#![allow(clippy::unwrap_used)]

use crate::ci::{CheckBucket, CheckResult, CiOverallStatus, CiWatchResult};
use crate::clock::{Clock, FakeClock};
use crate::id::TaskId;
use crate::task::{StepResult, StepResultStatus, Task, TaskConfig, TaskSettings};
use crate::template::{SkipCondition, StepDefinition, StepKind, Template};
use indexmap::IndexMap;
use serde_json::Value;

/// A required step with an empty configuration.
pub fn step(name: &str, kind: StepKind) -> StepDefinition {
    StepDefinition {
        name: name.to_string(),
        kind,
        required: true,
        config: IndexMap::new(),
        skip_condition: None,
    }
}

/// An optional step (default-skipped by the orchestrator).
pub fn optional_step(name: &str, kind: StepKind) -> StepDefinition {
    StepDefinition {
        required: false,
        ..step(name, kind)
    }
}

/// A required git step with the given operation.
pub fn git_step(name: &str, operation: &str) -> StepDefinition {
    let mut def = step(name, StepKind::Git);
    def.config
        .insert("operation".to_string(), Value::String(operation.to_string()));
    def
}

/// A required step gated on a skip condition.
pub fn conditional_step(name: &str, kind: StepKind, condition: SkipCondition) -> StepDefinition {
    StepDefinition {
        skip_condition: Some(condition),
        ..step(name, kind)
    }
}

pub fn template(name: &str, steps: Vec<StepDefinition>) -> Template {
    Template::new(name, steps)
}

/// A pending task over the given template, created on the fake clock.
pub fn task(template: &Template, clock: &FakeClock) -> Task {
    let now = clock.now();
    Task::new(
        TaskConfig {
            id: TaskId::generate(now),
            workspace: "ws".to_string(),
            template_name: template.name.clone(),
            description: "fix bug".to_string(),
            settings: TaskSettings::default(),
        },
        template,
        now,
    )
}

/// A step result with the given status and no output.
pub fn step_result(step_index: usize, name: &str, status: StepResultStatus) -> StepResult {
    StepResult {
        step_index,
        name: name.to_string(),
        status,
        output: None,
        error: None,
        started_at: chrono::DateTime::UNIX_EPOCH,
        completed_at: chrono::DateTime::UNIX_EPOCH,
        duration_ms: 0,
        metadata: crate::Metadata::new(),
    }
}

/// A failing CI watch result with one failed check.
pub fn ci_failure(url: &str) -> CiWatchResult {
    CiWatchResult {
        status: CiOverallStatus::Failure,
        elapsed_ms: 300_000,
        checks: vec![CheckResult {
            name: "test".to_string(),
            bucket: CheckBucket::Fail,
            state: "COMPLETED".to_string(),
            url: url.to_string(),
            duration_ms: 120_000,
            workflow: "ci".to_string(),
        }],
        error: None,
    }
}
