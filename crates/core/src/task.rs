// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task data model: the unit of execution and its append-only records.

use crate::id::TaskId;
use crate::metadata::Metadata;
use crate::status::TaskStatus;
use crate::template::{StepKind, Template};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Version of the on-disk task document. Readers refuse anything else.
pub const SCHEMA_VERSION: u32 = 1;

/// Execution status of a single step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepExecStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl fmt::Display for StepExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Record of a step within a task. Mutated in place as the engine runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    pub name: String,
    pub kind: StepKind,
    pub status: StepExecStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status a step executor reports on its result.
///
/// `Unknown` absorbs foreign strings during deserialization so the
/// dispatcher can reject them explicitly instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResultStatus {
    Success,
    NoChanges,
    AwaitingApproval,
    Failed,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for StepResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::NoChanges => "no_changes",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Outcome of one attempted step execution. Appended once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_index: usize,
    pub name: String,
    pub status: StepResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// One edge of the task's status history. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Refusal from the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition from {from} to {to}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Agent/model selection carried by a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Configuration for creating a new task.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub id: TaskId,
    pub workspace: String,
    pub template_name: String,
    pub description: String,
    pub settings: TaskSettings,
}

/// The unit of execution: one run of a template within a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub workspace: String,
    pub template_name: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub steps: Vec<StepState>,
    #[serde(default)]
    pub step_results: Vec<StepResult>,
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: TaskSettings,
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Task {
    /// Create a pending task with its step sequence built from the template.
    pub fn new(config: TaskConfig, template: &Template, now: DateTime<Utc>) -> Self {
        let steps = template
            .steps
            .iter()
            .map(|def| StepState {
                name: def.name.clone(),
                kind: def.kind,
                status: StepExecStatus::Pending,
                attempts: 0,
                started_at: None,
                completed_at: None,
                error: None,
            })
            .collect();

        Self {
            id: config.id,
            workspace: config.workspace,
            template_name: config.template_name,
            description: config.description,
            status: TaskStatus::Pending,
            current_step: 0,
            steps,
            step_results: Vec::new(),
            transitions: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            settings: config.settings,
            schema_version: SCHEMA_VERSION,
            metadata: Metadata::new(),
        }
    }

    /// Apply a status transition as a pure value transform.
    ///
    /// On success the transition record is appended, `updated_at` is bumped,
    /// and `completed_at` is set exactly when the target is terminal (and
    /// never cleared afterwards).
    pub fn apply_transition(
        &mut self,
        to: TaskStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !TaskStatus::is_valid_transition(self.status, to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.transitions.push(TransitionRecord {
            from: self.status,
            to,
            at: now,
            reason,
        });
        self.status = to;
        self.updated_at = now;
        if to.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        Ok(())
    }

    /// Mark the step at `index` as running and count the attempt.
    /// Out-of-range indices are a no-op.
    pub fn begin_step(&mut self, index: usize, now: DateTime<Utc>) {
        if let Some(step) = self.steps.get_mut(index) {
            step.status = StepExecStatus::Running;
            step.started_at = Some(now);
            step.attempts += 1;
        }
    }

    pub fn complete_step(&mut self, index: usize, now: DateTime<Utc>) {
        if let Some(step) = self.steps.get_mut(index) {
            step.status = StepExecStatus::Completed;
            step.completed_at = Some(now);
        }
    }

    pub fn fail_step(&mut self, index: usize, error: impl Into<String>, now: DateTime<Utc>) {
        if let Some(step) = self.steps.get_mut(index) {
            step.status = StepExecStatus::Failed;
            step.error = Some(error.into());
            step.completed_at = Some(now);
        }
    }

    pub fn skip_step(&mut self, index: usize, now: DateTime<Utc>) {
        if let Some(step) = self.steps.get_mut(index) {
            step.status = StepExecStatus::Skipped;
            step.completed_at = Some(now);
        }
    }

    /// Append a step result. Results are never reordered or truncated.
    pub fn record_result(&mut self, result: StepResult) {
        self.step_results.push(result);
    }

    /// Index of the first step with the given name.
    pub fn step_index_named(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    /// Index of the first step of the given kind.
    pub fn first_step_of_kind(&self, kind: StepKind) -> Option<usize> {
        self.steps.iter().position(|s| s.kind == kind)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Results that recorded a failure, in execution order.
    pub fn failed_results(&self) -> impl Iterator<Item = &StepResult> {
        self.step_results
            .iter()
            .filter(|r| r.status == StepResultStatus::Failed)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
