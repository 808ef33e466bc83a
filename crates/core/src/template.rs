// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template and step definitions.
//!
//! Templates are read-only inputs: loading and validating them is the
//! caller's concern, the engine only walks the step sequence.

use crate::status::TaskStatus;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of a step, selecting which executor runs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Ai,
    Validation,
    Git,
    Ci,
    Human,
    Sdd,
    Verify,
    Loop,
}

impl StepKind {
    /// The error status a task lands in when a step of this kind fails
    /// without a more specific classification.
    pub fn error_status(self) -> TaskStatus {
        match self {
            Self::Validation => TaskStatus::ValidationFailed,
            Self::Git => TaskStatus::GhFailed,
            Self::Ci => TaskStatus::CiFailed,
            Self::Ai | Self::Human | Self::Sdd | Self::Verify | Self::Loop => {
                TaskStatus::ValidationFailed
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Validation => "validation",
            Self::Git => "git",
            Self::Ci => "ci",
            Self::Human => "human",
            Self::Sdd => "sdd",
            Self::Verify => "verify",
            Self::Loop => "loop",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum trimmed length for a description to count as present.
const DESCRIPTION_THRESHOLD: usize = 20;

/// Declarative skip condition on a step definition. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCondition {
    /// Skip when the task has a meaningful description.
    HasDescription,
    /// Skip when it does not.
    NoDescription,
}

impl SkipCondition {
    pub fn is_met(self, description: &str) -> bool {
        let has = description.trim().len() > DESCRIPTION_THRESHOLD;
        match self {
            Self::HasDescription => has,
            Self::NoDescription => !has,
        }
    }
}

/// One step of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    pub kind: StepKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub config: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_condition: Option<SkipCondition>,
}

impl StepDefinition {
    /// The git operation this step performs (`push`, `create_pr`, ...),
    /// read from `config["operation"]`.
    pub fn git_operation(&self) -> Option<&str> {
        self.config.get("operation").and_then(Value::as_str)
    }

    /// True iff `config[key]` holds boolean `true`.
    pub fn config_flag(&self, key: &str) -> bool {
        matches!(self.config.get(key), Some(Value::Bool(true)))
    }
}

/// An ordered sequence of step definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub steps: Vec<StepDefinition>,
}

impl Template {
    pub fn new(name: impl Into<String>, steps: Vec<StepDefinition>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
