// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Open metadata map with typed accessors for the recognized keys.
//!
//! Tasks and step results carry a string-keyed map of arbitrary JSON values.
//! The engine reads and writes a closed set of recognized keys (flags,
//! error context, CI results); everything else is caller-defined and passes
//! through untouched. Insertion order is preserved so a serialized task
//! round-trips byte-for-byte.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata keys recognized by the engine.
pub mod keys {
    pub const BRANCH: &str = "branch";
    pub const SKIP_GIT_STEPS: &str = "skip_git_steps";
    pub const NO_ISSUES_DETECTED: &str = "no_issues_detected";
    pub const WORKTREE_DIR: &str = "worktree_dir";
    pub const PR_NUMBER: &str = "pr_number";
    pub const LAST_ERROR: &str = "last_error";
    pub const RETRY_CONTEXT: &str = "retry_context";
    pub const CI_FAILURE_RESULT: &str = "ci_failure_result";
    pub const CI_TIMEOUT_RESULT: &str = "ci_timeout_result";
    pub const CI_FETCH_ERROR: &str = "ci_fetch_error";
    pub const PUSH_ERROR_TYPE: &str = "push_error_type";
    pub const AWAITING_MANUAL_FIX: &str = "awaiting_manual_fix";
    pub const EXTENDED_CI_TIMEOUT: &str = "extended_ci_timeout";
    pub const MANUAL_FIX_INSTRUCTIONS: &str = "manual_fix_instructions";
    pub const GARBAGE_ACTION: &str = "garbage_action";

    /// Set by step executors on a failed result to route the failure.
    pub const FAILURE_TYPE: &str = "failure_type";
    /// Carried alongside `ci_fetch_error` failures; copied to `last_error`.
    pub const ORIGINAL_ERROR: &str = "original_error";
    /// CI watch result attached to a failed CI step result; the failure
    /// router moves it into `ci_failure_result` / `ci_timeout_result`.
    pub const CI_RESULT: &str = "ci_result";
    /// Counters CI/AI executors may attach to a result, surfaced in
    /// progress events.
    pub const TURNS: &str = "turns";
    pub const FILES_CHANGED: &str = "files_changed";
}

/// Classification tag a step executor attaches to a failed result.
///
/// Unknown tags parse to `None`, which the failure router reports as
/// unhandled so the generic kind-based transition applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    CiFailed,
    CiTimeout,
    GhFailed,
    CiFetchError,
}

impl FailureKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ci_failed" => Some(Self::CiFailed),
            "ci_timeout" => Some(Self::CiTimeout),
            "gh_failed" => Some(Self::GhFailed),
            "ci_fetch_error" => Some(Self::CiFetchError),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CiFailed => "ci_failed",
            Self::CiTimeout => "ci_timeout",
            Self::GhFailed => "gh_failed",
            Self::CiFetchError => "ci_fetch_error",
        }
    }
}

/// String-keyed map of arbitrary JSON values, insertion-ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(IndexMap<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// True iff the key holds boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }

    pub fn set_flag(&mut self, key: &str) {
        self.0.insert(key.to_string(), Value::Bool(true));
    }

    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn u64_value(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Store a structured value serialized to JSON.
    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        self.0.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Read back a structured value. `None` if the key is absent or the
    /// stored shape does not match.
    pub fn json_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// The failure classification of a step result, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.str_value(keys::FAILURE_TYPE).and_then(FailureKind::from_tag)
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
