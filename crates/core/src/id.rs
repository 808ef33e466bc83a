// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier generation and validation

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Directory-name shape of a task ID: `task-YYYYMMDD-HHMMSS` with an
/// optional 3-digit millisecond suffix for collisions.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static TASK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^task-\d{8}-\d{6}(-\d{3})?$").expect("constant regex pattern is valid")
});

/// Unique identifier for a task.
///
/// IDs are derived from the UTC creation time, so they sort
/// chronologically and double as on-disk directory names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate an ID from the given instant: `task-YYYYMMDD-HHMMSS`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self(now.format("task-%Y%m%d-%H%M%S").to_string())
    }

    /// Generate an ID with the millisecond suffix, for same-second
    /// collisions: `task-YYYYMMDD-HHMMSS-NNN`.
    pub fn generate_with_millis(now: DateTime<Utc>) -> Self {
        Self(format!(
            "{}-{:03}",
            now.format("task-%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis() % 1000
        ))
    }

    /// Whether a directory entry name has the task-ID shape.
    pub fn is_valid_dir_name(name: &str) -> bool {
        TASK_ID_RE.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
