// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI watch results and the persisted CI-result artifact.

use crate::time_fmt::format_elapsed_ms;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall outcome of watching a CI run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiOverallStatus {
    Pending,
    Success,
    Failure,
    Timeout,
}

impl fmt::Display for CiOverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Aggregated state of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckBucket {
    Pass,
    Fail,
    Cancel,
    Pending,
    Skipping,
}

impl CheckBucket {
    /// Buckets that count as a failed check.
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Fail | Self::Cancel)
    }
}

impl fmt::Display for CheckBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Cancel => "cancel",
            Self::Pending => "pending",
            Self::Skipping => "skipping",
        };
        f.write_str(s)
    }
}

/// One check from a CI run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub bucket: CheckBucket,
    /// Raw provider state string (e.g. `"COMPLETED"`), kept for display.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "duration")]
    pub duration_ms: u64,
    #[serde(default)]
    pub workflow: String,
}

/// Result of watching CI checks for a push or pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiWatchResult {
    pub status: CiOverallStatus,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub checks: Vec<CheckResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CiWatchResult {
    /// Checks whose bucket counts as failed (`fail` or `cancel`).
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| c.bucket.is_failed()).collect()
    }

    /// The URL most worth opening: the first failed check with a URL,
    /// falling back to the first check that has one at all.
    pub fn best_url(&self) -> Option<&str> {
        self.checks
            .iter()
            .find(|c| c.bucket.is_failed() && !c.url.is_empty())
            .or_else(|| self.checks.iter().find(|c| !c.url.is_empty()))
            .map(|c| c.url.as_str())
    }
}

/// The `ci-result.json` document written when a CI failure action runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiResultArtifact {
    pub status: CiOverallStatus,
    /// Human-formatted elapsed time, e.g. `"5m0s"`.
    pub elapsed_time: String,
    pub all_checks: Vec<CheckResult>,
    pub failed_checks: Vec<CheckResult>,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

impl CiResultArtifact {
    pub fn from_watch(watch: &CiWatchResult, now: DateTime<Utc>) -> Self {
        Self {
            status: watch.status,
            elapsed_time: format_elapsed_ms(watch.elapsed_ms),
            all_checks: watch.checks.clone(),
            failed_checks: watch.failed_checks().into_iter().cloned().collect(),
            error_message: watch.error.clone().unwrap_or_default(),
            timestamp: now,
        }
    }
}

#[cfg(test)]
#[path = "ci_tests.rs"]
mod tests;
