// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task status set and the valid-transition graph.
//!
//! The transition table is the single source of truth: the terminal, error,
//! and attention sets are all derived from it so they cannot drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a task through its lifecycle. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Validating,
    AwaitingApproval,
    ValidationFailed,
    GhFailed,
    CiFailed,
    CiTimeout,
    Interrupted,
    Completed,
    Rejected,
    Abandoned,
}

use TaskStatus::*;

/// Every status, in declaration order. Used to derive the terminal, error,
/// and attention sets from the transition table.
pub const ALL_STATUSES: [TaskStatus; 12] = [
    Pending,
    Running,
    Validating,
    AwaitingApproval,
    ValidationFailed,
    GhFailed,
    CiFailed,
    CiTimeout,
    Interrupted,
    Completed,
    Rejected,
    Abandoned,
];

impl TaskStatus {
    /// The transition table: targets reachable from this status.
    pub fn allowed_targets(self) -> &'static [TaskStatus] {
        match self {
            Pending => &[Running],
            Running => &[
                Validating,
                GhFailed,
                CiFailed,
                CiTimeout,
                Interrupted,
                Abandoned,
            ],
            Validating => &[AwaitingApproval, ValidationFailed, Interrupted],
            ValidationFailed => &[Running, Abandoned],
            AwaitingApproval => &[Completed, Running, Rejected],
            GhFailed => &[Running, Abandoned],
            CiFailed => &[Running, Abandoned],
            CiTimeout => &[Running, Abandoned],
            Interrupted => &[Running, Abandoned],
            Completed | Rejected | Abandoned => &[],
        }
    }

    /// Whether `from → to` is an edge in the transition graph.
    ///
    /// Self-loops and transitions out of terminal states are always invalid.
    pub fn is_valid_transition(from: TaskStatus, to: TaskStatus) -> bool {
        from != to && from.allowed_targets().contains(&to)
    }

    /// Terminal: no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// Recoverable error: a non-pending, non-running status that can reach
    /// both `running` (retry) and `abandoned` (give up).
    pub fn is_error(self) -> bool {
        if matches!(self, Pending | Running) {
            return false;
        }
        let targets = self.allowed_targets();
        targets.contains(&Running) && targets.contains(&Abandoned)
    }

    /// Attention-requiring: the end-user must act before the task moves.
    pub fn requires_attention(self) -> bool {
        self == AwaitingApproval || self.is_error()
    }

    /// Whether a plain abandon is allowed. A running task must be
    /// force-abandoned; see [`TaskStatus::can_force_abandon`].
    pub fn can_abandon(self) -> bool {
        self != Running && self.allowed_targets().contains(&Abandoned)
    }

    /// Whether a forced abandon is allowed. Additionally admits `running`.
    pub fn can_force_abandon(self) -> bool {
        self.allowed_targets().contains(&Abandoned)
    }

    /// Whether the task can be retried back into `running`.
    pub fn can_retry(self) -> bool {
        self.is_error()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pending => "pending",
            Running => "running",
            Validating => "validating",
            AwaitingApproval => "awaiting_approval",
            ValidationFailed => "validation_failed",
            GhFailed => "gh_failed",
            CiFailed => "ci_failed",
            CiTimeout => "ci_timeout",
            Interrupted => "interrupted",
            Completed => "completed",
            Rejected => "rejected",
            Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
