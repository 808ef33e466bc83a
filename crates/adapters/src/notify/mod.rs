// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters for attention-requiring task transitions

mod bell;
mod desktop;
mod noop;

pub use bell::BellNotifier;
pub use desktop::DesktopNotifier;
pub use noop::NoOpNotifier;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifyCall};

use atlas_core::{Task, TaskStatus};
use thiserror::Error;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Event types a notifier can emit. The set is closed; `ci_failed` also
/// represents CI timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    AwaitingApproval,
    ValidationFailed,
    GithubFailed,
    CiFailed,
}

impl NotifyEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingApproval => "awaiting_approval",
            Self::ValidationFailed => "validation_failed",
            Self::GithubFailed => "github_failed",
            Self::CiFailed => "ci_failed",
        }
    }

    /// The event a status maps to, if it maps to one at all.
    pub fn from_status(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::AwaitingApproval => Some(Self::AwaitingApproval),
            TaskStatus::ValidationFailed => Some(Self::ValidationFailed),
            TaskStatus::GhFailed => Some(Self::GithubFailed),
            TaskStatus::CiFailed | TaskStatus::CiTimeout => Some(Self::CiFailed),
            _ => None,
        }
    }

    /// The event for a transition, emitted only when the target requires
    /// attention and the source does not (no re-ringing while a task sits
    /// in an attention state).
    pub fn for_transition(from: TaskStatus, to: TaskStatus) -> Option<Self> {
        if !to.requires_attention() || from.requires_attention() {
            return None;
        }
        Self::from_status(to)
    }
}

/// Which events a notifier reacts to, and how.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Enabled event names. The legacy name `"error"` expands to both
    /// failure transports (`github_failed`, `ci_failed`).
    pub events: Vec<String>,
    pub bell: bool,
    pub quiet: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            events: vec![
                "awaiting_approval".to_string(),
                "validation_failed".to_string(),
                "github_failed".to_string(),
                "ci_failed".to_string(),
            ],
            bell: true,
            quiet: false,
        }
    }
}

impl NotifyConfig {
    pub fn enabled_for(&self, event: NotifyEvent) -> bool {
        self.events.iter().any(|name| {
            name == event.as_str()
                || (name == "error"
                    && matches!(event, NotifyEvent::GithubFailed | NotifyEvent::CiFailed))
        })
    }

    /// Whether the terminal bell should ring for this event.
    pub fn should_ring(&self, event: NotifyEvent) -> bool {
        self.bell && !self.quiet && self.enabled_for(event)
    }
}

/// Observer of task status transitions.
pub trait StatusNotifier: Send + Sync {
    /// Called after a transition has been applied. Implementations decide
    /// whether the edge warrants a notification.
    fn task_transition(
        &self,
        task: &Task,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<(), NotifyError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
