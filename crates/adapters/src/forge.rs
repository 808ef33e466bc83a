// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-forge operations consumed by the failure-action processors.
//!
//! The engine never talks to a forge directly during step execution; step
//! executors do. This trait only covers the operations the engine itself
//! needs when the user remediates a failed task (convert a PR to draft on
//! abandon, re-watch checks, and so on).

use async_trait::async_trait;
use atlas_core::CiWatchResult;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from forge operations
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("forge operation failed: {0}")]
    Operation(String),
    #[error("operation cancelled")]
    Cancelled,
}

/// A created or fetched pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrInfo {
    pub number: u64,
    pub url: String,
    pub draft: bool,
}

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Draft,
    Merged,
    Closed,
}

/// Current status of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrStatus {
    pub number: u64,
    pub state: PrState,
    pub mergeable: bool,
}

/// Adapter for source-forge operations. Every method honors the
/// cancellation token.
#[async_trait]
pub trait ForgeRunner: Send + Sync {
    async fn create_pr(
        &self,
        cancel: &CancellationToken,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PrInfo, ForgeError>;

    async fn pr_status(
        &self,
        cancel: &CancellationToken,
        number: u64,
    ) -> Result<PrStatus, ForgeError>;

    /// Watch checks until they settle or `timeout` elapses.
    async fn watch_checks(
        &self,
        cancel: &CancellationToken,
        number: u64,
        timeout: Duration,
    ) -> Result<CiWatchResult, ForgeError>;

    async fn convert_to_draft(
        &self,
        cancel: &CancellationToken,
        number: u64,
    ) -> Result<(), ForgeError>;

    async fn merge(&self, cancel: &CancellationToken, number: u64) -> Result<(), ForgeError>;

    async fn review(
        &self,
        cancel: &CancellationToken,
        number: u64,
        body: &str,
    ) -> Result<(), ForgeError>;

    async fn comment(
        &self,
        cancel: &CancellationToken,
        number: u64,
        body: &str,
    ) -> Result<(), ForgeError>;
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use atlas_core::CiOverallStatus;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded forge operation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ForgeCall {
        CreatePr { branch: String, title: String },
        PrStatus { number: u64 },
        WatchChecks { number: u64 },
        ConvertToDraft { number: u64 },
        Merge { number: u64 },
        Review { number: u64 },
        Comment { number: u64 },
    }

    struct FakeForgeState {
        calls: Vec<ForgeCall>,
        watch_result: CiWatchResult,
        draft_error: Option<String>,
    }

    /// Fake forge runner that records calls and serves canned responses.
    #[derive(Clone)]
    pub struct FakeForgeRunner {
        inner: Arc<Mutex<FakeForgeState>>,
    }

    impl Default for FakeForgeRunner {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeForgeState {
                    calls: Vec::new(),
                    watch_result: CiWatchResult {
                        status: CiOverallStatus::Success,
                        elapsed_ms: 0,
                        checks: Vec::new(),
                        error: None,
                    },
                    draft_error: None,
                })),
            }
        }
    }

    impl FakeForgeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<ForgeCall> {
            self.inner.lock().calls.clone()
        }

        pub fn set_watch_result(&self, result: CiWatchResult) {
            self.inner.lock().watch_result = result;
        }

        /// Make `convert_to_draft` fail with the given message.
        pub fn fail_convert_to_draft(&self, message: impl Into<String>) {
            self.inner.lock().draft_error = Some(message.into());
        }

        fn record(&self, call: ForgeCall) {
            self.inner.lock().calls.push(call);
        }
    }

    fn check_cancel(cancel: &CancellationToken) -> Result<(), ForgeError> {
        if cancel.is_cancelled() {
            Err(ForgeError::Cancelled)
        } else {
            Ok(())
        }
    }

    #[async_trait]
    impl ForgeRunner for FakeForgeRunner {
        async fn create_pr(
            &self,
            cancel: &CancellationToken,
            branch: &str,
            title: &str,
            _body: &str,
        ) -> Result<PrInfo, ForgeError> {
            check_cancel(cancel)?;
            self.record(ForgeCall::CreatePr {
                branch: branch.to_string(),
                title: title.to_string(),
            });
            Ok(PrInfo {
                number: 1,
                url: "https://forge.example/pr/1".to_string(),
                draft: false,
            })
        }

        async fn pr_status(
            &self,
            cancel: &CancellationToken,
            number: u64,
        ) -> Result<PrStatus, ForgeError> {
            check_cancel(cancel)?;
            self.record(ForgeCall::PrStatus { number });
            Ok(PrStatus {
                number,
                state: PrState::Open,
                mergeable: true,
            })
        }

        async fn watch_checks(
            &self,
            cancel: &CancellationToken,
            number: u64,
            _timeout: Duration,
        ) -> Result<CiWatchResult, ForgeError> {
            check_cancel(cancel)?;
            self.record(ForgeCall::WatchChecks { number });
            Ok(self.inner.lock().watch_result.clone())
        }

        async fn convert_to_draft(
            &self,
            cancel: &CancellationToken,
            number: u64,
        ) -> Result<(), ForgeError> {
            check_cancel(cancel)?;
            self.record(ForgeCall::ConvertToDraft { number });
            match self.inner.lock().draft_error.clone() {
                Some(message) => Err(ForgeError::Operation(message)),
                None => Ok(()),
            }
        }

        async fn merge(&self, cancel: &CancellationToken, number: u64) -> Result<(), ForgeError> {
            check_cancel(cancel)?;
            self.record(ForgeCall::Merge { number });
            Ok(())
        }

        async fn review(
            &self,
            cancel: &CancellationToken,
            number: u64,
            _body: &str,
        ) -> Result<(), ForgeError> {
            check_cancel(cancel)?;
            self.record(ForgeCall::Review { number });
            Ok(())
        }

        async fn comment(
            &self,
            cancel: &CancellationToken,
            number: u64,
            _body: &str,
        ) -> Result<(), ForgeError> {
            check_cancel(cancel)?;
            self.record(ForgeCall::Comment { number });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeForgeRunner, ForgeCall};

#[cfg(test)]
#[path = "forge_tests.rs"]
mod tests;
