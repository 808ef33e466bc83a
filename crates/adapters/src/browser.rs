// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser opening for check-run URLs

use thiserror::Error;

/// Errors from browser operations
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to open {url}: {message}")]
    OpenFailed { url: String, message: String },
}

/// Opens a URL in the user's browser.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), BrowserError>;
}

/// Platform launcher: `open` on macOS, `cmd /C start` on Windows,
/// `xdg-open` elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    pub fn new() -> Self {
        Self
    }
}

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        let mut command = launcher(url);
        command
            .spawn()
            .map(|_| ())
            .map_err(|e| BrowserError::OpenFailed {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(target_os = "macos")]
fn launcher(url: &str) -> std::process::Command {
    let mut cmd = std::process::Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(windows)]
fn launcher(url: &str) -> std::process::Command {
    let mut cmd = std::process::Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", windows)))]
fn launcher(url: &str) -> std::process::Command {
    let mut cmd = std::process::Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::{BrowserError, BrowserOpener};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake browser that records opened URLs.
    #[derive(Clone, Default)]
    pub struct FakeBrowser {
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBrowser {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn opened(&self) -> Vec<String> {
            self.urls.lock().clone()
        }
    }

    impl BrowserOpener for FakeBrowser {
        fn open(&self, url: &str) -> Result<(), BrowserError> {
            self.urls.lock().push(url.to_string());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBrowser;

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
