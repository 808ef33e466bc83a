// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! atlas-adapters: External I/O for the Atlas task engine

pub mod browser;
pub mod forge;
pub mod notify;
pub mod process;

pub use browser::{BrowserError, BrowserOpener, SystemBrowser};
pub use forge::{ForgeError, ForgeRunner, PrInfo, PrState, PrStatus};
pub use notify::{
    BellNotifier, DesktopNotifier, NoOpNotifier, NotifyConfig, NotifyError, NotifyEvent,
    StatusNotifier,
};
pub use process::{ProcessManager, TerminateReport};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use browser::FakeBrowser;
#[cfg(any(test, feature = "test-support"))]
pub use forge::{FakeForgeRunner, ForgeCall};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifier, NotifyCall};
