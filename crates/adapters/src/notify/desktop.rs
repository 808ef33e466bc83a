// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification adapter using notify-rust.
//!
//! On macOS, `notify-rust` uses `mac-notification-sys` (Cocoa bindings) to
//! send notifications via the Notification Center. The first notification
//! triggers `ensure_application_set()` which runs an AppleScript to look up
//! a bundle identifier; in a headless context without Automation
//! permissions that AppleScript blocks forever. We pre-set the bundle
//! identifier at construction time to bypass the lookup entirely.

use super::{NotifyConfig, NotifyError, NotifyEvent, StatusNotifier};
use atlas_core::{Task, TaskStatus};

/// Desktop transport for attention events.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    config: NotifyConfig,
}

impl DesktopNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        #[cfg(target_os = "macos")]
        {
            // Pre-set the application bundle identifier so
            // mac-notification-sys skips its NSAppleScript lookup.
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self { config }
    }
}

impl StatusNotifier for DesktopNotifier {
    fn task_transition(
        &self,
        task: &Task,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<(), NotifyError> {
        let Some(event) = NotifyEvent::for_transition(from, to) else {
            return Ok(());
        };
        if self.config.quiet || !self.config.enabled_for(event) {
            return Ok(());
        }

        let title = format!("atlas: {}", event.as_str());
        let message = format!("{} ({}) needs attention", task.id, task.workspace);
        // Notification::show() can block on the platform bus; fire and
        // forget on a separate thread so the engine loop never waits on it.
        std::thread::spawn(move || {
            tracing::info!(%title, %message, "sending desktop notification");
            match notify_rust::Notification::new()
                .summary(&title)
                .body(&message)
                .show()
            {
                Ok(_) => tracing::info!(%title, "desktop notification sent"),
                Err(error) => {
                    tracing::warn!(%title, %error, "desktop notification failed");
                }
            }
        });
        Ok(())
    }
}
