// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process termination with a grace period.
//!
//! Step executors spawn helper processes (editors, watchers, dev servers)
//! whose identifiers end up in task metadata; on cancellation or abandon
//! the engine hands the surviving identifiers here. Each live process gets
//! a graceful SIGTERM, the grace period to exit, then a SIGKILL. Dead or
//! invalid identifiers count as already terminated.

use std::time::Duration;

/// Outcome of a termination sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminateReport {
    /// Processes now gone, including ones that were already dead.
    pub terminated: usize,
    /// Residual failures (e.g. insufficient privilege), one per process.
    pub errors: Vec<String>,
}

/// Signal-based process management.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessManager;

impl ProcessManager {
    pub fn new() -> Self {
        Self
    }

    /// Whether the identifier names a live process. Zero is never valid
    /// (it would address the caller's own process group).
    pub fn is_alive(&self, pid: u32) -> bool {
        if pid == 0 {
            return false;
        }
        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::kill;
            use nix::unistd::Pid;

            // Signal 0 probes without delivering. EPERM means the process
            // exists but belongs to someone else: alive.
            match kill(Pid::from_raw(pid as i32), None) {
                Ok(()) => true,
                Err(Errno::EPERM) => true,
                Err(_) => false,
            }
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Filter a list down to the identifiers that are still alive.
    pub fn filter_alive(&self, pids: &[u32]) -> Vec<u32> {
        pids.iter().copied().filter(|&pid| self.is_alive(pid)).collect()
    }

    /// Terminate every listed process: SIGTERM the live ones, wait out the
    /// grace period, SIGKILL the survivors.
    pub async fn terminate_all(&self, pids: &[u32], grace: Duration) -> TerminateReport {
        let mut report = TerminateReport::default();

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let mut pending = Vec::new();
            for &pid in pids {
                if !self.is_alive(pid) {
                    report.terminated += 1;
                    continue;
                }
                match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    Ok(()) => pending.push(pid),
                    Err(Errno::ESRCH) => report.terminated += 1,
                    Err(errno) => report.errors.push(format!("terminate {pid}: {errno}")),
                }
            }

            if !pending.is_empty() {
                tokio::time::sleep(grace).await;
            }

            for pid in pending {
                if !self.is_alive(pid) {
                    report.terminated += 1;
                    continue;
                }
                match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    Ok(()) | Err(Errno::ESRCH) => report.terminated += 1,
                    Err(errno) => report.errors.push(format!("kill {pid}: {errno}")),
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = grace;
            for &pid in pids {
                report.errors.push(format!("terminate {pid}: unsupported platform"));
            }
        }

        report
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
