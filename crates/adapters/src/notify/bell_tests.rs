// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atlas_core::test_support::{step, task, template};
use atlas_core::{FakeClock, StepKind};
use parking_lot::Mutex as PlMutex;
use std::sync::Arc;

/// Write sink that appends into a shared buffer.
#[derive(Clone, Default)]
struct SharedBuf(Arc<PlMutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn sample_task() -> Task {
    let clock = FakeClock::new();
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    task(&tpl, &clock)
}

#[test]
fn rings_on_attention_transition() {
    let buf = SharedBuf::default();
    let bell = BellNotifier::new(buf.clone(), NotifyConfig::default());

    bell.task_transition(&sample_task(), TaskStatus::Running, TaskStatus::CiFailed)
        .unwrap();

    assert_eq!(*buf.0.lock(), b"\x07");
}

#[test]
fn silent_on_non_attention_transition() {
    let buf = SharedBuf::default();
    let bell = BellNotifier::new(buf.clone(), NotifyConfig::default());

    bell.task_transition(&sample_task(), TaskStatus::Pending, TaskStatus::Running)
        .unwrap();
    bell.task_transition(&sample_task(), TaskStatus::CiFailed, TaskStatus::Running)
        .unwrap();

    assert!(buf.0.lock().is_empty());
}

#[test]
fn silent_when_quiet() {
    let buf = SharedBuf::default();
    let config = NotifyConfig {
        quiet: true,
        ..NotifyConfig::default()
    };
    let bell = BellNotifier::new(buf.clone(), config);

    bell.task_transition(&sample_task(), TaskStatus::Running, TaskStatus::CiFailed)
        .unwrap();
    assert!(buf.0.lock().is_empty());
}

#[test]
fn silent_for_disabled_event() {
    let buf = SharedBuf::default();
    let config = NotifyConfig {
        events: vec!["awaiting_approval".to_string()],
        bell: true,
        quiet: false,
    };
    let bell = BellNotifier::new(buf.clone(), config);

    bell.task_transition(&sample_task(), TaskStatus::Running, TaskStatus::GhFailed)
        .unwrap();
    assert!(buf.0.lock().is_empty());

    bell.task_transition(&sample_task(), TaskStatus::Validating, TaskStatus::AwaitingApproval)
        .unwrap();
    assert_eq!(*buf.0.lock(), b"\x07");
}
