// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
}

#[test]
fn generate_formats_utc_timestamp() {
    let id = TaskId::generate(instant());
    assert_eq!(id.as_str(), "task-20260314-092653");
}

#[test]
fn generate_with_millis_appends_suffix() {
    let now = instant() + chrono::Duration::milliseconds(7);
    let id = TaskId::generate_with_millis(now);
    assert_eq!(id.as_str(), "task-20260314-092653-007");
}

#[yare::parameterized(
    plain        = { "task-20260314-092653", true },
    with_millis  = { "task-20260314-092653-007", true },
    short_millis = { "task-20260314-092653-07", false },
    no_prefix    = { "20260314-092653", false },
    trailing     = { "task-20260314-092653-007x", false },
    lock_file    = { "task-20260314-092653.lock", false },
    empty        = { "", false },
)]
fn dir_name_validation(name: &str, valid: bool) {
    assert_eq!(TaskId::is_valid_dir_name(name), valid);
}

#[test]
fn id_serde_is_transparent_string() {
    let id = TaskId::generate(instant());
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"task-20260314-092653\"");
    let back: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn id_equality_with_str() {
    let id = TaskId::new("task-20260314-092653");
    assert_eq!(id, "task-20260314-092653");
}
