// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atlas_core::test_support::{
    conditional_step, git_step, optional_step, step, task, template,
};
use atlas_core::{FakeClock, SkipCondition};

fn fixture_task() -> Task {
    let clock = FakeClock::new();
    let tpl = template("t", vec![step("implement", StepKind::Ai)]);
    task(&tpl, &clock)
}

#[test]
fn optional_steps_are_default_skipped() {
    let task = fixture_task();
    assert!(should_skip(&task, &optional_step("cleanup", StepKind::Git)));
    assert!(!should_skip(&task, &step("implement", StepKind::Ai)));
}

#[test]
fn no_changes_skips_push_and_create_pr_only() {
    let mut task = fixture_task();
    task.metadata.set_flag(keys::SKIP_GIT_STEPS);

    assert!(should_skip(&task, &git_step("push", "push")));
    assert!(should_skip(&task, &git_step("pr", "create_pr")));
    assert!(!should_skip(&task, &git_step("commit", "commit")));
    // Non-git steps are unaffected by the flag.
    assert!(!should_skip(&task, &step("ci", StepKind::Ci)));
}

#[test]
fn git_steps_run_without_the_flag() {
    let task = fixture_task();
    assert!(!should_skip(&task, &git_step("push", "push")));
}

#[test]
fn no_issues_detected_skips_ai_and_validation() {
    let mut task = fixture_task();
    task.metadata.set_flag(keys::NO_ISSUES_DETECTED);

    assert!(should_skip(&task, &step("fix", StepKind::Ai)));
    assert!(should_skip(&task, &step("validate", StepKind::Validation)));
    assert!(!should_skip(&task, &step("ci", StepKind::Ci)));
}

#[test]
fn detect_only_validation_survives_no_issues() {
    let mut task = fixture_task();
    task.metadata.set_flag(keys::NO_ISSUES_DETECTED);

    let mut detect = step("detect", StepKind::Validation);
    detect
        .config
        .insert("detect_only".to_string(), serde_json::Value::Bool(true));
    assert!(!should_skip(&task, &detect));
}

#[test]
fn skip_conditions_use_the_task_description() {
    // Fixture description "fix bug" is under the threshold.
    let task = fixture_task();

    let on_description =
        conditional_step("ask", StepKind::Human, SkipCondition::HasDescription);
    assert!(!should_skip(&task, &on_description));

    let without_description =
        conditional_step("draft", StepKind::Ai, SkipCondition::NoDescription);
    assert!(should_skip(&task, &without_description));
}
