// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn check(name: &str, bucket: CheckBucket, url: &str) -> CheckResult {
    CheckResult {
        name: name.to_string(),
        bucket,
        state: "COMPLETED".to_string(),
        url: url.to_string(),
        duration_ms: 42_000,
        workflow: "ci".to_string(),
    }
}

fn watch(checks: Vec<CheckResult>) -> CiWatchResult {
    CiWatchResult {
        status: CiOverallStatus::Failure,
        elapsed_ms: 300_000,
        checks,
        error: None,
    }
}

#[test]
fn failed_checks_selects_fail_and_cancel() {
    let result = watch(vec![
        check("build", CheckBucket::Pass, ""),
        check("test", CheckBucket::Fail, "https://ci/test"),
        check("lint", CheckBucket::Cancel, "https://ci/lint"),
        check("deploy", CheckBucket::Skipping, ""),
    ]);

    let failed: Vec<_> = result.failed_checks().iter().map(|c| c.name.clone()).collect();
    assert_eq!(failed, vec!["test", "lint"]);
}

#[test]
fn best_url_prefers_failed_check() {
    let result = watch(vec![
        check("build", CheckBucket::Pass, "https://ci/build"),
        check("test", CheckBucket::Fail, "https://ci/test"),
    ]);
    assert_eq!(result.best_url(), Some("https://ci/test"));
}

#[test]
fn best_url_falls_back_to_any_url() {
    let result = watch(vec![
        check("build", CheckBucket::Pass, ""),
        check("test", CheckBucket::Pass, "https://ci/test"),
        check("lint", CheckBucket::Fail, ""),
    ]);
    assert_eq!(result.best_url(), Some("https://ci/test"));
}

#[test]
fn best_url_none_when_no_urls() {
    let result = watch(vec![check("build", CheckBucket::Fail, "")]);
    assert_eq!(result.best_url(), None);
}

#[test]
fn artifact_shape() {
    let result = watch(vec![
        check("build", CheckBucket::Pass, "https://ci/build"),
        check("test", CheckBucket::Fail, "https://ci/test"),
    ]);
    let artifact = CiResultArtifact::from_watch(&result, DateTime::UNIX_EPOCH);

    assert_eq!(artifact.status, CiOverallStatus::Failure);
    assert_eq!(artifact.elapsed_time, "5m0s");
    assert_eq!(artifact.all_checks.len(), 2);
    assert_eq!(artifact.failed_checks.len(), 1);
    assert_eq!(artifact.failed_checks[0].name, "test");
    assert_eq!(artifact.error_message, "");

    let json = serde_json::to_value(&artifact).unwrap();
    assert_eq!(json["status"], "failure");
    assert_eq!(json["elapsed_time"], "5m0s");
    assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
    assert_eq!(json["all_checks"][0]["duration"], 42_000);
    assert!(json["all_checks"][0].get("duration_ms").is_none());
}

#[test]
fn watch_result_serde_round_trip() {
    let result = CiWatchResult {
        status: CiOverallStatus::Timeout,
        elapsed_ms: 1_800_000,
        checks: vec![check("e2e", CheckBucket::Pending, "")],
        error: Some("watch timed out".to_string()),
    };

    let json = serde_json::to_string(&result).unwrap();
    let back: CiWatchResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
