mod common;

use serde_json::Value;

use common::{arg, fixture_path, run_ok, run_unveil};

// ============================================================================
// version / completions
// ============================================================================

#[test]
fn version_human() {
    let stdout = run_ok(&["version"]);
    assert!(stdout.starts_with("unveil "), "unexpected output: {stdout}");
    assert!(stdout.contains('.'), "missing version number: {stdout}");
}

#[test]
fn version_json() {
    let stdout = run_ok(&["version", "--format", "json"]);
    let parsed: Value = serde_json::from_str(&stdout).expect("version JSON should be valid");
    assert_eq!(parsed["name"], "unveil");
    assert!(parsed["version"].is_string());
}

#[test]
fn completions_bash() {
    let stdout = run_ok(&["completions", "bash"]);
    assert!(stdout.contains("unveil"), "bash completions: {stdout}");
}

#[test]
fn unknown_subcommand_fails() {
    let output = run_unveil(&["launch"]);
    assert!(!output.status.success());
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn validate_valid_config() {
    let page = fixture_path("page.yaml");
    let stdout = run_ok(&["validate", arg(&page)]);
    assert!(stdout.contains(": ok"), "unexpected output: {stdout}");
}

#[test]
fn validate_invalid_config_lists_issues() {
    let invalid = fixture_path("invalid.yaml");
    let output = run_unveil(&["validate", "--format", "json", arg(&invalid)]);
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let reports: Value = serde_json::from_str(&stdout).expect("report JSON should be valid");
    assert_eq!(reports[0]["valid"], false);
    let paths: Vec<&str> = reports[0]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"countdown.duration"), "{paths:?}");
    assert!(paths.contains(&"artifact.source"), "{paths:?}");
}

#[test]
fn validate_strict_promotes_warnings() {
    let warnings = fixture_path("warnings.yaml");
    run_ok(&["validate", arg(&warnings)]);

    let output = run_unveil(&["validate", "--strict", arg(&warnings)]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_missing_file() {
    let output = run_unveil(&["validate", "/tmp/nonexistent_unveil_config.yaml"]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// status
// ============================================================================

#[test]
fn status_an_hour_before_a_fixed_target() {
    let page = fixture_path("page.yaml");
    let stdout = run_ok(&["status", "-c", arg(&page), "--at", "2098-12-31T23:00:00Z"]);
    assert!(stdout.contains("remaining: 01:00:00"), "{stdout}");
    assert!(stdout.contains("(configured)"), "{stdout}");
}

#[test]
fn status_json_for_the_stock_page() {
    let stdout = run_ok(&["status", "--at", "2026-01-08T04:00:00Z", "--format", "json"]);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["target_ms"], 1_767_848_400_000_i64);
    assert_eq!(report["display"], "01:00:00");
    assert_eq!(report["source"], "configured");
    assert_eq!(report["expired"], false);
}

#[test]
fn status_after_the_target_reports_expired() {
    let page = fixture_path("page.yaml");
    let stdout = run_ok(&["status", "-c", arg(&page), "--at", "2099-06-01T00:00:00Z"]);
    assert!(stdout.contains("remaining: expired"), "{stdout}");
}

#[test]
fn status_does_not_open_a_duration_window() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let duration = fixture_path("duration.yaml");

    let stdout = run_ok(&[
        "status",
        "-c",
        arg(&duration),
        "--state-file",
        arg(&state),
        "--format",
        "json",
    ]);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["source"], "ephemeral");
    assert_eq!(report["remaining_ms"], 48 * 3_600_000_u64);
    assert!(!state.exists());
}

#[test]
fn status_rejects_a_bad_instant() {
    let output = run_unveil(&["status", "--at", "next tuesday"]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// reset
// ============================================================================

#[test]
fn reset_clears_the_duration_slot() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    std::fs::write(&state, r#"{"launch.target": "4070908800000", "theme": "dark"}"#).unwrap();
    let duration = fixture_path("duration.yaml");

    let before = run_ok(&["status", "-c", arg(&duration), "--state-file", arg(&state)]);
    assert!(before.contains("(persisted)"), "{before}");

    let stdout = run_ok(&["reset", "-c", arg(&duration), "--state-file", arg(&state)]);
    assert!(stdout.contains("cleared"), "{stdout}");

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&state).unwrap()).unwrap();
    assert!(doc.get("launch.target").is_none());
    assert_eq!(doc["theme"], "dark");
}

#[test]
fn reset_fixed_target_is_a_no_op() {
    let page = fixture_path("page.yaml");
    let stdout = run_ok(&["reset", "-c", arg(&page)]);
    assert!(stdout.contains("nothing to reset"), "{stdout}");
}

// ============================================================================
// run
// ============================================================================

#[test]
fn run_rehearsal_reaches_the_end_screen() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.jsonl");
    let quick = fixture_path("quick.yaml");

    let stdout = run_ok(&[
        "run",
        "-c",
        arg(&quick),
        "--rehearse-from",
        "2098-12-31T23:59:58Z",
        "--viewport",
        "375x812",
        "--events-file",
        arg(&events),
        "--no-input",
        "-q",
    ]);

    assert!(stdout.contains("00:00:00"), "{stdout}");
    assert!(stdout.contains("*** 300 pieces over 375x812 ***"), "{stdout}");
    assert!(stdout.contains("SEE YOU THERE"), "{stdout}");
    assert!(stdout.contains("Doors open at 10:30"), "{stdout}");

    let lines: Vec<Value> = std::fs::read_to_string(&events)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.first().unwrap()["type"], "SequenceStarted");
    let last = lines.last().unwrap();
    assert_eq!(last["type"], "SequenceFinished");
    assert_eq!(last["final_stage"], "terminal");
    assert_eq!(last["completed"], true);
}

#[test]
fn run_without_input_rejects_a_gesture_gated_video() {
    let video = fixture_path("video_gesture.yaml");
    run_ok(&["validate", arg(&video)]);

    let output = run_unveil(&["run", "-c", arg(&video), "--no-input"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--no-input"), "{stderr}");
}

#[test]
fn run_rejects_an_invalid_config() {
    let invalid = fixture_path("invalid.yaml");
    let output = run_unveil(&["run", "-c", arg(&invalid), "--no-input"]);
    assert_eq!(output.status.code(), Some(2));
}
