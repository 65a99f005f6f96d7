//! End-to-end tests for the kiosk CLI.
//!
//! Each test runs the real binary against a temporary data directory and a
//! config path that does not exist, so the user's own settings never leak in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn kiosk(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kiosk").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.path().join("no-config.json"))
        .arg("--data-dir")
        .arg(dir.path().join("data"));
    cmd
}

fn alarm_document(dir: &TempDir) -> serde_json::Value {
    let text = fs::read_to_string(dir.path().join("data").join("alarms.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ============================================================================
// Alarm Workflow
// ============================================================================

#[test]
fn test_list_empty_store() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .args(["alarm", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No alarms"));
}

#[test]
fn test_add_list_disable_remove() {
    let dir = TempDir::new().unwrap();

    kiosk(&dir)
        .args(["alarm", "add", "--id", "wake", "--time", "06:45", "--label", "Wake up"])
        .args(["--repeat", "mon,tue,wed,thu,fri"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added alarm wake at 06:45"));

    kiosk(&dir)
        .args(["alarm", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("wake")
                .and(predicate::str::contains("06:45"))
                .and(predicate::str::contains("Mon,Tue,Wed,Thu,Fri")),
        );

    kiosk(&dir)
        .args(["alarm", "disable", "wake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Disabled alarm wake"));
    assert_eq!(alarm_document(&dir)[0]["enabled"], false);

    kiosk(&dir)
        .args(["alarm", "remove", "wake"])
        .assert()
        .success();
    assert_eq!(alarm_document(&dir), serde_json::json!([]));
}

#[test]
fn test_list_json_matches_document() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .args(["alarm", "add", "--id", "a", "--time", "7:05", "--repeat", "daily"])
        .assert()
        .success();

    let output = kiosk(&dir)
        .args(["alarm", "list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed, alarm_document(&dir));
    assert_eq!(listed[0]["repeat"], serde_json::json!([1, 1, 1, 1, 1, 1, 1]));
}

#[test]
fn test_duplicate_id_is_rejected() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .args(["alarm", "add", "--id", "a", "--time", "07:00"])
        .assert()
        .success();
    kiosk(&dir)
        .args(["alarm", "add", "--id", "a", "--time", "08:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    for action in ["remove", "enable", "disable"] {
        kiosk(&dir)
            .args(["alarm", action, "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no alarm with id 'ghost'"));
    }
}

#[test]
fn test_invalid_time_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .args(["alarm", "add", "--time", "25:00"])
        .assert()
        .failure()
        .code(2);
    assert!(!dir.path().join("data").join("alarms.json").exists());
}

#[test]
fn test_corrupted_document_lists_empty() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("alarms.json"), "{ broken").unwrap();

    kiosk(&dir)
        .args(["alarm", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No alarms"));
}

// ============================================================================
// Config And Misc
// ============================================================================

#[test]
fn test_config_file_selects_data_dir() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("from-config");
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        serde_json::json!({ "data_dir": data, "alarm_file": "wake.json" }).to_string(),
    )
    .unwrap();

    Command::cargo_bin("kiosk")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["alarm", "add", "--id", "a", "--time", "07:00"])
        .assert()
        .success();
    assert!(Path::new(&data).join("wake.json").exists());
}

#[test]
fn test_check_with_nothing_due() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No alarms due"));
}

#[test]
fn test_play_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .args(["play", "/nonexistent/kiosk/clip.mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("media file not found"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kiosk"));
}

#[test]
fn test_version() {
    Command::cargo_bin("kiosk")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
