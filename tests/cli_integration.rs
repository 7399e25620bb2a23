//! Integration tests for the memoize CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn memoize_bin() -> Command {
    Command::cargo_bin("memoize").expect("binary is built")
}

fn key_output(args: &[&str]) -> String {
    let output = memoize_bin().arg("key").args(args).output().unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_version_command() {
    memoize_bin()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("memoize"));
}

#[test]
fn test_help_command() {
    memoize_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("key"))
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_key_is_stable_hex() {
    let first = key_output(&["3", "[1,2]"]);
    let second = key_output(&["3", "[1,2]"]);

    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_key_distinguishes_int_and_float() {
    assert_ne!(key_output(&["3"]), key_output(&["3.0"]));
}

#[test]
fn test_key_named_order_is_canonical() {
    let a = key_output(&["--named", "x=1", "--named", "y=2"]);
    let b = key_output(&["--named", "y=2", "--named", "x=1"]);
    assert_eq!(a, b);
}

#[test]
fn test_key_rejects_invalid_json() {
    memoize_bin()
        .args(["key", "not-json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Json"));
}

#[test]
fn test_demo_runs() {
    memoize_bin()
        .args(["demo", "--size", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("function ran 1 time(s)"))
        .stdout(predicate::str::contains("entries: 2"));
}

#[test]
fn test_init_creates_config() {
    let dir = tempdir().unwrap();

    memoize_bin()
        .args(["init", "--path"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration created"));

    let written = std::fs::read_to_string(dir.path().join("memoize.toml")).unwrap();
    assert!(written.contains("max_depth"));

    memoize_bin()
        .args(["init", "--path"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_config_command_reads_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[digest]\nmax_depth = 7\n").unwrap();

    memoize_bin()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_depth = 7"));
}
