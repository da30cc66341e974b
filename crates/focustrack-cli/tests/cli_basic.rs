//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary HOME so the
//! config file and session database start empty.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(home, args, "")
}

fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_focustrack"))
        .args(args)
        .env("HOME", home)
        .env_remove("FOCUSTRACK_ENV")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "timer.work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.short_break_minutes", "7"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "timer.short_break_minutes"]);
    assert_eq!(stdout.trim(), "7");
}

#[test]
fn test_config_rejects_invalid_values() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "timer.work_minutes", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn test_config_list_and_reset() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "timer.auto_start_breaks", "true"]);
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("timer.auto_start_breaks = true"));

    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "timer.auto_start_breaks"]);
    assert_eq!(stdout.trim(), "false");
}

#[test]
fn test_category_lifecycle() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["category", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Coding"));

    let (_, _, code) = run_cli(home.path(), &["category", "add", "Music", "--icon", "🎵"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(home.path(), &["category", "use", "Music"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["category", "list"]);
    assert!(stdout.contains("* 🎵 Music"));

    let (_, _, code) = run_cli(home.path(), &["category", "remove", "Music"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "active_category"]);
    assert_eq!(stdout.trim(), "null");

    let (_, stderr, code) = run_cli(home.path(), &["category", "remove", "Coding"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("built in"));
}

#[test]
fn test_sessions_and_stats_when_empty() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["sessions", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no sessions"));

    let (stdout, _, code) = run_cli(home.path(), &["stats", "--json"]);
    assert_eq!(code, 0);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["all_time_minutes"], 0);
    assert_eq!(report["last_7_days"].as_array().map(Vec::len), Some(7));
}

#[test]
fn test_sessions_clear_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["sessions", "clear"]);
    assert_eq!(code, 1);
    let (stdout, _, code) = run_cli(home.path(), &["sessions", "clear", "--yes"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("deleted 0 sessions"));
}

#[test]
fn test_run_reads_commands_until_quit() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli_with_input(
        home.path(),
        &["run", "--mode", "short"],
        "status\n+2\nstatus\nquit\n",
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Short Break ready (05:00)"));
    assert!(stdout.contains("interval is now 07:00"));
}

#[test]
fn test_run_ends_on_eof() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli_with_input(home.path(), &["run"], "");
    assert_eq!(code, 0);
}
