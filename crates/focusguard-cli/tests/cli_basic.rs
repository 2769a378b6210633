//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

struct Cli {
    dir: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Run a CLI command and return (stdout, stderr, code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_focusguard-cli"))
            .env("FOCUSGUARD_DATA_DIR", self.dir.path())
            .env_remove("FOCUSGUARD_LOG")
            .args(args)
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn success(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
        stdout
    }

    fn usage_file(&self, json: &str) -> PathBuf {
        let path = self.dir.path().join("usage.json");
        std::fs::write(&path, json).expect("Failed to write usage file");
        path
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp path is UTF-8")
}

const FEED_45_MIN: &str = r#"[
    {"package_name": "com.example.feed", "total_foreground_millis": 2700000},
    {"package_name": "com.example.maps", "total_foreground_millis": 600000}
]"#;

#[test]
fn test_budget_set_and_list() {
    let cli = Cli::new();
    cli.success(&["budget", "set", "com.example.feed", "30"]);
    cli.success(&["budget", "set", "com.example.video", "60", "--disabled"]);

    let out = cli.success(&["budget", "list", "--json"]);
    let budgets: serde_json::Value = serde_json::from_str(&out).unwrap();
    let budgets = budgets.as_array().unwrap();
    assert_eq!(budgets.len(), 2);
    let feed = budgets
        .iter()
        .find(|b| b["package_name"] == "com.example.feed")
        .unwrap();
    assert_eq!(feed["daily_budget_minutes"], 30);
    assert_eq!(feed["enabled"], true);
}

#[test]
fn test_budget_rejects_zero_minutes() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["budget", "set", "com.example.feed", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_budget_remove() {
    let cli = Cli::new();
    cli.success(&["budget", "set", "com.example.feed", "30"]);
    cli.success(&["budget", "remove", "com.example.feed"]);
    let (_, _, code) = cli.run(&["budget", "remove", "com.example.feed"]);
    assert_ne!(code, 0);
}

#[test]
fn test_cycle_reports_over_budget_apps() {
    let cli = Cli::new();
    cli.success(&["budget", "set", "com.example.feed", "30"]);
    cli.success(&["budget", "set", "com.example.maps", "30"]);
    let usage = cli.usage_file(FEED_45_MIN);

    let out = cli.success(&["cycle", "--usage", arg(&usage)]);
    assert_eq!(out.trim(), "com.example.feed");

    let out = cli.success(&["usage", "today", "--json"]);
    let records: serde_json::Value = serde_json::from_str(&out).unwrap();
    let feed = records
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["package_name"] == "com.example.feed")
        .unwrap();
    assert_eq!(feed["minutes_used"], 45);
}

#[test]
fn test_cycle_json_report() {
    let cli = Cli::new();
    cli.success(&["budget", "set", "com.example.feed", "30"]);
    let usage = cli.usage_file(FEED_45_MIN);

    let out = cli.success(&["cycle", "--usage", arg(&usage), "--json"]);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["status"], "completed");
    assert_eq!(report["over_budget"][0], "com.example.feed");
}

#[test]
fn test_cycle_missing_usage_file_fails() {
    let cli = Cli::new();
    let missing = cli.dir.path().join("missing.json");
    let (_, stderr, code) = cli.run(&["cycle", "--usage", arg(&missing)]);
    assert_ne!(code, 0);
    assert!(stderr.contains("usage unavailable"));
}

#[test]
fn test_check_blocks_once_then_noops() {
    let cli = Cli::new();
    cli.success(&["budget", "set", "com.example.feed", "30"]);
    let usage = cli.usage_file(FEED_45_MIN);

    let out = cli.success(&[
        "check",
        "--usage",
        arg(&usage),
        "com.example.feed",
        "com.example.feed",
        "app.focusguard",
        "com.example.feed",
    ]);
    let verdicts: Vec<&str> = out
        .lines()
        .map(|l| l.split('\t').nth(1).unwrap())
        .collect();
    assert_eq!(verdicts, vec!["block", "noop", "allow", "block"]);
}

#[test]
fn test_check_grant_allows() {
    let cli = Cli::new();
    cli.success(&["budget", "set", "com.example.feed", "30"]);
    let usage = cli.usage_file(FEED_45_MIN);

    let out = cli.success(&[
        "check",
        "--usage",
        arg(&usage),
        "--grant",
        "com.example.feed",
        "--json",
        "com.example.feed",
    ]);
    let lines: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(lines[0]["foreground"], "com.example.feed");
    assert_eq!(lines[0]["outcome"], "allow");
}

#[test]
fn test_config_get_set_reset() {
    let cli = Cli::new();
    assert_eq!(cli.success(&["config", "get", "enforcement.grace_minutes"]).trim(), "5");

    cli.success(&["config", "set", "enforcement.grace_minutes", "10"]);
    assert_eq!(cli.success(&["config", "get", "enforcement.grace_minutes"]).trim(), "10");

    let (_, _, code) = cli.run(&["config", "set", "enforcement.grace_minutes", "0"]);
    assert_ne!(code, 0);

    cli.success(&["config", "reset"]);
    assert_eq!(cli.success(&["config", "get", "enforcement.grace_minutes"]).trim(), "5");
}

#[test]
fn test_config_unknown_key_fails() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["config", "get", "enforcement.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}
