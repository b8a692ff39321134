//! Integration tests for the `nexrun` CLI binary.
//!
//! Argument parsing, help output, shell completions and configuration
//! errors, all without a live console.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `nexrun` binary with env isolation.
///
/// Clears every `NEXRUN_*` variable and points the config directories at
/// `home`, so tests never touch the user's real configuration.
fn nexrun_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("nexrun");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("NEXRUN_PROFILE")
        .env_remove("NEXRUN_URL")
        .env_remove("NEXRUN_USERNAME")
        .env_remove("NEXRUN_PASSWORD")
        .env_remove("NEXRUN_OUTPUT")
        .env_remove("NEXRUN_INSECURE")
        .env_remove("NEXRUN_TIMEOUT");
    cmd
}

/// Write `contents` as the config file `nexrun` will load under `home`.
fn write_config(home: &Path, contents: &str) {
    let dir = home.join(".config").join("nexrun");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = nexrun_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("sites"))
                .and(predicate::str::contains("scans"))
                .and(predicate::str::contains("reports")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nexrun"));
}

#[test]
fn test_reports_help_shows_wait_options() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["reports", "wait", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--poll-interval")
                .and(predicate::str::contains("--max-attempts"))
                .and(predicate::str::contains("--max-wait")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nexrun"));
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_unknown_shell() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["completions", "tcsh"])
        .assert()
        .code(2);
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_run_requires_target() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["run", "--scan-name", "web"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--target"));
}

#[test]
fn test_unknown_output_format() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["-o", "xml", "scans", "last"])
        .assert()
        .code(2);
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_missing_config_points_at_init() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["sites", "find", "web"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nexrun config init"));
}

#[test]
fn test_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
            default_profile = "lab"

            [profiles.lab]
            url = "https://console:3780"
            username = "nxadmin"
        "#,
    );
    nexrun_cmd(home.path())
        .args(["--profile", "prod", "scans", "last"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("prod").and(predicate::str::contains("lab")));
}

#[test]
fn test_missing_username_is_auth_error() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["--url", "https://127.0.0.1:9", "scans", "last"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials"));
}

#[test]
fn test_invalid_url_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["--url", "not a url", "-u", "nxadmin", "scans", "last"])
        .env("NEXRUN_PASSWORD", "s3cret")
        .assert()
        .code(2);
}

#[test]
fn test_bad_poll_interval_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args([
            "--url",
            "https://127.0.0.1:9",
            "-u",
            "nxadmin",
            "scans",
            "wait",
            "7",
            "--poll-interval",
            "soon",
        ])
        .env("NEXRUN_PASSWORD", "s3cret")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("poll-interval"));
}

#[test]
fn test_unreachable_console_is_connection_error() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args([
            "--url",
            "http://127.0.0.1:9",
            "-u",
            "nxadmin",
            "--timeout",
            "5",
            "sites",
            "find",
            "web",
        ])
        .env("NEXRUN_PASSWORD", "s3cret")
        .assert()
        .code(7);
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_profiles_plain() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
            default_profile = "lab"

            [profiles.lab]
            url = "https://lab:3780"

            [profiles.prod]
            url = "https://prod:3780"
        "#,
    );
    nexrun_cmd(home.path())
        .args(["config", "profiles", "-o", "plain"])
        .assert()
        .success()
        .stdout("lab\nprod\n");
}

#[test]
fn test_config_show_redacts_passwords() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
            [profiles.default]
            url = "https://console:3780"
            username = "nxadmin"
            password = "hunter2"
        "#,
    );
    nexrun_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nxadmin").and(predicate::str::contains("hunter2").not()));
}

#[test]
fn test_config_use_rejects_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    nexrun_cmd(home.path())
        .args(["config", "use", "nowhere"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nowhere"));
}
