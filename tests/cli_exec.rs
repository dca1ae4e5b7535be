// tests/cli_exec.rs
//
// Exit behaviour of the `exec` subcommand as seen by a calling script.

#![cfg(unix)]

use std::process::{Command, Output};

fn rvc_bootstrap(args: &[&str]) -> Output {
    // An empty working directory means no Bootstrap.toml: built-in defaults.
    let dir = tempfile::tempdir().expect("tempdir");
    Command::new(env!("CARGO_BIN_EXE_rvc-bootstrap"))
        .args(args)
        .current_dir(dir.path())
        .env("RVC_BOOTSTRAP_LOG", "warn")
        .output()
        .expect("binary runs")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[test]
fn successful_command_mirrors_output() {
    let out = rvc_bootstrap(&["exec", "--description", "Say hello", "--", "echo", "hello"]);

    assert!(out.status.success(), "stderr: {}", text(&out.stderr));
    let stdout = text(&out.stdout);
    assert!(stdout.contains("Say hello... (command: echo hello)"));
    assert!(stdout.contains("hello\n"));
    assert!(stdout.contains("Say hello done."));
}

#[test]
fn fail_fast_exit_terminates_with_status_one() {
    let out = rvc_bootstrap(&["exec", "--description", "Broken step", "--", "exit", "3"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = text(&out.stderr);
    assert!(stderr.contains("Broken step failed with exit code 3"), "stderr: {stderr}");
    assert!(text(&out.stdout).contains("Broken step failed with exit code 3."));
}

#[test]
fn no_fail_fast_reports_the_code_and_succeeds() {
    let out = rvc_bootstrap(&["exec", "--no-fail-fast", "--", "exit", "3"]);

    assert!(out.status.success(), "stderr: {}", text(&out.stderr));
    assert!(text(&out.stdout).contains("exit code 3"));
}

#[test]
fn timeout_terminates_with_status_one() {
    let out = rvc_bootstrap(&["exec", "--timeout", "1", "--description", "Slow step", "--", "sleep", "5"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(text(&out.stderr).contains("Slow step timed out"));
}

#[test]
fn zero_timeout_is_rejected() {
    let out = rvc_bootstrap(&["exec", "--timeout", "0", "--", "true"]);

    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn stderr_lines_are_tagged() {
    let out = rvc_bootstrap(&["exec", "--", "echo oops 1>&2"]);

    assert!(out.status.success());
    assert!(text(&out.stderr).contains("[stderr] oops"));
}

#[test]
fn dry_run_executes_nothing() {
    let out = rvc_bootstrap(&["--dry-run", "install", "--torch", "cpu", "--gpu", "amd"]);

    assert!(out.status.success(), "stderr: {}", text(&out.stderr));
    let stdout = text(&out.stdout);
    assert!(stdout.contains("rvc-bootstrap dry-run"));
    assert!(stdout.contains("/cpu"));
    assert!(stdout.contains("requirements-dml.txt"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let out = rvc_bootstrap(&["--config", "nope.toml", "exec", "--", "true"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(text(&out.stderr).contains("rvc-bootstrap error"));
}
