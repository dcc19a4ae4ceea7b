//! CLI integration tests
//!
//! These never actually record: every scenario fails fast on validation,
//! before any capture device is touched.

use assert_cmd::Command;
use predicates::prelude::*;

fn multi_scribe() -> Command {
    Command::cargo_bin("multi-scribe").unwrap()
}

/// Isolated config dir so tests never touch the developer's real config
fn isolated() -> (tempfile::TempDir, Command) {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = multi_scribe();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env_remove("GEMINI_API_KEY");
    (dir, cmd)
}

#[test]
fn help_shows_sources_and_subcommands() {
    multi_scribe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--mic"))
        .stdout(predicate::str::contains("--device"))
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn no_sources_is_a_usage_error() {
    let (_dir, mut cmd) = isolated();
    cmd.env("GEMINI_API_KEY", "test-key")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No sources selected"));
}

#[test]
fn invalid_interval_is_a_usage_error() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--mic", "--interval", "nope"])
        .env("GEMINI_API_KEY", "test-key")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid interval"));
}

#[test]
fn schedule_without_overlap_is_a_usage_error() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--mic", "--interval", "30s", "--window", "30s"])
        .env("GEMINI_API_KEY", "test-key")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("must be longer"));
}

#[test]
fn missing_api_key_fails_fast() {
    let (_dir, mut cmd) = isolated();
    cmd.arg("--mic")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Missing API key"));
}

#[test]
fn config_set_then_get_round_trips() {
    let (dir, mut set) = isolated();
    set.args(["config", "set", "interval", "20s"])
        .assert()
        .success();

    let mut get = multi_scribe();
    get.env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .args(["config", "get", "interval"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20s"));
}

#[test]
fn config_get_unknown_key_errors() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_invalid_duration_errors() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["config", "set", "window", "invalid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn api_key_is_masked_on_get() {
    let (dir, mut set) = isolated();
    set.args(["config", "set", "api_key", "abcdefghijklmnop"])
        .assert()
        .success();

    let mut get = multi_scribe();
    get.env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .args(["config", "get", "api_key"])
        .assert()
        .success()
        .stdout(predicate::str::contains("abcd...mnop"))
        .stdout(predicate::str::contains("abcdefghijklmnop").not());
}

#[test]
fn config_path_points_into_the_app_dir() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("multi-scribe"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_init_refuses_second_run() {
    let (dir, mut init) = isolated();
    init.args(["config", "init"]).assert().success();

    let mut again = multi_scribe();
    again
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
