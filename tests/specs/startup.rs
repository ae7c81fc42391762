//! Startup specs
//!
//! Configuration problems are initialization failures: exit code 1 before
//! any file is touched or any request is made.

use crate::prelude::*;

#[test]
fn missing_watch_path_is_an_init_failure() {
    bare()
        .args(["--api-base", DEAD_ENDPOINT, "--authority", DEAD_ENDPOINT])
        .args(["--client-id", "a", "--client-secret", "b", "--collection-id", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing required setting `path`"));
}

#[test]
fn nonexistent_watch_path_is_an_init_failure() {
    let scratch = Scratch::new();
    scratch
        .stigwatch()
        .args(["--path", "/nonexistent/stigwatch/watch"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn one_shot_events_mode_is_rejected() {
    let scratch = Scratch::new();
    scratch
        .stigwatch()
        .args(["--mode", "events", "--one-shot"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("one-shot runs require scan mode"));
}

#[test]
fn zero_batch_size_is_rejected() {
    let scratch = Scratch::new();
    scratch
        .stigwatch()
        .args(["--batch-size", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("batch size must be non-zero"));
}

#[test]
fn malformed_url_is_rejected() {
    let scratch = Scratch::new();
    scratch
        .stigwatch()
        .args(["--api-base", "stig.example.com"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("`api_base` is not a valid URL"));
}

#[test]
fn unknown_config_file_key_is_rejected() {
    let scratch = Scratch::new();
    let config = scratch.file("stigwatch.toml", "batch_sise = 4\n");
    scratch
        .stigwatch()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn usage_errors_share_the_init_failure_code() {
    bare()
        .args(["--batch-size", "many"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--batch-size"));
}
