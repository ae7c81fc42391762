//! Fault specs
//!
//! A connectivity fault whose retry budget runs out stops the agent with
//! the fault's exit code.

use crate::prelude::*;

#[test]
fn unreachable_authority_exhausts_retries_with_code_3() {
    let scratch = Scratch::new();
    scratch
        .stigwatch()
        .args(["--one-shot", "--auth-retry-bound", "2", "--auth-retry-delay", "50ms"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("authOffline"));
}

#[test]
fn unreachable_authority_in_events_mode_exits_with_code_3() {
    let scratch = Scratch::new();
    scratch
        .stigwatch()
        .args(["--mode", "events", "--use-polling"])
        .args(["--auth-retry-bound", "1", "--auth-retry-delay", "50ms"])
        .assert()
        .code(3);
}

#[test]
fn history_is_left_untouched_when_nothing_was_delivered() {
    let scratch = Scratch::new();
    scratch.file("watch/host.cklb", "{}");
    scratch
        .stigwatch()
        .args(["--one-shot", "--auth-retry-bound", "1", "--auth-retry-delay", "50ms"])
        .assert()
        .code(3);

    let journal = std::fs::read_to_string(scratch.history()).unwrap_or_default();
    assert!(!journal.contains("host.cklb"), "journal: {journal}");
}
