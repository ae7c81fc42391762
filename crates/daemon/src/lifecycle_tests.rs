// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::settings::Secret;
use std::time::Duration;

#[test]
fn lock_path_appends_suffix() {
    assert_eq!(
        lock_path(Path::new("/var/lib/stigwatch/history.txt")),
        PathBuf::from("/var/lib/stigwatch/history.txt.lock")
    );
    assert_eq!(lock_path(Path::new("history")), PathBuf::from("history.lock"));
}

#[test]
fn second_lock_on_same_history_fails() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("state").join("history.txt");

    let lock = acquire_lock(&history).unwrap();
    let pid = std::fs::read_to_string(lock.path()).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    let err = acquire_lock(&history).unwrap_err();
    assert!(matches!(err, LifecycleError::LockFailed(..)));
}

#[test]
fn dropping_lock_releases_it() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("history.txt");

    let lock = acquire_lock(&history).unwrap();
    let path = lock.path().to_path_buf();
    drop(lock);
    assert!(!path.exists());

    assert!(acquire_lock(&history).is_ok());
}

#[test]
fn production_stack_builds_from_settings() {
    let service = ServiceSettings {
        api_base: "https://stig.example.com/api".to_string(),
        authority: "https://idp.example.com/realms/stig".to_string(),
        client_id: "stigwatch".to_string(),
        client_secret: Secret::from("secret".to_string()),
        scope: None,
        response_timeout: Duration::from_secs(5),
        token_refresh_margin: Duration::from_secs(60),
    };
    assert!(build_deps(&service).is_ok());
}
