//! Shared fixtures for the black-box tests

#![allow(dead_code)]
#![allow(deprecated)]

pub use assert_cmd::Command;
pub use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

/// Nothing listens here, so every connection is refused immediately
pub const DEAD_ENDPOINT: &str = "http://127.0.0.1:1";

/// Path to the stigwatch binary, building it when the root package is tested alone
fn binary() -> &'static Path {
    static BINARY: OnceLock<PathBuf> = OnceLock::new();
    BINARY.get_or_init(|| {
        let path = assert_cmd::cargo::cargo_bin("stigwatch");
        if !path.exists() {
            let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
            let status = std::process::Command::new(cargo)
                .args(["build", "-p", "sw-daemon", "--bin", "stigwatch"])
                .status()
                .expect("failed to run cargo build");
            assert!(status.success(), "building stigwatch failed");
        }
        path
    })
}

/// A scratch watch directory plus state directory
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("watch")).unwrap();
        std::fs::create_dir(dir.path().join("state")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("watch")
    }

    pub fn history(&self) -> PathBuf {
        self.dir.path().join("state").join("history.txt")
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Fully configured invocation pointed at dead endpoints
    pub fn stigwatch(&self) -> Command {
        let mut cmd = bare();
        cmd.args(["--api-base", DEAD_ENDPOINT, "--authority", DEAD_ENDPOINT])
            .args(["--client-id", "stigwatch", "--client-secret", "secret"])
            .args(["--collection-id", "1"])
            .arg("--path")
            .arg(self.root())
            .arg("--history-file")
            .arg(self.history())
            .args(["--response-timeout", "2s", "--log-level", "debug"])
            .timeout(Duration::from_secs(60));
        cmd
    }
}

/// The binary with no settings and a clean STIGWATCH_* environment
pub fn bare() -> Command {
    let mut cmd = Command::new(binary());
    for (key, _) in std::env::vars() {
        if key.starts_with("STIGWATCH_") || key == "RUST_LOG" {
            cmd.env_remove(key);
        }
    }
    cmd
}
