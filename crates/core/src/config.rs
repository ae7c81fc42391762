// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline configuration
//!
//! Deserializable from TOML (durations as humantime strings such as "30s").
//! The daemon layers CLI flags and environment on top.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("watched path {0} does not exist or is not a directory")]
    BadRoot(PathBuf),
    #[error("{0} must be non-zero")]
    Zero(&'static str),
    #[error("one-shot runs require scan mode")]
    OneShotRequiresScan,
    #[error("no file extensions configured")]
    NoExtensions,
    #[error("no decoder for any configured extension: {0:?}")]
    NoDecoder(Vec<String>),
    #[error("collection id is required")]
    NoCollection,
}

/// How candidate files are discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Periodic full-tree enumeration against History
    Scan,
    /// Live filesystem notifications
    Events,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub root: PathBuf,
    pub mode: DiscoveryMode,
    /// Recognized extensions, without the dot
    pub extensions: Vec<String>,
    /// Globs relative to the root; matching files and directories are skipped
    pub ignore_globs: Vec<String>,
    pub ignore_dot: bool,
    #[serde(with = "humantime_serde")]
    pub scan_interval: Duration,
    pub one_shot: bool,
    /// Events mode: forward files already present at startup
    pub add_existing: bool,
    /// Events mode: poll instead of native notifications
    pub use_polling: bool,
    /// Events mode: wait for the size to settle this long; zero disables
    #[serde(with = "humantime_serde")]
    pub stability_threshold: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mode: DiscoveryMode::Scan,
            extensions: vec!["ckl".to_string(), "xml".to_string(), "cklb".to_string()],
            ignore_globs: Vec::new(),
            ignore_dot: true,
            scan_interval: Duration::from_secs(300),
            one_shot: false,
            add_existing: false,
            use_polling: false,
            stability_threshold: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub collection_id: String,
    pub batch_size: usize,
    #[serde(with = "humantime_serde")]
    pub batch_delay: Duration,
    pub parse_concurrency: usize,
    /// Create missing assets and assign benchmarks
    pub create_objects: bool,
    /// Require benchmark and revision to be installed, not only the benchmark
    pub strict_revision_check: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            collection_id: String::new(),
            batch_size: 15,
            batch_delay: Duration::from_secs(2),
            parse_concurrency: 8,
            create_objects: true,
            strict_revision_check: true,
        }
    }
}

impl DeliveryConfig {
    /// Delivery queue depth above which the parse stage stops pulling
    pub fn high_water_mark(&self) -> usize {
        self.batch_size.saturating_mul(2).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: PathBuf,
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("history.txt"),
            flush_interval: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// Probe budget; zero retries forever
    pub bound: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(30),
            bound: 0,
        }
    }
}

/// Recovery policy for `noToken` and `noGrant`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFaultPolicy {
    /// Exit with the fault code as soon as the alarm is raised
    #[default]
    Terminal,
    /// Probe on the same schedule as the connectivity faults
    Retry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub discovery: DiscoveryConfig,
    pub delivery: DeliveryConfig,
    pub history: HistoryConfig,
    pub api_retry: RetryConfig,
    pub auth_retry: RetryConfig,
    pub config_fault_policy: ConfigFaultPolicy,
}

impl PipelineConfig {
    /// Checks that must pass before any queue is created
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.discovery.root.is_dir() {
            return Err(ConfigError::BadRoot(self.discovery.root.clone()));
        }
        if self.discovery.extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        if self.discovery.one_shot && self.discovery.mode != DiscoveryMode::Scan {
            return Err(ConfigError::OneShotRequiresScan);
        }
        if self.delivery.batch_size == 0 {
            return Err(ConfigError::Zero("batch size"));
        }
        if self.delivery.parse_concurrency == 0 {
            return Err(ConfigError::Zero("parse concurrency"));
        }
        if self.history.flush_interval.is_zero() {
            return Err(ConfigError::Zero("history flush interval"));
        }
        // Continuous scans and the poll watcher both run on this cadence
        if self.discovery.scan_interval.is_zero() && !self.discovery.one_shot {
            return Err(ConfigError::Zero("scan interval"));
        }
        if self.delivery.collection_id.is_empty() {
            return Err(ConfigError::NoCollection);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
