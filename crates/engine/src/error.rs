// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use sw_core::config::ConfigError;
use sw_storage::HistoryError;
use thiserror::Error;

/// Faults that stop the pipeline before or outside normal operation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid ignore glob: {0}")]
    Glob(#[from] globset::Error),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("cannot enumerate watched directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("cannot watch directory: {0}")]
    Watch(#[from] notify::Error),
    #[error("preflight failed: {0}")]
    Preflight(String),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
