// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lifecycle: single-instance lock, adapter wiring, shutdown signals

use crate::settings::ServiceSettings;
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use sw_adapters::{
    ApiError, AuthError, CachedTokenProvider, CklbParser, HttpComplianceApi, OidcTokenProvider,
    TracedComplianceApi, TracedTokenProvider,
};
use sw_core::SystemClock;
use sw_engine::PipelineDeps;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

pub type DaemonTokens = TracedTokenProvider<CachedTokenProvider<OidcTokenProvider, SystemClock>>;
pub type DaemonApi = TracedComplianceApi<HttpComplianceApi<DaemonTokens>>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire {0}: another instance is using this history file")]
    LockFailed(PathBuf, #[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote service client: {0}")]
    Api(#[from] ApiError),
    #[error("credential authority client: {0}")]
    Auth(#[from] AuthError),
}

/// Exclusive lock next to the history file, released and removed on drop
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    // NOTE(lifetime): held to keep the exclusive lock
    #[allow(dead_code)]
    file: File,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove lock file");
        }
    }
}

pub fn lock_path(history: &Path) -> PathBuf {
    let mut name = history.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Take the single-instance lock for `history` and write our PID into it
pub fn acquire_lock(history: &Path) -> Result<InstanceLock, LifecycleError> {
    let path = lock_path(history);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    // Open without truncating so a running instance's PID survives a failed attempt
    let mut file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)?;
    file.try_lock_exclusive()
        .map_err(|e| LifecycleError::LockFailed(path.clone(), e))?;

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(InstanceLock { path, file })
}

/// Wire the production adapters: OIDC tokens behind a cache, the HTTP client, the CKLB decoder
pub fn build_deps(
    service: &ServiceSettings,
) -> Result<PipelineDeps<DaemonApi, DaemonTokens, CklbParser>, LifecycleError> {
    let oidc = OidcTokenProvider::new(
        &service.authority,
        service.client_id.clone(),
        service.client_secret.expose(),
        service.scope.clone(),
        service.response_timeout,
    )?;
    let tokens = TracedTokenProvider::new(CachedTokenProvider::new(
        oidc,
        SystemClock,
        service.token_refresh_margin,
    ));
    let http = HttpComplianceApi::new(&service.api_base, service.response_timeout, tokens.clone())?;

    Ok(PipelineDeps {
        api: TracedComplianceApi::new(http),
        tokens,
        parser: CklbParser,
    })
}

/// Resolves on SIGTERM or SIGINT
pub async fn shutdown_signal() {
    let (Ok(mut sigterm), Ok(mut sigint)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) else {
        warn!("signal handlers unavailable, falling back to ctrl-c");
        let _ = tokio::signal::ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
