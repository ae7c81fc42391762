// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stigwatch
//!
//! Watches a directory for STIG checklist results and submits them as
//! reviews to the compliance service. The exit code reports why it stopped.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;
mod settings;

use anyhow::Context;
use clap::Parser;
use sw_core::ExitReason;
use sw_engine::Pipeline;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use crate::settings::{LogSettings, Options, Settings};

#[tokio::main]
async fn main() {
    // Usage errors exit with the init-failure code rather than clap's 2
    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitReason::InitFailure.code()
            } else {
                0
            };
            std::process::exit(code);
        }
    };
    let code = match run(options).await {
        Ok(reason) => reason.code(),
        Err(e) => {
            eprintln!("stigwatch: {:#}", e);
            ExitReason::InitFailure.code()
        }
    };
    std::process::exit(code);
}

/// Everything that owns a resource lives in here so it drops before exit
async fn run(options: Options) -> anyhow::Result<ExitReason> {
    let settings = Settings::load(options).context("invalid configuration")?;
    let _log_guard = setup_logging(&settings.log).context("failed to set up logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %settings.pipeline.discovery.root.display(),
        collection_id = %settings.pipeline.delivery.collection_id,
        "starting stigwatch"
    );

    let lock = match lifecycle::acquire_lock(&settings.pipeline.history.path) {
        Ok(lock) => lock,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(e.into());
        }
    };
    let deps = match lifecycle::build_deps(&settings.service) {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(e.into());
        }
    };
    let pipeline = match Pipeline::new(settings.pipeline, deps) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(e.into());
        }
    };

    let reason = pipeline.run(lifecycle::shutdown_signal()).await;
    drop(lock);
    Ok(reason)
}

fn setup_logging(log: &LogSettings) -> anyhow::Result<WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (writer, guard) = match &log.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(dir)?;
            let name = path
                .file_name()
                .with_context(|| format!("log file {} has no file name", path.display()))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.level)
            .with_context(|| format!("invalid log level {:?}", log.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_ansi(log.file.is_none()).with_writer(writer))
            .try_init()?;
    }

    Ok(guard)
}
