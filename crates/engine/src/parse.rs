// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency stage turning candidate paths into parsed results

use crate::cargo::CargoQueue;
use crate::SharedHistory;
use std::path::PathBuf;
use std::sync::Arc;
use sw_adapters::{ChecklistParser, FormatHint, ParseError};
use sw_core::{Alarm, ImportConfig, ParsedResult};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error("unrecognized extension")]
    UnknownFormat,
    #[error("unreadable: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("decoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct ParseStage<P> {
    parser: P,
    import: Arc<ImportConfig>,
    cargo: CargoQueue,
    /// Records undecodable paths; absent when nothing checkpoints
    history: Option<SharedHistory>,
    alarm: Alarm,
    concurrency: usize,
}

impl<P: ChecklistParser> ParseStage<P> {
    pub fn new(
        parser: P,
        import: Arc<ImportConfig>,
        cargo: CargoQueue,
        history: Option<SharedHistory>,
        alarm: Alarm,
        concurrency: usize,
    ) -> Self {
        Self {
            parser,
            import,
            cargo,
            history,
            alarm,
            concurrency: concurrency.max(1),
        }
    }

    /// Consume candidates until the channel closes, then close the cargo queue
    pub async fn run(self, mut candidates: mpsc::Receiver<PathBuf>) {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        loop {
            // Stop pulling while the delivery queue is full or the pipeline is paused
            self.cargo.wait_for_room().await;
            self.alarm.wait_clear().await;

            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let Some(path) = candidates.recv().await else {
                break;
            };

            let parser = self.parser.clone();
            let import = Arc::clone(&self.import);
            let cargo = self.cargo.clone();
            let history = self.history.clone();
            workers.spawn(async move {
                let _permit = permit;
                match parse_file(&parser, &import, path.clone()).await {
                    Ok(result) => {
                        tracing::debug!(
                            path = %path.display(),
                            asset = %result.target.name,
                            checklists = result.checklists.len(),
                            "parsed"
                        );
                        cargo.push(result);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "parse failed");
                        // Never retry poison input
                        if let Some(history) = history {
                            history.lock().unwrap_or_else(|e| e.into_inner()).add(path);
                        }
                    }
                }
            });

            while let Some(joined) = workers.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "parse worker failed");
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "parse worker failed");
            }
        }
        self.cargo.close();
        tracing::debug!("parse stage drained");
    }
}

async fn parse_file<P: ChecklistParser>(
    parser: &P,
    import: &Arc<ImportConfig>,
    path: PathBuf,
) -> Result<ParsedResult, FileError> {
    let hint = FormatHint::from_path(&path).ok_or(FileError::UnknownFormat)?;
    let bytes = tokio::fs::read(&path).await?;

    let parser = parser.clone();
    let import = Arc::clone(import);
    let mut result =
        tokio::task::spawn_blocking(move || parser.parse(&bytes, hint, &import)).await??;
    result.source_ref = path;
    Ok(result)
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
