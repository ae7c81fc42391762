// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic full-tree discovery checked against History
//!
//! `Idle -> Scanning -> Idle` on the interval timer; a one-shot run stops
//! after its single cycle. A path is queued at most once per History
//! lifetime: it is recorded before it is handed to the parse stage.

use crate::error::EngineError;
use crate::filter::FileFilter;
use crate::SharedHistory;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use sw_core::Alarm;
use tokio::sync::mpsc;
use walkdir::WalkDir;

/// Counts from one scan cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub discovered: usize,
    pub queued: usize,
    pub stale: usize,
}

pub struct ScanDiscovery {
    filter: FileFilter,
    history: SharedHistory,
    alarm: Alarm,
    interval: Duration,
    one_shot: bool,
}

impl ScanDiscovery {
    pub fn new(
        filter: FileFilter,
        history: SharedHistory,
        alarm: Alarm,
        interval: Duration,
        one_shot: bool,
    ) -> Self {
        Self {
            filter,
            history,
            alarm,
            interval,
            one_shot,
        }
    }

    /// Run cycles until one-shot completion or until the parse stage goes away
    pub async fn run(self, candidates: mpsc::Sender<PathBuf>) {
        loop {
            self.alarm.wait_clear().await;

            let start = Instant::now();
            match self.cycle(&candidates).await {
                Ok(stats) => tracing::info!(
                    discovered = stats.discovered,
                    queued = stats.queued,
                    stale = stats.stale,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "scan complete"
                ),
                Err(e) => tracing::warn!(error = %e, "scan failed"),
            }

            if self.one_shot || candidates.is_closed() {
                break;
            }
            tokio::time::sleep(self.interval).await;
        }
        tracing::debug!("scan discovery stopped");
    }

    /// One enumeration pass: queue new paths, then drop stale History entries
    pub async fn cycle(&self, candidates: &mpsc::Sender<PathBuf>) -> Result<ScanStats, EngineError> {
        let filter = self.filter.clone();
        let found = tokio::task::spawn_blocking(move || enumerate(&filter)).await??;

        let mut stats = ScanStats {
            discovered: found.len(),
            ..ScanStats::default()
        };

        for path in &found {
            let fresh = self
                .history
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .add(path.clone());
            if !fresh {
                continue;
            }
            tracing::debug!(path = %path.display(), "discovered");
            if candidates.send(path.clone()).await.is_err() {
                break;
            }
            stats.queued += 1;
        }

        let found: HashSet<PathBuf> = found.into_iter().collect();
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        let stale: Vec<PathBuf> = history
            .paths()
            .filter(|p| !found.contains(*p))
            .cloned()
            .collect();
        stats.stale = history.remove_all(&stale);
        for path in &stale {
            tracing::debug!(path = %path.display(), "stale history entry removed");
        }

        Ok(stats)
    }
}

/// Every accepted file under the root. Fails only if the root itself is unreadable.
pub(crate) fn enumerate(filter: &FileFilter) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut found = Vec::new();
    let walker = WalkDir::new(filter.root())
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !filter.is_ignored(entry.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && filter.accepts(entry.path()) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
