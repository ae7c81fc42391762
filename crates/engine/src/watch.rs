// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live discovery from filesystem notifications
//!
//! Every accepted add/change event is forwarded; History is not consulted.
//! While the alarm is raised the watch stays active but forwarding stops, so
//! notifications collect in the ready queue instead of flooding a dead link.

use crate::error::EngineError;
use crate::filter::FileFilter;
use crate::scan::enumerate;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use sw_core::{Alarm, Clock, SystemClock};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Holds paths back until their size has stopped changing for `threshold`
#[derive(Debug)]
pub struct StabilityTracker<C> {
    clock: C,
    threshold: Duration,
    pending: BTreeMap<PathBuf, (Option<u64>, Instant)>,
}

impl<C: Clock> StabilityTracker<C> {
    pub fn new(clock: C, threshold: Duration) -> Self {
        Self {
            clock,
            threshold,
            pending: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Note a change to `path`, restarting its quiet period
    pub fn observe(&mut self, path: PathBuf) {
        let now = self.clock.now();
        self.pending.insert(path, (None, now));
    }

    /// Re-measure every pending path and return those that have settled.
    /// Paths that vanished are dropped.
    pub fn poll(&mut self, size_of: impl Fn(&Path) -> Option<u64>) -> Vec<PathBuf> {
        let now = self.clock.now();
        let mut settled = Vec::new();
        self.pending.retain(|path, (last, since)| {
            let Some(size) = size_of(path) else {
                return false;
            };
            if *last != Some(size) {
                *last = Some(size);
                *since = now;
                return true;
            }
            if now.saturating_duration_since(*since) >= self.threshold {
                settled.push(path.clone());
                return false;
            }
            true
        });
        settled
    }
}

/// Candidate files named by a notification
pub(crate) fn candidate_paths(filter: &FileFilter, event: &Event) -> Vec<PathBuf> {
    let relevant = match &event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    if !relevant {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|p| filter.accepts(p))
        .cloned()
        .collect()
}

pub struct EventDiscovery {
    filter: FileFilter,
    alarm: Alarm,
    add_existing: bool,
    use_polling: bool,
    poll_interval: Duration,
    stability: Duration,
}

impl EventDiscovery {
    pub fn new(
        filter: FileFilter,
        alarm: Alarm,
        add_existing: bool,
        use_polling: bool,
        poll_interval: Duration,
        stability: Duration,
    ) -> Self {
        Self {
            filter,
            alarm,
            add_existing,
            use_polling,
            poll_interval,
            stability,
        }
    }

    fn start_watcher(
        &self,
        raw: mpsc::UnboundedSender<notify::Result<Event>>,
    ) -> Result<Box<dyn Watcher + Send>, EngineError> {
        let handler = move |res: notify::Result<Event>| {
            // The receiver is gone only when discovery has stopped
            let _ = raw.send(res);
        };
        let mut watcher: Box<dyn Watcher + Send> = if self.use_polling {
            Box::new(PollWatcher::new(
                handler,
                Config::default().with_poll_interval(self.poll_interval),
            )?)
        } else {
            Box::new(RecommendedWatcher::new(handler, Config::default())?)
        };
        watcher.watch(self.filter.root(), RecursiveMode::Recursive)?;
        tracing::info!(
            root = %self.filter.root().display(),
            polling = self.use_polling,
            "watching"
        );
        Ok(watcher)
    }

    /// Forward notifications until the parse stage goes away.
    /// Fails only if the watch cannot be established.
    pub async fn run(self, candidates: mpsc::Sender<PathBuf>) -> Result<(), EngineError> {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
        let _watcher = self.start_watcher(raw_tx)?;

        let mut ready = ReadyQueue::default();
        if self.add_existing {
            let filter = self.filter.clone();
            let existing = tokio::task::spawn_blocking(move || enumerate(&filter)).await??;
            tracing::info!(count = existing.len(), "queued existing files");
            for path in existing {
                ready.push(path);
            }
        }

        let mut tracker = StabilityTracker::new(SystemClock, self.stability);
        let mut settle = tokio::time::interval((self.stability / 4).max(Duration::from_millis(50)));
        settle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut paused_rx = self.alarm.pause_signal();

        loop {
            let paused = *paused_rx.borrow_and_update();
            tokio::select! {
                raw = raw_rx.recv() => match raw {
                    Some(Ok(event)) => {
                        for path in candidate_paths(&self.filter, &event) {
                            if self.stability.is_zero() {
                                if path.is_file() {
                                    ready.push(path);
                                }
                            } else {
                                tracker.observe(path);
                            }
                        }
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "watch error"),
                    None => break,
                },
                _ = settle.tick(), if !tracker.is_empty() => {
                    for path in tracker.poll(file_size) {
                        ready.push(path);
                    }
                }
                changed = paused_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                permit = candidates.reserve(), if !paused && !ready.is_empty() => {
                    let Ok(permit) = permit else {
                        break;
                    };
                    if let Some(path) = ready.pop() {
                        tracing::debug!(path = %path.display(), "discovered");
                        permit.send(path);
                    }
                }
                _ = candidates.closed() => break,
            }
        }
        tracing::debug!(backlog = ready.len(), "event discovery stopped");
        Ok(())
    }
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// FIFO of paths awaiting forwarding; a path is held at most once
#[derive(Debug, Default)]
struct ReadyQueue {
    order: VecDeque<PathBuf>,
    members: HashSet<PathBuf>,
}

impl ReadyQueue {
    fn push(&mut self, path: PathBuf) {
        if self.members.insert(path.clone()) {
            self.order.push_back(path);
        }
    }

    fn pop(&mut self) -> Option<PathBuf> {
        let path = self.order.pop_front()?;
        self.members.remove(&path);
        Some(path)
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
