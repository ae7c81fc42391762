// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery queue between the parse stage and the single batch consumer
//!
//! Depth is published on a watch channel so producers can wait for room
//! under the high-water mark and the consumer can wait for a full batch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sw_core::ParsedResult;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CargoState {
    pub depth: usize,
    /// No more results will be pushed
    pub closed: bool,
}

struct Inner {
    items: Mutex<VecDeque<ParsedResult>>,
    state: watch::Sender<CargoState>,
    high_water: usize,
    max_depth: AtomicUsize,
}

#[derive(Clone)]
pub struct CargoQueue {
    inner: Arc<Inner>,
}

impl CargoQueue {
    pub fn new(high_water: usize) -> Self {
        let (state, _) = watch::channel(CargoState::default());
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(VecDeque::new()),
                state,
                high_water: high_water.max(1),
                max_depth: AtomicUsize::new(0),
            }),
        }
    }

    fn items(&self) -> std::sync::MutexGuard<'_, VecDeque<ParsedResult>> {
        self.inner.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, depth: usize) {
        self.inner.state.send_modify(|s| s.depth = depth);
        self.inner.max_depth.fetch_max(depth, Ordering::SeqCst);
    }

    pub fn push(&self, result: ParsedResult) {
        let mut items = self.items();
        items.push_back(result);
        self.publish(items.len());
    }

    /// Put results from a failed batch back at the head, preserving their order
    pub fn restore_front(&self, results: Vec<ParsedResult>) {
        if results.is_empty() {
            return;
        }
        let mut items = self.items();
        for result in results.into_iter().rev() {
            items.push_front(result);
        }
        self.publish(items.len());
    }

    /// Mark the end of input; the consumer drains what remains and stops
    pub fn close(&self) {
        self.inner.state.send_modify(|s| s.closed = true);
    }

    pub fn depth(&self) -> usize {
        self.items().len()
    }

    /// Largest depth observed since creation
    pub fn max_depth(&self) -> usize {
        self.inner.max_depth.load(Ordering::SeqCst)
    }

    pub fn high_water(&self) -> usize {
        self.inner.high_water
    }

    /// Wait until depth is below the high-water mark
    pub async fn wait_for_room(&self) {
        let high_water = self.inner.high_water;
        let mut rx = self.inner.state.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = rx.wait_for(|s| s.depth < high_water).await;
    }

    /// Take the next batch of up to `size` results.
    ///
    /// Returns as soon as `size` results are queued. With a `delay`, a partial
    /// batch is released once the delay has passed since the consumer started
    /// waiting on a non-empty queue. Without one, a partial batch is released
    /// only after `close`. Returns `None` when closed and empty.
    pub async fn next_batch(&self, size: usize, delay: Option<Duration>) -> Option<Vec<ParsedResult>> {
        let size = size.max(1);
        let mut rx = self.inner.state.subscribe();

        let _ = rx.wait_for(|s| s.depth > 0 || s.closed).await;

        let full = |s: &CargoState| s.depth >= size || s.closed;
        match delay {
            Some(delay) => {
                let _ = tokio::time::timeout(delay, rx.wait_for(full)).await;
            }
            None => {
                let _ = rx.wait_for(full).await;
            }
        }

        let mut items = self.items();
        if items.is_empty() {
            return None;
        }
        let take = size.min(items.len());
        let batch: Vec<ParsedResult> = items.drain(..take).collect();
        self.publish(items.len());
        Some(batch)
    }
}

#[cfg(test)]
#[path = "cargo_tests.rs"]
mod tests;
