// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide connectivity alarm
//!
//! Four independent fault conditions with edge-triggered events. Setting a
//! condition to its current value is a no-op. Events are published while the
//! state lock is held, so every subscriber observes the same order.
//!
//! The alarm also drives a pause signal: the pipeline is paused while any
//! condition is raised.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

/// Sender for alarm event delivery
pub type AlarmSender = mpsc::UnboundedSender<AlarmEvent>;
/// Receiver for alarm event delivery
pub type AlarmReceiver = mpsc::UnboundedReceiver<AlarmEvent>;

/// A named fault condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlarmKind {
    /// Remote service unreachable
    ApiOffline,
    /// Credential authority unreachable
    AuthOffline,
    /// Credential authority rejected the client
    NoToken,
    /// No grant on the configured collection
    NoGrant,
}

impl AlarmKind {
    pub const ALL: [AlarmKind; 4] = [
        AlarmKind::ApiOffline,
        AlarmKind::AuthOffline,
        AlarmKind::NoToken,
        AlarmKind::NoGrant,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AlarmKind::ApiOffline => "apiOffline",
            AlarmKind::AuthOffline => "authOffline",
            AlarmKind::NoToken => "noToken",
            AlarmKind::NoGrant => "noGrant",
        }
    }

    /// Transient connectivity faults, as opposed to operator configuration faults
    pub fn is_connectivity(&self) -> bool {
        matches!(self, AlarmKind::ApiOffline | AlarmKind::AuthOffline)
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Edge event emitted on a condition change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEvent {
    Raised(AlarmKind),
    Lowered(AlarmKind),
}

impl AlarmEvent {
    pub fn kind(&self) -> AlarmKind {
        match self {
            AlarmEvent::Raised(kind) | AlarmEvent::Lowered(kind) => *kind,
        }
    }
}

/// Snapshot of all four conditions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmState {
    pub api_offline: bool,
    pub auth_offline: bool,
    pub no_token: bool,
    pub no_grant: bool,
}

impl AlarmState {
    pub fn get(&self, kind: AlarmKind) -> bool {
        match kind {
            AlarmKind::ApiOffline => self.api_offline,
            AlarmKind::AuthOffline => self.auth_offline,
            AlarmKind::NoToken => self.no_token,
            AlarmKind::NoGrant => self.no_grant,
        }
    }

    fn slot(&mut self, kind: AlarmKind) -> &mut bool {
        match kind {
            AlarmKind::ApiOffline => &mut self.api_offline,
            AlarmKind::AuthOffline => &mut self.auth_offline,
            AlarmKind::NoToken => &mut self.no_token,
            AlarmKind::NoGrant => &mut self.no_grant,
        }
    }

    /// True if any condition is raised
    pub fn any(&self) -> bool {
        self.api_offline || self.auth_offline || self.no_token || self.no_grant
    }

    pub fn raised(&self) -> Vec<AlarmKind> {
        AlarmKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind))
            .collect()
    }
}

struct Inner {
    state: Mutex<AlarmState>,
    subscribers: Mutex<Vec<AlarmSender>>,
    paused: watch::Sender<bool>,
}

/// Shared alarm handle; clones refer to the same conditions
#[derive(Clone)]
pub struct Alarm {
    inner: Arc<Inner>,
}

impl Alarm {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(AlarmState::default()),
                subscribers: Mutex::new(Vec::new()),
                paused,
            }),
        }
    }

    /// Subscribe to raised/lowered events from now on
    pub fn subscribe(&self) -> AlarmReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Raise a condition. Returns true if this call changed the state.
    pub fn raise(&self, kind: AlarmKind) -> bool {
        self.set(kind, true)
    }

    /// Lower a condition. Returns true if this call changed the state.
    pub fn lower(&self, kind: AlarmKind) -> bool {
        self.set(kind, false)
    }

    pub fn set(&self, kind: AlarmKind, value: bool) -> bool {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        let slot = state.slot(kind);
        if *slot == value {
            return false;
        }
        *slot = value;

        let event = if value {
            AlarmEvent::Raised(kind)
        } else {
            AlarmEvent::Lowered(kind)
        };

        // Publish under the state lock so subscribers never see reordered edges
        let mut subs = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        subs.retain(|tx| tx.send(event).is_ok());
        drop(subs);

        self.inner.paused.send_replace(state.any());
        true
    }

    pub fn state(&self) -> AlarmState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_raised(&self, kind: AlarmKind) -> bool {
        self.state().get(kind)
    }

    /// Watch channel that is `true` while any condition is raised
    pub fn pause_signal(&self) -> watch::Receiver<bool> {
        self.inner.paused.subscribe()
    }

    /// Wait until no condition is raised
    pub async fn wait_clear(&self) {
        let mut rx = self.pause_signal();
        // The sender lives as long as `self`, so this cannot observe a closed channel
        let _ = rx.wait_for(|paused| !*paused).await;
    }
}

impl Default for Alarm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alarm").field("state", &self.state()).finish()
    }
}

#[cfg(test)]
#[path = "alarm_tests.rs"]
mod tests;
