// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry state machine for one fault condition
//!
//! `Healthy --raised--> Offline --probe fails--> Offline(n+1) --bound--> Exhausted`
//! and `Offline --probe succeeds--> Healthy` (alarm lowered, counter reset).
//!
//! Transitions are pure and return the effects the caller must perform.

use crate::alarm::AlarmKind;
use crate::config::RetryConfig;
use crate::exit::ExitReason;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Healthy,
    /// Alarm raised; `attempts` failed probes so far
    Offline { attempts: u32 },
    /// Retry budget spent; terminal
    Exhausted,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Healthy => write!(f, "healthy"),
            LinkState::Offline { attempts } => write!(f, "offline:{}", attempts),
            LinkState::Exhausted => write!(f, "exhausted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The alarm for this condition was raised
    Raised,
    /// The alarm was lowered by someone else
    Lowered,
    ProbeFailed,
    ProbeSucceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEffect {
    /// Run a probe after the delay
    ScheduleProbe(Duration),
    /// Lower the alarm
    Lower(AlarmKind),
    /// Terminate the process
    Exit(ExitReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMonitor {
    pub kind: AlarmKind,
    pub delay: Duration,
    /// Probe budget; zero retries forever
    pub bound: u32,
    /// Exit as soon as the alarm is raised
    pub terminal: bool,
    pub state: LinkState,
}

impl LinkMonitor {
    pub fn new(kind: AlarmKind, retry: &RetryConfig, terminal: bool) -> Self {
        Self {
            kind,
            delay: retry.delay,
            bound: retry.bound,
            terminal,
            state: LinkState::Healthy,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self.state {
            LinkState::Offline { attempts } => attempts,
            _ => 0,
        }
    }

    /// Pure state transition returning new state and effects
    pub fn transition(&self, event: LinkEvent) -> (Self, Vec<LinkEffect>) {
        match (self.state, event) {
            (LinkState::Healthy, LinkEvent::Raised) if self.terminal => (
                self.with_state(LinkState::Exhausted),
                vec![LinkEffect::Exit(ExitReason::Fault(self.kind))],
            ),
            (LinkState::Healthy, LinkEvent::Raised) => (
                self.with_state(LinkState::Offline { attempts: 0 }),
                vec![LinkEffect::ScheduleProbe(self.delay)],
            ),

            (LinkState::Offline { attempts }, LinkEvent::ProbeFailed) => {
                let attempts = attempts + 1;
                if self.bound > 0 && attempts >= self.bound {
                    (
                        self.with_state(LinkState::Exhausted),
                        vec![LinkEffect::Exit(ExitReason::Fault(self.kind))],
                    )
                } else {
                    (
                        self.with_state(LinkState::Offline { attempts }),
                        vec![LinkEffect::ScheduleProbe(self.delay)],
                    )
                }
            }

            (LinkState::Offline { .. }, LinkEvent::ProbeSucceeded) => (
                self.with_state(LinkState::Healthy),
                vec![LinkEffect::Lower(self.kind)],
            ),

            (LinkState::Offline { .. }, LinkEvent::Lowered) => {
                (self.with_state(LinkState::Healthy), vec![])
            }

            // Invalid transitions are no-ops
            _ => (self.clone(), vec![]),
        }
    }

    fn with_state(&self, state: LinkState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
