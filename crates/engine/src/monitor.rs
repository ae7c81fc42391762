// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitors
//!
//! One task per fault condition drives a `LinkMonitor` from alarm edges and
//! probe outcomes, performing the effects it returns.

use std::time::Duration;
use sw_adapters::{ComplianceApi, TokenProvider};
use sw_core::{
    Alarm, AlarmEvent, AlarmKind, AlarmReceiver, ConfigFaultPolicy, ExitReason, LinkEffect,
    LinkEvent, LinkMonitor, PipelineConfig,
};
use tokio::sync::mpsc;

/// Lowest grant level that may write reviews
pub const MIN_ACCESS_LEVEL: u8 = 2;

/// One monitor per condition, with retry settings from the configuration
pub fn monitors(config: &PipelineConfig) -> Vec<LinkMonitor> {
    let terminal = config.config_fault_policy == ConfigFaultPolicy::Terminal;
    vec![
        LinkMonitor::new(AlarmKind::ApiOffline, &config.api_retry, false),
        LinkMonitor::new(AlarmKind::AuthOffline, &config.auth_retry, false),
        LinkMonitor::new(AlarmKind::NoToken, &config.auth_retry, terminal),
        LinkMonitor::new(AlarmKind::NoGrant, &config.api_retry, terminal),
    ]
}

/// Lightweight checks that decide whether a condition has cleared
#[derive(Clone)]
pub struct Prober<A, T> {
    api: A,
    tokens: T,
    alarm: Alarm,
    collection_id: String,
}

impl<A: ComplianceApi, T: TokenProvider> Prober<A, T> {
    pub fn new(api: A, tokens: T, alarm: Alarm, collection_id: impl Into<String>) -> Self {
        Self {
            api,
            tokens,
            alarm,
            collection_id: collection_id.into(),
        }
    }

    /// True if `kind` no longer holds
    pub async fn probe(&self, kind: AlarmKind) -> bool {
        let outcome = match kind {
            AlarmKind::ApiOffline => self.api.probe().await.map_err(|e| e.to_string()),
            AlarmKind::AuthOffline => match self.tokens.refresh().await {
                Ok(_) => Ok(()),
                // Reachable but refusing: a different condition
                Err(e) if e.alarm() != AlarmKind::AuthOffline => {
                    self.alarm.raise(e.alarm());
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            },
            AlarmKind::NoToken => self
                .tokens
                .refresh()
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            AlarmKind::NoGrant => match self.api.get_user().await {
                Ok(user) => match user.access_level(&self.collection_id) {
                    Some(level) if level >= MIN_ACCESS_LEVEL => Ok(()),
                    level => Err(format!("access level {:?}", level)),
                },
                Err(e) => Err(e.to_string()),
            },
        };
        match outcome {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(alarm = %kind, reason, "probe failed");
                false
            }
        }
    }
}

async fn next_edge(events: &mut AlarmReceiver, kind: AlarmKind) -> Option<LinkEvent> {
    while let Some(event) = events.recv().await {
        match event {
            AlarmEvent::Raised(k) if k == kind => return Some(LinkEvent::Raised),
            AlarmEvent::Lowered(k) if k == kind => return Some(LinkEvent::Lowered),
            _ => {}
        }
    }
    None
}

/// Drive one monitor until it exits the process or the alarm goes away
pub async fn run_monitor<A, T>(
    mut monitor: LinkMonitor,
    alarm: Alarm,
    prober: Prober<A, T>,
    exit: mpsc::UnboundedSender<ExitReason>,
) where
    A: ComplianceApi,
    T: TokenProvider,
{
    let kind = monitor.kind;
    let mut events = alarm.subscribe();
    let mut probe_after: Option<Duration> = None;

    // Subscribed first, so a raise before this point is seen here and not twice
    let mut next = alarm.is_raised(kind).then_some(LinkEvent::Raised);

    loop {
        let event = match next.take() {
            Some(event) => event,
            None => match probe_after.take() {
                Some(delay) => tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        let attempt = monitor.attempts() + 1;
                        if prober.probe(kind).await {
                            tracing::info!(alarm = %kind, attempt, "probe succeeded");
                            LinkEvent::ProbeSucceeded
                        } else {
                            tracing::warn!(alarm = %kind, attempt, bound = monitor.bound, "probe failed");
                            LinkEvent::ProbeFailed
                        }
                    }
                    edge = next_edge(&mut events, kind) => match edge {
                        Some(edge) => edge,
                        None => break,
                    },
                },
                None => match next_edge(&mut events, kind).await {
                    Some(edge) => edge,
                    None => break,
                },
            },
        };

        let (updated, effects) = monitor.transition(event);
        tracing::trace!(alarm = %kind, from = %monitor.state, to = %updated.state, ?event, "link transition");
        monitor = updated;

        for effect in effects {
            match effect {
                LinkEffect::ScheduleProbe(delay) => probe_after = Some(delay),
                LinkEffect::Lower(kind) => {
                    alarm.lower(kind);
                }
                LinkEffect::Exit(reason) => {
                    tracing::error!(alarm = %kind, code = reason.code(), "{}", reason);
                    let _ = exit.send(reason);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
