// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-core: Core library for the stigwatch agent
//!
//! This crate provides:
//! - The normalized result model produced by checklist decoders
//! - The process-wide connectivity `Alarm` with edge-triggered events
//! - Pure retry state machines and exit-code policy
//! - Pipeline configuration types shared by the engine and the daemon

pub mod alarm;
pub mod clock;
pub mod config;
pub mod exit;
pub mod import;
pub mod model;
pub mod retry;

// Re-exports
pub use alarm::{Alarm, AlarmEvent, AlarmKind, AlarmReceiver, AlarmState};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    ConfigError, ConfigFaultPolicy, DeliveryConfig, DiscoveryConfig, DiscoveryMode, HistoryConfig,
    PipelineConfig, RetryConfig,
};
pub use exit::ExitReason;
pub use import::{
    AutoStatus, EmptyText, FieldRule, FieldSetting, FieldSettings, ImportConfig, ImportOptions,
    ScapMapping, Unreviewed, UnreviewedCommented,
};
pub use model::{
    Checklist, ChecklistStats, ParsedResult, Review, ReviewResult, ReviewStatus, Target,
};
pub use retry::{LinkEffect, LinkEvent, LinkMonitor, LinkState};
