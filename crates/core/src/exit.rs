// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit policy

use crate::alarm::AlarmKind;
use std::fmt;

/// Why the agent stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    /// One-shot drain completed or an interrupt was handled
    Success,
    /// Bad configuration or unusable environment before the pipeline started
    InitFailure,
    /// A fault condition exhausted its retry budget (or is terminal by policy)
    Fault(AlarmKind),
}

impl ExitReason {
    pub fn code(&self) -> i32 {
        match self {
            ExitReason::Success => 0,
            ExitReason::InitFailure => 1,
            ExitReason::Fault(AlarmKind::ApiOffline) => 2,
            ExitReason::Fault(AlarmKind::AuthOffline) => 3,
            ExitReason::Fault(AlarmKind::NoToken) => 4,
            ExitReason::Fault(AlarmKind::NoGrant) => 5,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Success => write!(f, "success"),
            ExitReason::InitFailure => write!(f, "initialization failure"),
            ExitReason::Fault(kind) => write!(f, "{} retry budget exhausted", kind),
        }
    }
}
