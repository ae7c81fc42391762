// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stigwatch ingestion engine: discovery, parsing, batch delivery and
//! connectivity monitoring

mod cargo;
mod delivery;
mod error;
mod filter;
mod monitor;
mod parse;
mod pipeline;
mod preflight;
mod scan;
mod watch;

use std::sync::{Arc, Mutex};
use sw_storage::History;

/// History shared by discovery, the parse stage and delivery
pub type SharedHistory = Arc<Mutex<History>>;

pub use cargo::{CargoQueue, CargoState};
pub use delivery::{BatchFailure, BatchReport, Delivery, DeliveryTotals};
pub use error::EngineError;
pub use filter::FileFilter;
pub use monitor::{monitors, run_monitor, Prober, MIN_ACCESS_LEVEL};
pub use parse::ParseStage;
pub use pipeline::{Pipeline, PipelineDeps};
pub use preflight::Preflight;
pub use scan::{ScanDiscovery, ScanStats};
pub use watch::{EventDiscovery, StabilityTracker};
