// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the agent's external collaborators

pub mod api;
pub mod auth;
pub mod parser;
pub mod traced;

pub use api::{
    ApiError, Asset, CollectionSettings, ComplianceApi, CreateOutcome, Grant, HttpComplianceApi,
    InstalledBenchmark, NewAsset, SubmitSummary, User,
};
pub use auth::{AuthError, CachedTokenProvider, OidcTokenProvider, Token, TokenProvider};
pub use parser::{ChecklistParser, CklbParser, FormatHint, ParseError};
pub use traced::{TracedComplianceApi, TracedTokenProvider};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use api::{ApiCall, FakeComplianceApi};
#[cfg(any(test, feature = "test-support"))]
pub use auth::FakeTokenProvider;
#[cfg(any(test, feature = "test-support"))]
pub use parser::FakeParser;
