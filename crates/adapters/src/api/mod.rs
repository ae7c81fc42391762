// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote compliance service adapters

mod http;

pub use http::HttpComplianceApi;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ApiCall, FakeComplianceApi};

use crate::auth::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sw_core::{AlarmKind, FieldSettings, ImportOptions, Review, ScapMapping};
use thiserror::Error;

/// Errors from remote service calls
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Connection-level failure or timeout
    #[error("remote service unreachable: {0}")]
    Unreachable(String),
    #[error("remote service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Fault condition this error raises, or `None` for a per-task data fault
    pub fn alarm(&self) -> Option<AlarmKind> {
        match self {
            ApiError::Unreachable(_) => Some(AlarmKind::ApiOffline),
            ApiError::Status { status, .. } if *status >= 500 => Some(AlarmKind::ApiOffline),
            ApiError::Status { status: 401, .. } => Some(AlarmKind::NoToken),
            ApiError::Status { status: 403, .. } => Some(AlarmKind::NoGrant),
            ApiError::Status { .. } | ApiError::Decode(_) => None,
            ApiError::Auth(e) => Some(e.alarm()),
        }
    }

    /// The service's answer to creating an asset whose name is taken
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, ApiError::Status { status: 422, .. })
    }
}

/// A remote asset with its benchmark assignments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub asset_id: String,
    pub name: String,
    #[serde(default)]
    pub benchmark_ids: Vec<String>,
}

/// A benchmark installed on the service with its known revisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledBenchmark {
    pub benchmark_id: String,
    #[serde(default)]
    pub revision_strs: Vec<String>,
}

/// Properties for a new asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub name: String,
    pub collection_id: String,
    pub fqdn: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub noncomputing: bool,
    pub metadata: BTreeMap<String, String>,
    #[serde(rename = "stigs")]
    pub benchmark_ids: Vec<String>,
}

/// Result of an idempotent create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Asset),
    /// The name was already taken; this is the current record
    Existing(Asset),
}

/// Counts reported by the service for one review submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitSummary {
    pub inserted: u32,
    pub updated: u32,
    pub rejected: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub collection_id: String,
    pub access_level: u8,
}

/// The identity behind the agent's token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl User {
    pub fn access_level(&self, collection_id: &str) -> Option<u8> {
        self.grants
            .iter()
            .find(|g| g.collection_id == collection_id)
            .map(|g| g.access_level)
    }
}

/// Collection settings that shape imported reviews
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionSettings {
    pub name: String,
    pub fields: FieldSettings,
    pub import_options: ImportOptions,
}

/// Operations the pipeline needs from the remote compliance service
#[async_trait]
pub trait ComplianceApi: Clone + Send + Sync + 'static {
    /// Lightweight unauthenticated reachability check
    async fn probe(&self) -> Result<(), ApiError>;

    async fn list_assets(&self, collection_id: &str) -> Result<Vec<Asset>, ApiError>;

    async fn list_installed_benchmarks(&self) -> Result<Vec<InstalledBenchmark>, ApiError>;

    /// Create an asset, or return the existing record if the name is taken
    async fn create_or_get_asset(&self, asset: &NewAsset) -> Result<CreateOutcome, ApiError>;

    /// Replace the asset's benchmark assignments
    async fn patch_asset_stigs(
        &self,
        collection_id: &str,
        asset_id: &str,
        benchmark_ids: &[String],
    ) -> Result<Asset, ApiError>;

    async fn submit_reviews(
        &self,
        collection_id: &str,
        asset_id: &str,
        reviews: &[Review],
    ) -> Result<SubmitSummary, ApiError>;

    async fn get_user(&self) -> Result<User, ApiError>;

    async fn get_collection(&self, collection_id: &str) -> Result<CollectionSettings, ApiError>;

    /// SCAP benchmark id remapping table
    async fn get_scap_map(&self) -> Result<Vec<ScapMapping>, ApiError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
