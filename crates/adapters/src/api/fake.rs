// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory compliance service for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    ApiError, Asset, CollectionSettings, ComplianceApi, CreateOutcome, Grant, InstalledBenchmark,
    NewAsset, SubmitSummary, User,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sw_core::{Review, ScapMapping};

/// Recorded service call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Probe,
    ListAssets,
    ListInstalledBenchmarks,
    CreateAsset {
        name: String,
        benchmark_ids: Vec<String>,
    },
    PatchAsset {
        asset_id: String,
        benchmark_ids: Vec<String>,
    },
    SubmitReviews {
        asset_id: String,
        reviews: Vec<Review>,
    },
    GetUser,
    GetCollection,
    GetScapMap,
}

#[derive(Debug)]
struct FakeState {
    assets: Vec<Asset>,
    installed: Vec<InstalledBenchmark>,
    user: User,
    settings: CollectionSettings,
    scap_map: Vec<ScapMapping>,
    calls: Vec<ApiCall>,
    offline: bool,
    /// Error returned by every authenticated call, e.g. a 403
    auth_error: Option<ApiError>,
    /// Asset names whose review submission fails with a 400
    reject_submit: HashSet<String>,
    /// Asset names that appear only after a create attempt, as if another agent won the race
    racing_creates: HashMap<String, Asset>,
    submit_delay: Duration,
    next_id: u64,
}

/// Fake service with one collection, `"1"`, and an agent user holding a
/// level 3 grant on it
#[derive(Clone)]
pub struct FakeComplianceApi {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeComplianceApi {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                assets: Vec::new(),
                installed: Vec::new(),
                user: User {
                    user_id: "1".to_string(),
                    username: "watcher".to_string(),
                    grants: vec![Grant {
                        collection_id: "1".to_string(),
                        access_level: 3,
                    }],
                },
                settings: CollectionSettings::default(),
                scap_map: Vec::new(),
                calls: Vec::new(),
                offline: false,
                auth_error: None,
                reject_submit: HashSet::new(),
                racing_creates: HashMap::new(),
                submit_delay: Duration::ZERO,
                next_id: 0,
            })),
        }
    }
}

impl FakeComplianceApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install a benchmark with the given revisions
    pub fn install(&self, benchmark_id: &str, revisions: &[&str]) {
        self.state().installed.push(InstalledBenchmark {
            benchmark_id: benchmark_id.to_string(),
            revision_strs: revisions.iter().map(|r| r.to_string()).collect(),
        });
    }

    /// Add an existing asset, returning its id
    pub fn add_asset(&self, name: &str, benchmark_ids: &[&str]) -> String {
        let mut state = self.state();
        state.next_id += 1;
        let asset_id = state.next_id.to_string();
        state.assets.push(Asset {
            asset_id: asset_id.clone(),
            name: name.to_string(),
            benchmark_ids: benchmark_ids.iter().map(|b| b.to_string()).collect(),
        });
        asset_id
    }

    /// Make the next create for `name` collide with an asset created elsewhere
    pub fn race_create(&self, name: &str, benchmark_ids: &[&str]) {
        let mut state = self.state();
        state.next_id += 1;
        let asset = Asset {
            asset_id: state.next_id.to_string(),
            name: name.to_string(),
            benchmark_ids: benchmark_ids.iter().map(|b| b.to_string()).collect(),
        };
        state.racing_creates.insert(name.to_lowercase(), asset);
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.state().assets.clone()
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn set_auth_error(&self, error: Option<ApiError>) {
        self.state().auth_error = error;
    }

    pub fn set_access_level(&self, level: u8) {
        let mut state = self.state();
        for grant in &mut state.user.grants {
            grant.access_level = level;
        }
    }

    pub fn set_settings(&self, settings: CollectionSettings) {
        self.state().settings = settings;
    }

    pub fn set_scap_map(&self, map: Vec<ScapMapping>) {
        self.state().scap_map = map;
    }

    pub fn reject_submit_for(&self, name: &str) {
        self.state().reject_submit.insert(name.to_lowercase());
    }

    /// Hold each review submission for `delay` before answering
    pub fn set_submit_delay(&self, delay: Duration) {
        self.state().submit_delay = delay;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Record a call and apply connectivity faults
    fn enter(&self, call: ApiCall, authenticated: bool) -> Result<(), ApiError> {
        let mut state = self.state();
        state.calls.push(call);
        if state.offline {
            return Err(ApiError::Unreachable("connection refused".to_string()));
        }
        if authenticated {
            if let Some(error) = &state.auth_error {
                return Err(error.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ComplianceApi for FakeComplianceApi {
    async fn probe(&self) -> Result<(), ApiError> {
        self.enter(ApiCall::Probe, false)
    }

    async fn list_assets(&self, _collection_id: &str) -> Result<Vec<Asset>, ApiError> {
        self.enter(ApiCall::ListAssets, true)?;
        Ok(self.assets())
    }

    async fn list_installed_benchmarks(&self) -> Result<Vec<InstalledBenchmark>, ApiError> {
        self.enter(ApiCall::ListInstalledBenchmarks, true)?;
        Ok(self.state().installed.clone())
    }

    async fn create_or_get_asset(&self, asset: &NewAsset) -> Result<CreateOutcome, ApiError> {
        self.enter(
            ApiCall::CreateAsset {
                name: asset.name.clone(),
                benchmark_ids: asset.benchmark_ids.clone(),
            },
            true,
        )?;

        let mut state = self.state();
        let key = asset.name.to_lowercase();
        if let Some(raced) = state.racing_creates.remove(&key) {
            state.assets.push(raced.clone());
            return Ok(CreateOutcome::Existing(raced));
        }
        if let Some(existing) = state.assets.iter().find(|a| a.name.to_lowercase() == key) {
            return Ok(CreateOutcome::Existing(existing.clone()));
        }

        state.next_id += 1;
        let created = Asset {
            asset_id: state.next_id.to_string(),
            name: asset.name.clone(),
            benchmark_ids: asset.benchmark_ids.clone(),
        };
        state.assets.push(created.clone());
        Ok(CreateOutcome::Created(created))
    }

    async fn patch_asset_stigs(
        &self,
        _collection_id: &str,
        asset_id: &str,
        benchmark_ids: &[String],
    ) -> Result<Asset, ApiError> {
        self.enter(
            ApiCall::PatchAsset {
                asset_id: asset_id.to_string(),
                benchmark_ids: benchmark_ids.to_vec(),
            },
            true,
        )?;

        let mut state = self.state();
        match state.assets.iter_mut().find(|a| a.asset_id == asset_id) {
            Some(asset) => {
                asset.benchmark_ids = benchmark_ids.to_vec();
                Ok(asset.clone())
            }
            None => Err(ApiError::Status {
                status: 404,
                body: format!("no asset {}", asset_id),
            }),
        }
    }

    async fn submit_reviews(
        &self,
        _collection_id: &str,
        asset_id: &str,
        reviews: &[Review],
    ) -> Result<SubmitSummary, ApiError> {
        self.enter(
            ApiCall::SubmitReviews {
                asset_id: asset_id.to_string(),
                reviews: reviews.to_vec(),
            },
            true,
        )?;

        let delay = self.state().submit_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        let name = state
            .assets
            .iter()
            .find(|a| a.asset_id == asset_id)
            .map(|a| a.name.to_lowercase());
        if name.is_some_and(|n| state.reject_submit.contains(&n)) {
            return Err(ApiError::Status {
                status: 400,
                body: "review validation failed".to_string(),
            });
        }

        Ok(SubmitSummary {
            inserted: reviews.len() as u32,
            updated: 0,
            rejected: 0,
        })
    }

    async fn get_user(&self) -> Result<User, ApiError> {
        self.enter(ApiCall::GetUser, true)?;
        Ok(self.state().user.clone())
    }

    async fn get_collection(&self, _collection_id: &str) -> Result<CollectionSettings, ApiError> {
        self.enter(ApiCall::GetCollection, true)?;
        Ok(self.state().settings.clone())
    }

    async fn get_scap_map(&self) -> Result<Vec<ScapMapping>, ApiError> {
        self.enter(ApiCall::GetScapMap, true)?;
        Ok(self.state().scap_map.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
