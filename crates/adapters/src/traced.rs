// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::api::{
    ApiError, Asset, CollectionSettings, ComplianceApi, CreateOutcome, InstalledBenchmark,
    NewAsset, SubmitSummary, User,
};
use crate::auth::{AuthError, Token, TokenProvider};
use async_trait::async_trait;
use std::future::Future;
use std::time::Instant;
use sw_core::{Review, ScapMapping};
use tracing::Instrument;

/// Run `call`, logging elapsed time and outcome inside the current span
async fn timed<T, E, F>(call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let result = call.await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => tracing::debug!(elapsed_ms, "ok"),
        Err(e) => tracing::warn!(elapsed_ms, error = %e, "failed"),
    }
    result
}

/// Wrapper that adds tracing to any ComplianceApi
#[derive(Clone)]
pub struct TracedComplianceApi<A> {
    inner: A,
}

impl<A> TracedComplianceApi<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: ComplianceApi> ComplianceApi for TracedComplianceApi<A> {
    async fn probe(&self) -> Result<(), ApiError> {
        // Probes repeat on a timer during outages; keep them quiet
        let result = self.inner.probe().await;
        tracing::trace!(ok = result.is_ok(), "api.probe");
        result
    }

    async fn list_assets(&self, collection_id: &str) -> Result<Vec<Asset>, ApiError> {
        let span = tracing::info_span!("api.list_assets", collection_id);
        let result = timed(self.inner.list_assets(collection_id))
            .instrument(span.clone())
            .await;
        span.in_scope(|| {
            tracing::trace!(count = result.as_ref().map(|v| v.len()).ok(), "listed assets")
        });
        result
    }

    async fn list_installed_benchmarks(&self) -> Result<Vec<InstalledBenchmark>, ApiError> {
        timed(self.inner.list_installed_benchmarks())
            .instrument(tracing::info_span!("api.list_installed_benchmarks"))
            .await
    }

    async fn create_or_get_asset(&self, asset: &NewAsset) -> Result<CreateOutcome, ApiError> {
        let span = tracing::info_span!(
            "api.create_or_get_asset",
            asset = %asset.name,
            stigs = asset.benchmark_ids.len()
        );
        let result = timed(self.inner.create_or_get_asset(asset))
            .instrument(span.clone())
            .await;
        if let Ok(outcome) = &result {
            span.in_scope(|| match outcome {
                CreateOutcome::Created(a) => tracing::info!(asset_id = %a.asset_id, "asset created"),
                CreateOutcome::Existing(a) => {
                    tracing::info!(asset_id = %a.asset_id, "asset already existed")
                }
            });
        }
        result
    }

    async fn patch_asset_stigs(
        &self,
        collection_id: &str,
        asset_id: &str,
        benchmark_ids: &[String],
    ) -> Result<Asset, ApiError> {
        let span = tracing::info_span!(
            "api.patch_asset_stigs",
            asset_id,
            stigs = benchmark_ids.len()
        );
        timed(
            self.inner
                .patch_asset_stigs(collection_id, asset_id, benchmark_ids),
        )
        .instrument(span)
        .await
    }

    async fn submit_reviews(
        &self,
        collection_id: &str,
        asset_id: &str,
        reviews: &[Review],
    ) -> Result<SubmitSummary, ApiError> {
        let span = tracing::info_span!("api.submit_reviews", asset_id, reviews = reviews.len());
        let result = timed(self.inner.submit_reviews(collection_id, asset_id, reviews))
            .instrument(span.clone())
            .await;
        if let Ok(summary) = &result {
            span.in_scope(|| {
                tracing::info!(
                    inserted = summary.inserted,
                    updated = summary.updated,
                    rejected = summary.rejected,
                    "reviews submitted"
                )
            });
        }
        result
    }

    async fn get_user(&self) -> Result<User, ApiError> {
        timed(self.inner.get_user())
            .instrument(tracing::info_span!("api.get_user"))
            .await
    }

    async fn get_collection(&self, collection_id: &str) -> Result<CollectionSettings, ApiError> {
        timed(self.inner.get_collection(collection_id))
            .instrument(tracing::info_span!("api.get_collection", collection_id))
            .await
    }

    async fn get_scap_map(&self) -> Result<Vec<ScapMapping>, ApiError> {
        timed(self.inner.get_scap_map())
            .instrument(tracing::info_span!("api.get_scap_map"))
            .await
    }
}

/// Wrapper that adds tracing to any TokenProvider
#[derive(Clone)]
pub struct TracedTokenProvider<T> {
    inner: T,
}

impl<T> TracedTokenProvider<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TokenProvider> TokenProvider for TracedTokenProvider<T> {
    async fn get_token(&self) -> Result<Token, AuthError> {
        let result = self.inner.get_token().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "auth.get_token failed");
        }
        result
    }

    async fn refresh(&self) -> Result<Token, AuthError> {
        let span = tracing::info_span!("auth.refresh");
        let result = timed(self.inner.refresh()).instrument(span.clone()).await;
        if let Ok(token) = &result {
            span.in_scope(|| {
                tracing::debug!(expires_in_s = token.expires_in.as_secs(), "token issued")
            });
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
