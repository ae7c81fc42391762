// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the remote compliance service

use super::{
    ApiError, Asset, CollectionSettings, ComplianceApi, CreateOutcome, Grant, InstalledBenchmark,
    NewAsset, SubmitSummary, User,
};
use crate::auth::TokenProvider;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use sw_core::{FieldSettings, ImportOptions, Review, ScapMapping};

/// Talks JSON to the service's REST API with bearer tokens from `T`
#[derive(Clone)]
pub struct HttpComplianceApi<T> {
    client: reqwest::Client,
    base: String,
    tokens: T,
}

impl<T: TokenProvider> HttpComplianceApi<T> {
    pub fn new(base_url: &str, timeout: Duration, tokens: T) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.tokens.get_token().await?;
        request
            .bearer_auth(token.access_token)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))
    }

    async fn get_json<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ApiError> {
        decode(self.send(request).await?).await
    }

    async fn find_asset(&self, collection_id: &str, name: &str) -> Result<Option<Asset>, ApiError> {
        let request = self.client.get(self.url("assets")).query(&[
            ("collectionId", collection_id),
            ("name", name),
            ("projection", "stigs"),
        ]);
        let assets: Vec<WireAsset> = self.get_json(request).await?;
        Ok(assets.into_iter().next().map(Asset::from))
    }
}

#[async_trait]
impl<T: TokenProvider> ComplianceApi for HttpComplianceApi<T> {
    async fn probe(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .get(self.url("op/definition"))
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        check(response).await.map(|_| ())
    }

    async fn list_assets(&self, collection_id: &str) -> Result<Vec<Asset>, ApiError> {
        let request = self
            .client
            .get(self.url("assets"))
            .query(&[("collectionId", collection_id), ("projection", "stigs")]);
        let assets: Vec<WireAsset> = self.get_json(request).await?;
        Ok(assets.into_iter().map(Asset::from).collect())
    }

    async fn list_installed_benchmarks(&self) -> Result<Vec<InstalledBenchmark>, ApiError> {
        let request = self
            .client
            .get(self.url("stigs"))
            .query(&[("projection", "revisions")]);
        let benchmarks: Vec<WireBenchmark> = self.get_json(request).await?;
        Ok(benchmarks.into_iter().map(InstalledBenchmark::from).collect())
    }

    async fn create_or_get_asset(&self, asset: &NewAsset) -> Result<CreateOutcome, ApiError> {
        let request = self
            .client
            .post(self.url("assets"))
            .query(&[("projection", "stigs")])
            .json(asset);
        match self.get_json::<WireAsset>(request).await {
            Ok(created) => Ok(CreateOutcome::Created(created.into())),
            Err(e) if e.is_duplicate_name() => {
                tracing::debug!(name = %asset.name, "asset name taken, fetching existing record");
                match self.find_asset(&asset.collection_id, &asset.name).await? {
                    Some(existing) => Ok(CreateOutcome::Existing(existing)),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn patch_asset_stigs(
        &self,
        collection_id: &str,
        asset_id: &str,
        benchmark_ids: &[String],
    ) -> Result<Asset, ApiError> {
        let body = serde_json::json!({
            "collectionId": collection_id,
            "stigs": benchmark_ids,
        });
        let request = self
            .client
            .patch(self.url(&format!("assets/{}", asset_id)))
            .query(&[("projection", "stigs")])
            .json(&body);
        let asset: WireAsset = self.get_json(request).await?;
        Ok(asset.into())
    }

    async fn submit_reviews(
        &self,
        collection_id: &str,
        asset_id: &str,
        reviews: &[Review],
    ) -> Result<SubmitSummary, ApiError> {
        let request = self
            .client
            .post(self.url(&format!(
                "collections/{}/reviews/{}",
                collection_id, asset_id
            )))
            .json(reviews);
        let response: WireSubmitResponse = self.get_json(request).await?;
        Ok(response.into())
    }

    async fn get_user(&self) -> Result<User, ApiError> {
        let user: WireUser = self.get_json(self.client.get(self.url("user"))).await?;
        Ok(user.into())
    }

    async fn get_collection(&self, collection_id: &str) -> Result<CollectionSettings, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("collections/{}", collection_id)));
        let collection: WireCollection = self.get_json(request).await?;
        Ok(CollectionSettings {
            name: collection.name,
            fields: collection.settings.fields,
            import_options: collection.settings.import_options,
        })
    }

    async fn get_scap_map(&self) -> Result<Vec<ScapMapping>, ApiError> {
        self.get_json(self.client.get(self.url("stigs/scap-maps")))
            .await
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, ApiError> {
    check(response)
        .await?
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

// Wire shapes, kept private so the rest of the agent sees the flattened types

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireStigRef {
    Id(String),
    Object {
        #[serde(rename = "benchmarkId")]
        benchmark_id: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAsset {
    asset_id: String,
    name: String,
    #[serde(default)]
    stigs: Vec<WireStigRef>,
}

impl From<WireAsset> for Asset {
    fn from(wire: WireAsset) -> Self {
        Asset {
            asset_id: wire.asset_id,
            name: wire.name,
            benchmark_ids: wire
                .stigs
                .into_iter()
                .map(|s| match s {
                    WireStigRef::Id(id) => id,
                    WireStigRef::Object { benchmark_id } => benchmark_id,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRevision {
    revision_str: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBenchmark {
    benchmark_id: String,
    #[serde(default)]
    revisions: Vec<WireRevision>,
    #[serde(default)]
    last_revision_str: Option<String>,
}

impl From<WireBenchmark> for InstalledBenchmark {
    fn from(wire: WireBenchmark) -> Self {
        let mut revision_strs: Vec<String> =
            wire.revisions.into_iter().map(|r| r.revision_str).collect();
        if let Some(last) = wire.last_revision_str {
            if !revision_strs.contains(&last) {
                revision_strs.push(last);
            }
        }
        InstalledBenchmark {
            benchmark_id: wire.benchmark_id,
            revision_strs,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireAffected {
    #[serde(default)]
    inserted: u32,
    #[serde(default)]
    updated: u32,
}

#[derive(Debug, Deserialize)]
struct WireSubmitResponse {
    #[serde(default)]
    rejected: Vec<serde_json::Value>,
    #[serde(default)]
    affected: WireAffected,
}

impl From<WireSubmitResponse> for SubmitSummary {
    fn from(wire: WireSubmitResponse) -> Self {
        SubmitSummary {
            inserted: wire.affected.inserted,
            updated: wire.affected.updated,
            rejected: wire.rejected.len() as u32,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCollectionRef {
    collection_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGrant {
    collection: WireCollectionRef,
    access_level: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    user_id: String,
    username: String,
    #[serde(default)]
    collection_grants: Vec<WireGrant>,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        User {
            user_id: wire.user_id,
            username: wire.username,
            grants: wire
                .collection_grants
                .into_iter()
                .map(|g| Grant {
                    collection_id: g.collection.collection_id,
                    access_level: g.access_level,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSettings {
    fields: FieldSettings,
    import_options: ImportOptions,
}

#[derive(Debug, Deserialize)]
struct WireCollection {
    #[serde(default)]
    name: String,
    #[serde(default)]
    settings: WireSettings,
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
