// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::auth::FakeTokenProvider;

#[test]
fn url_joins_without_double_slash() {
    let api = HttpComplianceApi::new(
        "https://stigman.example/api/",
        Duration::from_secs(5),
        FakeTokenProvider::new(),
    )
    .unwrap();
    assert_eq!(api.url("/op/definition"), "https://stigman.example/api/op/definition");
    assert_eq!(api.url("assets"), "https://stigman.example/api/assets");
}

#[test]
fn asset_accepts_both_stig_projections() {
    let wire: Vec<WireAsset> = serde_json::from_str(
        r#"[
            {"assetId": "1", "name": "alpha", "stigs": ["VPN_SRG"]},
            {"assetId": "2", "name": "beta", "stigs": [{"benchmarkId": "Windows_10_STIG", "revisionStr": "V2R1"}]},
            {"assetId": "3", "name": "gamma"}
        ]"#,
    )
    .unwrap();
    let assets: Vec<Asset> = wire.into_iter().map(Asset::from).collect();

    assert_eq!(assets[0].benchmark_ids, vec!["VPN_SRG"]);
    assert_eq!(assets[1].benchmark_ids, vec!["Windows_10_STIG"]);
    assert!(assets[2].benchmark_ids.is_empty());
}

#[test]
fn benchmark_collects_revisions_and_last_revision() {
    let wire: WireBenchmark = serde_json::from_str(
        r#"{"benchmarkId": "VPN_SRG", "lastRevisionStr": "V1R2", "revisions": [{"revisionStr": "V1R1"}]}"#,
    )
    .unwrap();
    let installed = InstalledBenchmark::from(wire);
    assert_eq!(installed.revision_strs, vec!["V1R1", "V1R2"]);
}

#[test]
fn submit_response_counts() {
    let wire: WireSubmitResponse = serde_json::from_str(
        r#"{"rejected": [{"ruleId": "x", "reason": "bad"}], "affected": {"inserted": 4, "updated": 2}}"#,
    )
    .unwrap();
    assert_eq!(
        SubmitSummary::from(wire),
        SubmitSummary {
            inserted: 4,
            updated: 2,
            rejected: 1
        }
    );
}

#[test]
fn user_grants_are_flattened() {
    let wire: WireUser = serde_json::from_str(
        r#"{"userId": "7", "username": "watcher",
            "collectionGrants": [{"collection": {"collectionId": "21", "name": "c"}, "accessLevel": 3}]}"#,
    )
    .unwrap();
    let user = User::from(wire);
    assert_eq!(user.access_level("21"), Some(3));
}

#[tokio::test]
async fn probe_against_closed_port_is_unreachable() {
    let api = HttpComplianceApi::new(
        "http://127.0.0.1:1/api",
        Duration::from_secs(2),
        FakeTokenProvider::new(),
    )
    .unwrap();
    let err = api.probe().await.unwrap_err();
    assert_eq!(err.alarm(), Some(sw_core::AlarmKind::ApiOffline));
}
