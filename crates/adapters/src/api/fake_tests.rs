// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeMap;

fn new_asset(name: &str) -> NewAsset {
    NewAsset {
        name: name.to_string(),
        collection_id: "1".to_string(),
        fqdn: None,
        ip: None,
        mac: None,
        noncomputing: false,
        metadata: BTreeMap::new(),
        benchmark_ids: vec!["VPN_SRG".to_string()],
    }
}

#[tokio::test]
async fn create_is_idempotent_on_name() {
    let api = FakeComplianceApi::new();

    let first = api.create_or_get_asset(&new_asset("test")).await.unwrap();
    let second = api.create_or_get_asset(&new_asset("TEST")).await.unwrap();

    let (CreateOutcome::Created(created), CreateOutcome::Existing(existing)) = (first, second)
    else {
        panic!("expected a create then an existing record");
    };
    assert_eq!(created, existing);
    assert_eq!(api.assets().len(), 1);
}

#[tokio::test]
async fn raced_create_returns_existing() {
    let api = FakeComplianceApi::new();
    api.race_create("host1", &[]);

    let outcome = api.create_or_get_asset(&new_asset("host1")).await.unwrap();
    assert!(matches!(outcome, CreateOutcome::Existing(_)));
}

#[tokio::test]
async fn offline_fails_every_call_and_records_it() {
    let api = FakeComplianceApi::new();
    api.set_offline(true);

    assert!(api.probe().await.is_err());
    assert!(api.list_assets("1").await.is_err());
    assert_eq!(api.calls(), vec![ApiCall::Probe, ApiCall::ListAssets]);
}

#[tokio::test]
async fn auth_error_spares_the_probe() {
    let api = FakeComplianceApi::new();
    api.set_auth_error(Some(ApiError::Status {
        status: 403,
        body: String::new(),
    }));

    assert!(api.probe().await.is_ok());
    let err = api.get_user().await.unwrap_err();
    assert_eq!(err.alarm(), Some(sw_core::AlarmKind::NoGrant));
}

#[tokio::test]
async fn rejected_submission_is_data_fault() {
    let api = FakeComplianceApi::new();
    let id = api.add_asset("bad-host", &["VPN_SRG"]);
    api.reject_submit_for("bad-host");

    let err = api.submit_reviews("1", &id, &[]).await.unwrap_err();
    assert_eq!(err.alarm(), None);
}
