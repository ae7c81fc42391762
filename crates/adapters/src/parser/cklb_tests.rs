// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::{AutoStatus, ReviewStatus, UnreviewedCommented};

fn document(rules: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "title": "test",
        "target_data": {
            "target_type": "Computing",
            "host_name": "test",
            "ip_address": "10.0.0.5",
            "mac_address": "",
            "fqdn": "test.example",
            "role": "Member Server",
            "technology_area": "",
            "is_web_database": false,
            "web_db_site": "",
            "web_db_instance": ""
        },
        "stigs": [{
            "stig_id": "VPN_SRG",
            "version": "1",
            "release_info": "Release: 3 Benchmark Date: 24 Jul 2024",
            "rules": rules
        }]
    }))
    .unwrap()
}

fn rule(id: &str, status: &str, details: &str, comments: &str) -> serde_json::Value {
    serde_json::json!({
        "rule_id_src": id,
        "rule_id": id.trim_end_matches("_rule"),
        "status": status,
        "finding_details": details,
        "comments": comments
    })
}

fn parse(bytes: &[u8], config: &ImportConfig) -> Result<ParsedResult, ParseError> {
    CklbParser.parse(bytes, FormatHint::Cklb, config)
}

#[test]
fn decodes_target_and_revision() {
    let bytes = document(serde_json::json!([rule("SV-1r1_rule", "not_a_finding", "ok", "")]));
    let result = parse(&bytes, &ImportConfig::default()).unwrap();

    assert_eq!(result.target.name, "test");
    assert_eq!(result.target.ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(result.target.mac, None);
    assert_eq!(result.target.metadata.get("cklRole").map(String::as_str), Some("Member Server"));
    assert_eq!(result.checklists.len(), 1);
    assert_eq!(result.checklists[0].benchmark_id, "VPN_SRG");
    assert_eq!(result.checklists[0].revision_str, "V1R3");
    assert_eq!(result.checklists[0].reviews[0].rule_id, "SV-1r1_rule");
    assert_eq!(result.checklists[0].stats.pass, 1);
}

#[test]
fn maps_statuses() {
    let bytes = document(serde_json::json!([
        rule("SV-1r1_rule", "not_a_finding", "ok", ""),
        rule("SV-2r1_rule", "open", "bad", "fix it"),
        rule("SV-3r1_rule", "not_applicable", "n/a", ""),
    ]));
    let result = parse(&bytes, &ImportConfig::default()).unwrap();
    let results: Vec<ReviewResult> = result.checklists[0].reviews.iter().map(|r| r.result).collect();

    assert_eq!(
        results,
        vec![ReviewResult::Pass, ReviewResult::Fail, ReviewResult::NotApplicable]
    );
}

#[test]
fn unreviewed_rules_follow_import_options() {
    let bytes = document(serde_json::json!([
        rule("SV-1r1_rule", "not_reviewed", "", ""),
        rule("SV-2r1_rule", "not_reviewed", "", "looked at it"),
    ]));

    // Default: only commented unreviewed rules, as informational
    let result = parse(&bytes, &ImportConfig::default()).unwrap();
    let reviews = &result.checklists[0].reviews;
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].rule_id, "SV-2r1_rule");
    assert_eq!(reviews[0].result, ReviewResult::Informational);

    let mut config = ImportConfig::default();
    config.options.unreviewed = Unreviewed::Always;
    config.options.unreviewed_commented = UnreviewedCommented::Notchecked;
    let result = parse(&bytes, &config).unwrap();
    assert_eq!(result.checklists[0].reviews.len(), 2);
    assert!(result.checklists[0]
        .reviews
        .iter()
        .all(|r| r.result == ReviewResult::NotChecked));

    config.options.unreviewed = Unreviewed::Never;
    let result = parse(&bytes, &config).unwrap();
    assert!(result.checklists[0].reviews.is_empty());
}

#[test]
fn empty_detail_is_replaced_by_default() {
    let bytes = document(serde_json::json!([rule("SV-1r1_rule", "not_a_finding", "", "")]));
    let result = parse(&bytes, &ImportConfig::default()).unwrap();
    let review = &result.checklists[0].reviews[0];

    assert_eq!(review.detail, NO_DETAIL);
    assert_eq!(review.comment, "");
}

#[test]
fn status_respects_accept_grant() {
    let bytes = document(serde_json::json!([rule("SV-1r1_rule", "not_a_finding", "ok", "")]));
    let mut config = ImportConfig::default();
    config.options.auto_status = AutoStatus::Accepted;

    let result = parse(&bytes, &config).unwrap();
    assert_eq!(
        result.checklists[0].reviews[0].status,
        Some(ReviewStatus::Submitted)
    );

    config.allow_accept = true;
    let result = parse(&bytes, &config).unwrap();
    assert_eq!(
        result.checklists[0].reviews[0].status,
        Some(ReviewStatus::Accepted)
    );
}

#[test]
fn benchmark_ids_are_remapped() {
    let bytes = document(serde_json::json!([]));
    let mut config = ImportConfig::default();
    config
        .scap_map
        .insert("VPN_SRG".to_string(), "VPN_SRG_TEST".to_string());

    let result = parse(&bytes, &config).unwrap();
    assert_eq!(result.checklists[0].benchmark_id, "VPN_SRG_TEST");
}

#[test]
fn web_database_target_name_includes_site_and_instance() {
    let bytes = serde_json::to_vec(&serde_json::json!({
        "target_data": {
            "host_name": "db01",
            "is_web_database": true,
            "web_db_site": "site",
            "web_db_instance": "inst1"
        },
        "stigs": [{"stig_id": "MS_SQL", "version": "2", "release_info": "", "rules": []}]
    }))
    .unwrap();
    let result = parse(&bytes, &ImportConfig::default()).unwrap();

    assert_eq!(result.target.name, "db01-site-inst1");
    assert_eq!(
        result.target.metadata.get("cklWebDbInstance").map(String::as_str),
        Some("inst1")
    );
    assert_eq!(result.checklists[0].revision_str, "V2R0");
}

#[yare::parameterized(
    not_json = { b"<CHECKLIST/>".to_vec(), "malformed" },
    no_host = { br#"{"target_data": {"host_name": ""}, "stigs": []}"#.to_vec(), "host name" },
    no_stigs = { br#"{"target_data": {"host_name": "h"}, "stigs": []}"#.to_vec(), "no benchmarks" },
)]
fn rejects_bad_documents(bytes: Vec<u8>, needle: &str) {
    let err = parse(&bytes, &ImportConfig::default()).unwrap_err();
    assert!(err.to_string().contains(needle), "{}", err);
}

#[test]
fn xml_formats_are_unsupported() {
    let err = CklbParser
        .parse(b"<CHECKLIST/>", FormatHint::Ckl, &ImportConfig::default())
        .unwrap_err();
    assert_eq!(err, ParseError::UnsupportedFormat(FormatHint::Ckl));
}

#[test]
fn advertises_only_json_checklists() {
    assert!(CklbParser.supports(FormatHint::Cklb));
    assert!(!CklbParser.supports(FormatHint::Ckl));
    assert!(!CklbParser.supports(FormatHint::Xccdf));
}
