// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn review(result: ReviewResult, detail: &str, comment: &str) -> Review {
    Review {
        rule_id: "SV-1_rule".to_string(),
        result,
        detail: detail.to_string(),
        comment: comment.to_string(),
        status: None,
        result_engine: None,
    }
}

fn config(auto_status: AutoStatus, allow_accept: bool) -> ImportConfig {
    ImportConfig {
        options: ImportOptions {
            auto_status,
            ..ImportOptions::default()
        },
        allow_accept,
        ..ImportConfig::default()
    }
}

#[test]
fn remap_uses_table_then_falls_back() {
    let mut config = ImportConfig::default();
    config
        .scap_map
        .insert("CAN_Ubuntu_18-04_STIG".to_string(), "U_CAN_Ubuntu_18-04_STIG".to_string());

    assert_eq!(
        config.remap_benchmark("CAN_Ubuntu_18-04_STIG"),
        "U_CAN_Ubuntu_18-04_STIG"
    );
    assert_eq!(config.remap_benchmark("Windows_10_STIG"), "Windows_10_STIG");
}

#[test]
fn null_auto_status_leaves_status_unset() {
    let config = config(AutoStatus::Null, true);
    assert_eq!(config.status_for(&review(ReviewResult::Pass, "ok", "")), None);
}

#[test]
fn accepted_downgrades_without_grant() {
    let config = config(AutoStatus::Accepted, false);
    assert_eq!(
        config.status_for(&review(ReviewResult::Pass, "ok", "")),
        Some(ReviewStatus::Submitted)
    );
}

#[test]
fn accepted_kept_with_grant() {
    let config = config(AutoStatus::Accepted, true);
    assert_eq!(
        config.status_for(&review(ReviewResult::Pass, "ok", "")),
        Some(ReviewStatus::Accepted)
    );
}

#[test]
fn missing_required_fields_fall_back_to_saved() {
    let config = config(AutoStatus::Submitted, false);

    // detail is always required by default
    assert_eq!(
        config.status_for(&review(ReviewResult::Pass, "", "")),
        Some(ReviewStatus::Saved)
    );
    // comment is required for findings
    assert_eq!(
        config.status_for(&review(ReviewResult::Fail, "open", "")),
        Some(ReviewStatus::Saved)
    );
    assert_eq!(
        config.status_for(&review(ReviewResult::Fail, "open", "tracked in POAM")),
        Some(ReviewStatus::Submitted)
    );
}

#[test]
fn options_deserialize_with_defaults() {
    let options: ImportOptions =
        serde_json::from_str(r#"{"autoStatus":"submitted","emptyDetail":"import"}"#).unwrap();
    assert_eq!(options.auto_status, AutoStatus::Submitted);
    assert_eq!(options.empty_detail, EmptyText::Import);
    assert_eq!(options.unreviewed, Unreviewed::Commented);
}
