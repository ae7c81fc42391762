// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn asset_key_is_case_insensitive() {
    let result = ParsedResult {
        source_ref: PathBuf::from("/data/Host1.cklb"),
        target: Target {
            name: "HOST1".to_string(),
            ..Target::default()
        },
        checklists: vec![],
    };
    assert_eq!(result.asset_key(), "host1");
}

#[test]
fn review_serializes_in_api_shape() {
    let review = Review {
        rule_id: "SV-1_rule".to_string(),
        result: ReviewResult::NotApplicable,
        detail: "n/a".to_string(),
        comment: String::new(),
        status: Some(ReviewStatus::Submitted),
        result_engine: None,
    };

    let json = serde_json::to_value(&review).unwrap();
    assert_eq!(json["ruleId"], "SV-1_rule");
    assert_eq!(json["result"], "notapplicable");
    assert_eq!(json["status"], "submitted");
    assert!(json.get("resultEngine").is_none());
}

#[test]
fn stats_record_each_result() {
    let mut stats = ChecklistStats::default();
    stats.record(ReviewResult::Pass);
    stats.record(ReviewResult::Pass);
    stats.record(ReviewResult::Fail);
    stats.record(ReviewResult::NotChecked);

    assert_eq!(stats.pass, 2);
    assert_eq!(stats.fail, 1);
    assert_eq!(stats.notchecked, 1);
    assert_eq!(stats.unknown, 0);
}
