// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Import configuration handed to checklist decoders
//!
//! Assembled once during preflight from the collection settings, the
//! caller's grant and the benchmark remapping table.

use crate::model::{Review, ReviewResult, ReviewStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything a decoder needs besides the file bytes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportConfig {
    pub options: ImportOptions,
    pub fields: FieldSettings,
    /// Whether the agent's grant allows setting "accepted"
    pub allow_accept: bool,
    /// SCAP benchmark id to benchmark id
    pub scap_map: HashMap<String, String>,
}

impl ImportConfig {
    /// Resolve a benchmark id through the remapping table
    pub fn remap_benchmark<'a>(&'a self, benchmark_id: &'a str) -> &'a str {
        self.scap_map
            .get(benchmark_id)
            .map(String::as_str)
            .unwrap_or(benchmark_id)
    }

    /// Status to attach to a review under the collection's auto-status policy
    pub fn status_for(&self, review: &Review) -> Option<ReviewStatus> {
        let wanted = match self.options.auto_status {
            AutoStatus::Null => return None,
            AutoStatus::Saved => ReviewStatus::Saved,
            AutoStatus::Submitted => ReviewStatus::Submitted,
            AutoStatus::Accepted if self.allow_accept => ReviewStatus::Accepted,
            AutoStatus::Accepted => ReviewStatus::Submitted,
        };
        if wanted == ReviewStatus::Saved || self.fields.satisfied_by(review) {
            Some(wanted)
        } else {
            Some(ReviewStatus::Saved)
        }
    }
}

/// Collection-level import behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    pub auto_status: AutoStatus,
    pub unreviewed: Unreviewed,
    pub unreviewed_commented: UnreviewedCommented,
    pub empty_detail: EmptyText,
    pub empty_comment: EmptyText,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            auto_status: AutoStatus::Saved,
            unreviewed: Unreviewed::Commented,
            unreviewed_commented: UnreviewedCommented::Informational,
            empty_detail: EmptyText::Replace,
            empty_comment: EmptyText::Ignore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoStatus {
    Null,
    Saved,
    Submitted,
    Accepted,
}

/// Whether unreviewed rules are imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unreviewed {
    Never,
    Commented,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnreviewedCommented {
    Informational,
    Notchecked,
}

impl UnreviewedCommented {
    pub fn result(self) -> ReviewResult {
        match self {
            UnreviewedCommented::Informational => ReviewResult::Informational,
            UnreviewedCommented::Notchecked => ReviewResult::NotChecked,
        }
    }
}

/// Policy for an empty detail or comment field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyText {
    Replace,
    Ignore,
    Import,
}

/// When a review field is enabled or required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRule {
    Always,
    Findings,
    Optional,
}

impl FieldRule {
    fn satisfied(self, result: ReviewResult, text: &str) -> bool {
        match self {
            FieldRule::Optional => true,
            FieldRule::Always => !text.trim().is_empty(),
            FieldRule::Findings => result != ReviewResult::Fail || !text.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSetting {
    pub enabled: FieldRule,
    pub required: FieldRule,
}

/// Field requirements from the collection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSettings {
    pub detail: FieldSetting,
    pub comment: FieldSetting,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            detail: FieldSetting {
                enabled: FieldRule::Always,
                required: FieldRule::Always,
            },
            comment: FieldSetting {
                enabled: FieldRule::Findings,
                required: FieldRule::Findings,
            },
        }
    }
}

impl FieldSettings {
    /// Whether a review carries every field the collection requires
    pub fn satisfied_by(&self, review: &Review) -> bool {
        self.detail.required.satisfied(review.result, &review.detail)
            && self.comment.required.satisfied(review.result, &review.comment)
    }
}

/// One row of the SCAP benchmark remapping table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScapMapping {
    pub scap_benchmark_id: String,
    pub benchmark_id: String,
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
