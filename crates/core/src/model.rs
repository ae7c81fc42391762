// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normalized result model produced by checklist decoders
//!
//! A `ParsedResult` is immutable once a decoder hands it over; the delivery
//! stage owns it exclusively until its batch completes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One decoded checklist file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResult {
    /// Path of the file this result was decoded from
    pub source_ref: PathBuf,
    pub target: Target,
    pub checklists: Vec<Checklist>,
}

impl ParsedResult {
    /// Case-insensitive key used to group results by target asset
    pub fn asset_key(&self) -> String {
        self.target.name.to_lowercase()
    }
}

/// The host a checklist was evaluated against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub noncomputing: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Results for one benchmark within a checklist file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub benchmark_id: String,
    pub revision_str: String,
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub stats: ChecklistStats,
}

/// Per-result tallies reported by the decoder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistStats {
    pub pass: u32,
    pub fail: u32,
    pub notapplicable: u32,
    pub notchecked: u32,
    pub notselected: u32,
    pub informational: u32,
    pub error: u32,
    pub fixed: u32,
    pub unknown: u32,
}

impl ChecklistStats {
    pub fn record(&mut self, result: ReviewResult) {
        let slot = match result {
            ReviewResult::Pass => &mut self.pass,
            ReviewResult::Fail => &mut self.fail,
            ReviewResult::NotApplicable => &mut self.notapplicable,
            ReviewResult::NotChecked => &mut self.notchecked,
            ReviewResult::NotSelected => &mut self.notselected,
            ReviewResult::Informational => &mut self.informational,
            ReviewResult::Error => &mut self.error,
            ReviewResult::Fixed => &mut self.fixed,
            ReviewResult::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }
}

/// One rule-level assessment outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub rule_id: String,
    pub result: ReviewResult,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_engine: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewResult {
    Pass,
    Fail,
    #[serde(rename = "notapplicable")]
    NotApplicable,
    #[serde(rename = "notchecked")]
    NotChecked,
    #[serde(rename = "notselected")]
    NotSelected,
    Informational,
    Error,
    Fixed,
    Unknown,
}

impl fmt::Display for ReviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReviewResult::Pass => "pass",
            ReviewResult::Fail => "fail",
            ReviewResult::NotApplicable => "notapplicable",
            ReviewResult::NotChecked => "notchecked",
            ReviewResult::NotSelected => "notselected",
            ReviewResult::Informational => "informational",
            ReviewResult::Error => "error",
            ReviewResult::Fixed => "fixed",
            ReviewResult::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Saved,
    Submitted,
    Accepted,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
