// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoder for STIG Viewer 3 JSON checklists

use super::{ChecklistParser, FormatHint, ParseError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use sw_core::{
    Checklist, ChecklistStats, EmptyText, ImportConfig, ParsedResult, Review, ReviewResult,
    Target, Unreviewed,
};

const NO_DETAIL: &str = "There is no detail provided for the assessment";
const NO_COMMENT: &str = "There is no comment provided for the assessment";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CklbDocument {
    target_data: TargetData,
    stigs: Vec<CklbStig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TargetData {
    target_type: String,
    host_name: String,
    ip_address: String,
    mac_address: String,
    fqdn: String,
    role: String,
    technology_area: String,
    is_web_database: bool,
    web_db_site: String,
    web_db_instance: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CklbStig {
    stig_id: String,
    version: String,
    release_info: String,
    rules: Vec<CklbRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CklbRule {
    rule_id_src: String,
    rule_id: String,
    status: String,
    finding_details: String,
    comments: String,
}

/// Handles `.cklb` only; other formats are reported as unsupported
#[derive(Debug, Clone, Copy, Default)]
pub struct CklbParser;

impl ChecklistParser for CklbParser {
    fn supports(&self, hint: FormatHint) -> bool {
        hint == FormatHint::Cklb
    }

    fn parse(
        &self,
        bytes: &[u8],
        hint: FormatHint,
        config: &ImportConfig,
    ) -> Result<ParsedResult, ParseError> {
        if !self.supports(hint) {
            return Err(ParseError::UnsupportedFormat(hint));
        }
        let doc: CklbDocument =
            serde_json::from_slice(bytes).map_err(|e| ParseError::Malformed(e.to_string()))?;

        let target = target(&doc.target_data)?;
        if doc.stigs.is_empty() {
            return Err(ParseError::NoChecklists);
        }
        let checklists = doc
            .stigs
            .into_iter()
            .map(|stig| checklist(stig, config))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ParsedResult {
            source_ref: PathBuf::new(),
            target,
            checklists,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn target(data: &TargetData) -> Result<Target, ParseError> {
    let host = data.host_name.trim();
    if host.is_empty() {
        return Err(ParseError::MissingTarget);
    }

    let mut metadata = BTreeMap::new();
    if let Some(role) = non_empty(&data.role) {
        metadata.insert("cklRole".to_string(), role);
    }
    if let Some(area) = non_empty(&data.technology_area) {
        metadata.insert("cklTechArea".to_string(), area);
    }

    let name = if data.is_web_database {
        metadata.insert("cklHostName".to_string(), host.to_string());
        metadata.insert("cklWebOrDatabase".to_string(), "true".to_string());
        let mut parts = vec![host.to_string()];
        if let Some(site) = non_empty(&data.web_db_site) {
            metadata.insert("cklWebDbSite".to_string(), site.clone());
            parts.push(site);
        }
        if let Some(instance) = non_empty(&data.web_db_instance) {
            metadata.insert("cklWebDbInstance".to_string(), instance.clone());
            parts.push(instance);
        }
        parts.join("-")
    } else {
        host.to_string()
    };

    Ok(Target {
        name,
        fqdn: non_empty(&data.fqdn),
        ip: non_empty(&data.ip_address),
        mac: non_empty(&data.mac_address),
        noncomputing: data.target_type.eq_ignore_ascii_case("non-computing"),
        metadata,
    })
}

/// `V<version>R<release>` from the version field and "Release: N ..." text
fn revision_str(version: &str, release_info: &str) -> String {
    let release: String = release_info
        .split_once("Release:")
        .map(|(_, rest)| {
            rest.trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect()
        })
        .unwrap_or_default();
    let release = if release.is_empty() { "0" } else { release.as_str() };
    format!("V{}R{}", version.trim(), release)
}

fn checklist(stig: CklbStig, config: &ImportConfig) -> Result<Checklist, ParseError> {
    if stig.stig_id.trim().is_empty() {
        return Err(ParseError::Malformed("benchmark without stig_id".to_string()));
    }
    let benchmark_id = config.remap_benchmark(stig.stig_id.trim()).to_string();
    let revision_str = revision_str(&stig.version, &stig.release_info);

    let mut stats = ChecklistStats::default();
    let mut reviews = Vec::with_capacity(stig.rules.len());
    for rule in stig.rules {
        if let Some(review) = review(rule, config) {
            stats.record(review.result);
            reviews.push(review);
        }
    }

    Ok(Checklist {
        benchmark_id,
        revision_str,
        reviews,
        stats,
    })
}

fn review(rule: CklbRule, config: &ImportConfig) -> Option<Review> {
    let options = &config.options;
    let rule_id = if rule.rule_id_src.is_empty() {
        rule.rule_id
    } else {
        rule.rule_id_src
    };
    if rule_id.is_empty() {
        return None;
    }

    let commented = !rule.finding_details.trim().is_empty() || !rule.comments.trim().is_empty();
    let result = match rule.status.as_str() {
        "not_a_finding" => ReviewResult::Pass,
        "open" => ReviewResult::Fail,
        "not_applicable" => ReviewResult::NotApplicable,
        _ => match (options.unreviewed, commented) {
            (Unreviewed::Never, _) | (Unreviewed::Commented, false) => return None,
            (_, true) => options.unreviewed_commented.result(),
            (Unreviewed::Always, false) => ReviewResult::NotChecked,
        },
    };

    let mut review = Review {
        rule_id,
        result,
        detail: fill(rule.finding_details, options.empty_detail, NO_DETAIL),
        comment: fill(rule.comments, options.empty_comment, NO_COMMENT),
        status: None,
        result_engine: None,
    };
    review.status = config.status_for(&review);
    Some(review)
}

fn fill(text: String, policy: EmptyText, replacement: &str) -> String {
    if text.trim().is_empty() && policy == EmptyText::Replace {
        replacement.to_string()
    } else {
        text
    }
}

#[cfg(test)]
#[path = "cklb_tests.rs"]
mod tests;
