// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake decoder for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChecklistParser, FormatHint, ParseError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use sw_core::{ImportConfig, ParsedResult};

/// Decodes files that hold a JSON-serialized `ParsedResult`, whatever the extension
#[derive(Clone, Default)]
pub struct FakeParser {
    calls: Arc<AtomicU32>,
    /// None accepts every format
    formats: Option<Arc<[FormatHint]>>,
}

impl FakeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that only handles `formats`
    pub fn only(formats: &[FormatHint]) -> Self {
        Self {
            formats: Some(formats.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Bytes that decode to `result`
    pub fn encode(result: &ParsedResult) -> Vec<u8> {
        serde_json::to_vec(result).unwrap_or_default()
    }
}

impl ChecklistParser for FakeParser {
    fn parse(
        &self,
        bytes: &[u8],
        hint: FormatHint,
        _config: &ImportConfig,
    ) -> Result<ParsedResult, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.supports(hint) {
            return Err(ParseError::UnsupportedFormat(hint));
        }
        serde_json::from_slice(bytes).map_err(|e| ParseError::Malformed(e.to_string()))
    }

    fn supports(&self, hint: FormatHint) -> bool {
        match &self.formats {
            Some(formats) => formats.contains(&hint),
            None => true,
        }
    }
}
