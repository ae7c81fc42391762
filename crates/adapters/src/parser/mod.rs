// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checklist format decoders

mod cklb;

pub use cklb::CklbParser;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeParser;

use std::fmt;
use std::path::Path;
use sw_core::{ImportConfig, ParsedResult};
use thiserror::Error;

/// Checklist format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatHint {
    /// STIG Viewer XML checklist
    Ckl,
    /// XCCDF results document
    Xccdf,
    /// STIG Viewer 3 JSON checklist
    Cklb,
}

impl FormatHint {
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }

    /// Extension without the dot, any case
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "ckl" => Some(FormatHint::Ckl),
            "xml" => Some(FormatHint::Xccdf),
            "cklb" => Some(FormatHint::Cklb),
            _ => None,
        }
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Ckl => write!(f, "ckl"),
            FormatHint::Xccdf => write!(f, "xccdf"),
            FormatHint::Cklb => write!(f, "cklb"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no decoder for {0} files")]
    UnsupportedFormat(FormatHint),
    #[error("malformed checklist: {0}")]
    Malformed(String),
    #[error("checklist has no target host name")]
    MissingTarget,
    #[error("checklist contains no benchmarks")]
    NoChecklists,
}

/// Pure decoder from file bytes to a normalized result.
///
/// Implementations leave `source_ref` empty; the caller owns the path.
pub trait ChecklistParser: Clone + Send + Sync + 'static {
    fn parse(
        &self,
        bytes: &[u8],
        hint: FormatHint,
        config: &ImportConfig,
    ) -> Result<ParsedResult, ParseError>;

    /// Whether `parse` can decode this format at all
    fn supports(&self, hint: FormatHint) -> bool {
        let _ = hint;
        true
    }
}
