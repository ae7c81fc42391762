// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential authority adapters

mod cache;
mod oidc;

pub use cache::CachedTokenProvider;
pub use oidc::OidcTokenProvider;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTokenProvider;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use sw_core::AlarmKind;
use thiserror::Error;

/// Errors from the credential authority
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Connection-level failure reaching the authority
    #[error("credential authority unreachable: {0}")]
    Unreachable(String),
    /// The authority answered but refused to issue a token
    #[error("credential authority rejected the client ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected token response: {0}")]
    Decode(String),
}

impl AuthError {
    /// Fault condition this error represents
    pub fn alarm(&self) -> AlarmKind {
        match self {
            AuthError::Unreachable(_) => AlarmKind::AuthOffline,
            AuthError::Rejected { .. } | AuthError::Decode(_) => AlarmKind::NoToken,
        }
    }
}

/// A bearer token and its lifetime at the time it was issued
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub expires_in: Duration,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Source of bearer tokens for the remote service
#[async_trait]
pub trait TokenProvider: Clone + Send + Sync + 'static {
    /// A token valid for at least the provider's safety margin
    async fn get_token(&self) -> Result<Token, AuthError>;

    /// Discard anything cached and fetch a fresh token
    async fn refresh(&self) -> Result<Token, AuthError> {
        self.get_token().await
    }
}
