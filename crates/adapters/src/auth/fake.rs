// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake token provider for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AuthError, Token, TokenProvider};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct FakeTokenState {
    issued: u32,
    lifetime: Duration,
    error: Option<AuthError>,
}

/// Issues `token-<n>` tokens, or a configured error
#[derive(Clone)]
pub struct FakeTokenProvider {
    inner: Arc<Mutex<FakeTokenState>>,
}

impl Default for FakeTokenProvider {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeTokenState {
                issued: 0,
                lifetime: Duration::from_secs(300),
                error: None,
            })),
        }
    }
}

impl FakeTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifetime(self, lifetime: Duration) -> Self {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).lifetime = lifetime;
        self
    }

    /// Fail every fetch with `error` until cleared with `None`
    pub fn set_error(&self, error: Option<AuthError>) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).error = error;
    }

    /// Number of tokens issued so far
    pub fn issued(&self) -> u32 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).issued
    }
}

#[async_trait]
impl TokenProvider for FakeTokenProvider {
    async fn get_token(&self) -> Result<Token, AuthError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        state.issued += 1;
        Ok(Token {
            access_token: format!("token-{}", state.issued),
            expires_in: state.lifetime,
        })
    }
}
