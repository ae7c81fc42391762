// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token cache with a refresh margin

use super::{AuthError, Token, TokenProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sw_core::Clock;
use tokio::sync::Mutex;

/// Reuses a token until its remaining lifetime drops to `margin`.
///
/// Concurrent callers share one in-flight fetch: the lock is held across the
/// inner call.
#[derive(Clone)]
pub struct CachedTokenProvider<P, C> {
    inner: P,
    clock: C,
    margin: Duration,
    cached: Arc<Mutex<Option<(Token, Instant)>>>,
}

impl<P: TokenProvider, C: Clock> CachedTokenProvider<P, C> {
    pub fn new(inner: P, clock: C, margin: Duration) -> Self {
        Self {
            inner,
            clock,
            margin,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    async fn fetch(&self, slot: &mut Option<(Token, Instant)>) -> Result<Token, AuthError> {
        let issued = self.clock.now();
        let token = self.inner.get_token().await?;
        *slot = Some((token.clone(), issued + token.expires_in));
        Ok(token)
    }
}

#[async_trait]
impl<P: TokenProvider, C: Clock> TokenProvider for CachedTokenProvider<P, C> {
    async fn get_token(&self) -> Result<Token, AuthError> {
        let mut slot = self.cached.lock().await;
        if let Some((token, expires_at)) = slot.as_ref() {
            let remaining = expires_at.saturating_duration_since(self.clock.now());
            if remaining > self.margin {
                return Ok(token.clone());
            }
            tracing::debug!(remaining_ms = remaining.as_millis() as u64, "token near expiry");
        }
        self.fetch(&mut slot).await
    }

    async fn refresh(&self) -> Result<Token, AuthError> {
        let mut slot = self.cached.lock().await;
        *slot = None;
        self.fetch(&mut slot).await
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
