// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OIDC client-credentials token provider

use super::{AuthError, Token, TokenProvider};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
struct OpenIdConfig {
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    300
}

/// Fetches tokens with the client-credentials grant.
///
/// The token endpoint is discovered from
/// `<authority>/.well-known/openid-configuration` on first use and kept for
/// the life of the provider.
#[derive(Clone)]
pub struct OidcTokenProvider {
    client: reqwest::Client,
    authority: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
    token_endpoint: Arc<OnceCell<String>>,
}

impl OidcTokenProvider {
    pub fn new(
        authority: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            authority: authority.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope,
            token_endpoint: Arc::new(OnceCell::new()),
        })
    }

    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.authority)
    }

    async fn token_endpoint(&self) -> Result<&str, AuthError> {
        let endpoint = self
            .token_endpoint
            .get_or_try_init(|| async {
                let url = self.discovery_url();
                tracing::debug!(url, "discovering token endpoint");
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| AuthError::Unreachable(e.to_string()))?;
                let config: OpenIdConfig = decode(response).await?;
                Ok::<_, AuthError>(config.token_endpoint)
            })
            .await?;
        Ok(endpoint.as_str())
    }
}

#[async_trait]
impl TokenProvider for OidcTokenProvider {
    async fn get_token(&self) -> Result<Token, AuthError> {
        let endpoint = self.token_endpoint().await?;

        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .client
            .post(endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;
        let token: TokenResponse = decode(response).await?;

        Ok(Token {
            access_token: token.access_token,
            expires_in: Duration::from_secs(token.expires_in),
        })
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| AuthError::Decode(e.to_string()))
}
