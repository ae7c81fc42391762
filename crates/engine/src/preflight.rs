// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup checks against the credential authority and the remote service
//!
//! Produces the import configuration every decoder call receives.

use crate::error::EngineError;
use crate::monitor::MIN_ACCESS_LEVEL;
use sw_adapters::{ApiError, ComplianceApi, TokenProvider};
use sw_core::{Alarm, AlarmKind, ImportConfig};

/// Grant level at which reviews may be marked accepted
const ACCEPT_ACCESS_LEVEL: u8 = 3;

enum Failure {
    /// Raise the condition and try again once everything clears
    Alarm(AlarmKind, String),
    Fatal(String),
}

impl From<ApiError> for Failure {
    fn from(e: ApiError) -> Self {
        match e.alarm() {
            Some(kind) => Failure::Alarm(kind, e.to_string()),
            None => Failure::Fatal(e.to_string()),
        }
    }
}

pub struct Preflight<A, T> {
    api: A,
    tokens: T,
    alarm: Alarm,
    collection_id: String,
}

impl<A: ComplianceApi, T: TokenProvider> Preflight<A, T> {
    pub fn new(api: A, tokens: T, alarm: Alarm, collection_id: impl Into<String>) -> Self {
        Self {
            api,
            tokens,
            alarm,
            collection_id: collection_id.into(),
        }
    }

    /// Retry through connectivity faults until the checks pass.
    /// Anything else is an initialization failure.
    pub async fn run(&self) -> Result<ImportConfig, EngineError> {
        loop {
            self.alarm.wait_clear().await;
            match self.attempt().await {
                Ok(config) => return Ok(config),
                Err(Failure::Alarm(kind, reason)) => {
                    tracing::warn!(alarm = %kind, reason, "preflight blocked");
                    self.alarm.raise(kind);
                }
                Err(Failure::Fatal(reason)) => return Err(EngineError::Preflight(reason)),
            }
        }
    }

    async fn attempt(&self) -> Result<ImportConfig, Failure> {
        self.tokens
            .get_token()
            .await
            .map_err(|e| Failure::Alarm(e.alarm(), e.to_string()))?;

        let user = self.api.get_user().await?;
        let level = user.access_level(&self.collection_id).unwrap_or(0);
        if level < MIN_ACCESS_LEVEL {
            return Err(Failure::Alarm(
                AlarmKind::NoGrant,
                format!(
                    "{} has access level {} on collection {}",
                    user.username, level, self.collection_id
                ),
            ));
        }

        let settings = self.api.get_collection(&self.collection_id).await?;
        let scap_map = self.api.get_scap_map().await?;

        tracing::info!(
            user = %user.username,
            collection = %settings.name,
            access_level = level,
            scap_mappings = scap_map.len(),
            "preflight passed"
        );

        Ok(ImportConfig {
            options: settings.import_options,
            fields: settings.fields,
            allow_accept: level >= ACCEPT_ACCESS_LEVEL,
            scap_map: scap_map
                .into_iter()
                .map(|m| (m.scap_benchmark_id, m.benchmark_id))
                .collect(),
        })
    }
}

#[cfg(test)]
#[path = "preflight_tests.rs"]
mod tests;
