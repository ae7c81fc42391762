// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered settings: built-in defaults < TOML file < environment < flags
//!
//! One `Options` type is both the clap parser and the TOML schema, so every
//! knob has a flag, a `STIGWATCH_*` variable and a file key with the same name.

use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use humantime_serde::re::humantime::parse_duration;
use serde::Deserialize;
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use sw_core::{
    ConfigFaultPolicy, DeliveryConfig, DiscoveryConfig, DiscoveryMode, HistoryConfig,
    PipelineConfig, RetryConfig,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("`{key}` is not a valid URL: {value}")]
    BadUrl { key: &'static str, value: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeArg {
    Scan,
    Events,
}

impl From<ModeArg> for DiscoveryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Scan => DiscoveryMode::Scan,
            ModeArg::Events => DiscoveryMode::Events,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyArg {
    Terminal,
    Retry,
}

impl From<PolicyArg> for ConfigFaultPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Terminal => ConfigFaultPolicy::Terminal,
            PolicyArg::Retry => ConfigFaultPolicy::Retry,
        }
    }
}

#[derive(Debug, Default, Parser, Deserialize)]
#[command(
    name = "stigwatch",
    version,
    args_override_self = true,
    about = "Watch a directory for STIG checklists and submit them as reviews"
)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// TOML file providing any of the settings below
    #[arg(long, env = "STIGWATCH_CONFIG")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Base URL of the compliance API
    #[arg(long, env = "STIGWATCH_API_BASE")]
    pub api_base: Option<String>,
    /// OIDC authority issuing client-credential tokens
    #[arg(long, env = "STIGWATCH_AUTHORITY")]
    pub authority: Option<String>,
    #[arg(long, env = "STIGWATCH_CLIENT_ID")]
    pub client_id: Option<String>,
    #[arg(long, env = "STIGWATCH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<Secret>,
    #[arg(long, env = "STIGWATCH_SCOPE")]
    pub scope: Option<String>,
    #[arg(long, env = "STIGWATCH_COLLECTION_ID")]
    pub collection_id: Option<String>,

    /// Directory to watch
    #[arg(long, env = "STIGWATCH_PATH")]
    pub path: Option<PathBuf>,
    #[arg(long, env = "STIGWATCH_MODE", value_enum)]
    pub mode: Option<ModeArg>,
    /// Comma-separated extensions, without the dot
    #[arg(long, env = "STIGWATCH_EXTENSIONS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,
    /// Comma-separated globs relative to the watched path
    #[arg(long, env = "STIGWATCH_IGNORE_GLOBS", value_delimiter = ',')]
    pub ignore_globs: Option<Vec<String>>,
    #[arg(long, env = "STIGWATCH_IGNORE_DOT", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub ignore_dot: Option<bool>,
    #[arg(long, env = "STIGWATCH_SCAN_INTERVAL", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub scan_interval: Option<Duration>,
    /// Scan once, drain, and exit
    #[arg(long, env = "STIGWATCH_ONE_SHOT", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub one_shot: Option<bool>,
    #[arg(long, env = "STIGWATCH_ADD_EXISTING", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub add_existing: Option<bool>,
    #[arg(long, env = "STIGWATCH_USE_POLLING", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub use_polling: Option<bool>,
    #[arg(long, env = "STIGWATCH_STABILITY_THRESHOLD", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub stability_threshold: Option<Duration>,

    #[arg(long, env = "STIGWATCH_BATCH_SIZE")]
    pub batch_size: Option<usize>,
    #[arg(long, env = "STIGWATCH_BATCH_DELAY", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub batch_delay: Option<Duration>,
    #[arg(long, env = "STIGWATCH_PARSE_CONCURRENCY")]
    pub parse_concurrency: Option<usize>,
    #[arg(long, env = "STIGWATCH_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,
    #[arg(long, env = "STIGWATCH_HISTORY_FLUSH_INTERVAL", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub history_flush_interval: Option<Duration>,
    #[arg(long, env = "STIGWATCH_CREATE_OBJECTS", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub create_objects: Option<bool>,
    #[arg(long, env = "STIGWATCH_STRICT_REVISION_CHECK", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub strict_revision_check: Option<bool>,

    #[arg(long, env = "STIGWATCH_API_RETRY_DELAY", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub api_retry_delay: Option<Duration>,
    /// Probes before giving up; 0 retries forever
    #[arg(long, env = "STIGWATCH_API_RETRY_BOUND")]
    pub api_retry_bound: Option<u32>,
    #[arg(long, env = "STIGWATCH_AUTH_RETRY_DELAY", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub auth_retry_delay: Option<Duration>,
    #[arg(long, env = "STIGWATCH_AUTH_RETRY_BOUND")]
    pub auth_retry_bound: Option<u32>,
    /// What to do when the token or grant is rejected
    #[arg(long, env = "STIGWATCH_CONFIG_FAULT_POLICY", value_enum)]
    pub config_fault_policy: Option<PolicyArg>,

    #[arg(long, env = "STIGWATCH_RESPONSE_TIMEOUT", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub response_timeout: Option<Duration>,
    #[arg(long, env = "STIGWATCH_TOKEN_REFRESH_MARGIN", value_parser = parse_duration)]
    #[serde(with = "humantime_serde")]
    pub token_refresh_margin: Option<Duration>,

    /// Default filter when RUST_LOG is unset
    #[arg(long, env = "STIGWATCH_LOG_LEVEL")]
    pub log_level: Option<String>,
    #[arg(long, env = "STIGWATCH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
    #[arg(long, env = "STIGWATCH_LOG_JSON", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub log_json: Option<bool>,
}

macro_rules! prefer_first {
    ($first:expr, $second:expr, { $($field:ident),* $(,)? }) => {
        Options {
            config: $first.config,
            $($field: $first.$field.or($second.$field),)*
        }
    };
}

impl Options {
    /// Fill every unset field from `file`
    pub fn merge(self, file: Options) -> Options {
        prefer_first!(self, file, {
            api_base, authority, client_id, client_secret, scope, collection_id,
            path, mode, extensions, ignore_globs, ignore_dot, scan_interval,
            one_shot, add_existing, use_polling, stability_threshold,
            batch_size, batch_delay, parse_concurrency, history_file,
            history_flush_interval, create_objects, strict_revision_check,
            api_retry_delay, api_retry_bound, auth_retry_delay, auth_retry_bound,
            config_fault_policy, response_timeout, token_refresh_margin,
            log_level, log_file, log_json,
        })
    }

    /// Resolve into concrete settings, applying built-in defaults
    pub fn into_settings(self) -> Result<Settings, SettingsError> {
        let api_base = self.api_base.ok_or(SettingsError::Missing("api_base"))?;
        let authority = self.authority.ok_or(SettingsError::Missing("authority"))?;
        check_url("api_base", &api_base)?;
        check_url("authority", &authority)?;

        let discovery_defaults = DiscoveryConfig::default();
        let discovery = DiscoveryConfig {
            root: self.path.ok_or(SettingsError::Missing("path"))?,
            mode: self.mode.map_or(discovery_defaults.mode, Into::into),
            extensions: self.extensions.unwrap_or(discovery_defaults.extensions),
            ignore_globs: self.ignore_globs.unwrap_or_default(),
            ignore_dot: self.ignore_dot.unwrap_or(discovery_defaults.ignore_dot),
            scan_interval: self.scan_interval.unwrap_or(discovery_defaults.scan_interval),
            one_shot: self.one_shot.unwrap_or(false),
            add_existing: self.add_existing.unwrap_or(false),
            use_polling: self.use_polling.unwrap_or(false),
            stability_threshold: self
                .stability_threshold
                .unwrap_or(discovery_defaults.stability_threshold),
        };

        let delivery_defaults = DeliveryConfig::default();
        let delivery = DeliveryConfig {
            collection_id: self
                .collection_id
                .ok_or(SettingsError::Missing("collection_id"))?,
            batch_size: self.batch_size.unwrap_or(delivery_defaults.batch_size),
            batch_delay: self.batch_delay.unwrap_or(delivery_defaults.batch_delay),
            parse_concurrency: self
                .parse_concurrency
                .unwrap_or(delivery_defaults.parse_concurrency),
            create_objects: self
                .create_objects
                .unwrap_or(delivery_defaults.create_objects),
            strict_revision_check: self
                .strict_revision_check
                .unwrap_or(delivery_defaults.strict_revision_check),
        };

        let history_defaults = HistoryConfig::default();
        let history = HistoryConfig {
            path: self.history_file.unwrap_or(history_defaults.path),
            flush_interval: self
                .history_flush_interval
                .unwrap_or(history_defaults.flush_interval),
        };

        let retry = RetryConfig::default();
        let pipeline = PipelineConfig {
            discovery,
            delivery,
            history,
            api_retry: RetryConfig {
                delay: self.api_retry_delay.unwrap_or(retry.delay),
                bound: self.api_retry_bound.unwrap_or(retry.bound),
            },
            auth_retry: RetryConfig {
                delay: self.auth_retry_delay.unwrap_or(retry.delay),
                bound: self.auth_retry_bound.unwrap_or(retry.bound),
            },
            config_fault_policy: self
                .config_fault_policy
                .map_or(ConfigFaultPolicy::default(), Into::into),
        };

        let service = ServiceSettings {
            api_base,
            authority,
            client_id: self.client_id.ok_or(SettingsError::Missing("client_id"))?,
            client_secret: self
                .client_secret
                .ok_or(SettingsError::Missing("client_secret"))?,
            scope: self.scope,
            response_timeout: self.response_timeout.unwrap_or(Duration::from_secs(30)),
            token_refresh_margin: self
                .token_refresh_margin
                .unwrap_or(Duration::from_secs(60)),
        };

        let log = LogSettings {
            level: self.log_level.unwrap_or_else(|| "info".to_string()),
            file: self.log_file,
            json: self.log_json.unwrap_or(false),
        };

        Ok(Settings {
            pipeline,
            service,
            log,
        })
    }
}

fn check_url(key: &'static str, value: &str) -> Result<(), SettingsError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(SettingsError::BadUrl {
            key,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub service: ServiceSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Layer the optional config file under `cli` and resolve
    pub fn load(cli: Options) -> Result<Settings, SettingsError> {
        let file = match &cli.config {
            Some(path) => read_file(path)?,
            None => Options::default(),
        };
        cli.merge(file).into_settings()
    }
}

fn read_file(path: &Path) -> Result<Options, SettingsError> {
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Endpoints and credentials for the remote service and its authority
#[derive(Debug)]
pub struct ServiceSettings {
    pub api_base: String,
    pub authority: String,
    pub client_id: String,
    pub client_secret: Secret,
    pub scope: Option<String>,
    pub response_timeout: Duration,
    pub token_refresh_margin: Duration,
}

/// A credential kept out of debug output
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Secret(s.to_string()))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub file: Option<PathBuf>,
    pub json: bool,
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
