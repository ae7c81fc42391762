// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn valid() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.discovery.root = std::env::temp_dir();
    config.delivery.collection_id = "21".to_string();
    config
}

#[test]
fn defaults_validate_with_root_and_collection() {
    assert_eq!(valid().validate(), Ok(()));
}

#[test]
fn missing_root_is_rejected() {
    let mut config = valid();
    config.discovery.root = PathBuf::from("/definitely/not/here");
    assert!(matches!(config.validate(), Err(ConfigError::BadRoot(_))));
}

#[test]
fn one_shot_requires_scan_mode() {
    let mut config = valid();
    config.discovery.mode = DiscoveryMode::Events;
    config.discovery.one_shot = true;
    assert_eq!(config.validate(), Err(ConfigError::OneShotRequiresScan));
}

#[yare::parameterized(
    batch_size = { 0, 8, "batch size" },
    parse_concurrency = { 15, 0, "parse concurrency" },
)]
fn zero_sizes_are_rejected(batch_size: usize, parse_concurrency: usize, what: &'static str) {
    let mut config = valid();
    config.delivery.batch_size = batch_size;
    config.delivery.parse_concurrency = parse_concurrency;
    assert_eq!(config.validate(), Err(ConfigError::Zero(what)));
}

#[test]
fn zero_intervals_are_rejected() {
    let mut config = valid();
    config.history.flush_interval = Duration::ZERO;
    assert_eq!(config.validate(), Err(ConfigError::Zero("history flush interval")));

    let mut config = valid();
    config.discovery.scan_interval = Duration::ZERO;
    assert_eq!(config.validate(), Err(ConfigError::Zero("scan interval")));
    config.discovery.one_shot = true;
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn high_water_mark_is_twice_batch_size() {
    let mut config = DeliveryConfig::default();
    config.batch_size = 5;
    assert_eq!(config.high_water_mark(), 10);
}

#[test]
fn partial_config_fills_defaults() {
    let config: PipelineConfig = serde_json::from_value(serde_json::json!({
        "discovery": { "mode": "events", "stability_threshold": "2s" },
        "delivery": { "collection_id": "7", "batch_delay": "500ms" },
        "api_retry": { "bound": 4 },
        "config_fault_policy": "retry"
    }))
    .unwrap();

    assert_eq!(config.discovery.mode, DiscoveryMode::Events);
    assert_eq!(config.discovery.stability_threshold, Duration::from_secs(2));
    assert_eq!(config.discovery.extensions.len(), 3);
    assert_eq!(config.delivery.batch_delay, Duration::from_millis(500));
    assert_eq!(config.delivery.batch_size, 15);
    assert_eq!(config.api_retry.bound, 4);
    assert_eq!(config.api_retry.delay, Duration::from_secs(30));
    assert_eq!(config.config_fault_policy, ConfigFaultPolicy::Retry);
}
