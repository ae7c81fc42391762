// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;
use sw_adapters::{ApiCall, ApiError, FakeComplianceApi, FakeParser, FakeTokenProvider};
use sw_core::{
    AlarmKind, Checklist, ChecklistStats, ParsedResult, RetryConfig, Review, ReviewResult, Target,
};

type TestPipeline = Pipeline<FakeComplianceApi, FakeTokenProvider, FakeParser>;

struct Fixture {
    dir: tempfile::TempDir,
    root: PathBuf,
    api: FakeComplianceApi,
    tokens: FakeTokenProvider,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("watch");
        std::fs::create_dir(&root).unwrap();
        let root = std::fs::canonicalize(root).unwrap();
        let api = FakeComplianceApi::new();
        api.install("VPN_SRG", &["V1R1"]);
        Self {
            dir,
            root,
            api,
            tokens: FakeTokenProvider::new(),
        }
    }

    fn write(&self, name: &str, host: &str) -> PathBuf {
        let result = ParsedResult {
            source_ref: PathBuf::new(),
            target: Target {
                name: host.to_string(),
                ..Target::default()
            },
            checklists: vec![Checklist {
                benchmark_id: "VPN_SRG".to_string(),
                revision_str: "V1R1".to_string(),
                reviews: vec![Review {
                    rule_id: "SV-1".to_string(),
                    result: ReviewResult::Pass,
                    detail: "ok".to_string(),
                    comment: String::new(),
                    status: None,
                    result_engine: None,
                }],
                stats: ChecklistStats::default(),
            }],
        };
        let path = self.root.join(name);
        std::fs::write(&path, FakeParser::encode(&result)).unwrap();
        path
    }

    fn history_path(&self) -> PathBuf {
        self.dir.path().join("history.txt")
    }

    fn config(&self, one_shot: bool) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.discovery.root = self.root.clone();
        config.discovery.one_shot = one_shot;
        config.delivery.collection_id = "1".to_string();
        config.delivery.batch_delay = Duration::from_millis(10);
        config.history.path = self.history_path();
        config.api_retry = RetryConfig {
            delay: Duration::from_millis(20),
            bound: 0,
        };
        config.auth_retry = config.api_retry;
        config
    }

    fn deps(&self, parser: FakeParser) -> PipelineDeps<FakeComplianceApi, FakeTokenProvider, FakeParser> {
        PipelineDeps {
            api: self.api.clone(),
            tokens: self.tokens.clone(),
            parser,
        }
    }

    fn pipeline(&self, config: PipelineConfig) -> TestPipeline {
        Pipeline::new(config, self.deps(FakeParser::new())).unwrap()
    }

    fn count(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        self.api.calls().iter().filter(|c| matches(*c)).count()
    }

    fn submits(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::SubmitReviews { .. }))
    }

    fn journal(&self) -> Vec<PathBuf> {
        let text = std::fs::read_to_string(self.history_path()).unwrap_or_default();
        let mut lines: Vec<PathBuf> = text.lines().map(PathBuf::from).collect();
        lines.sort();
        lines
    }
}

#[tokio::test]
async fn one_shot_scan_delivers_single_host_and_exits() {
    let fx = Fixture::new();
    let path = fx.write("test.cklb", "test");

    let reason = fx
        .pipeline(fx.config(true))
        .run(std::future::pending())
        .await;

    assert_eq!(reason, ExitReason::Success);
    assert_eq!(
        fx.count(|c| matches!(c, ApiCall::CreateAsset { name, .. } if name == "test")),
        1
    );
    assert_eq!(fx.submits(), 1);
    assert_eq!(fx.journal(), vec![path]);
}

#[tokio::test]
async fn burst_of_files_is_fully_delivered_in_batches() {
    let fx = Fixture::new();
    for n in 0..200 {
        fx.write(&format!("{:03}.cklb", n), &format!("host{:03}", n));
    }
    let mut config = fx.config(true);
    config.delivery.batch_size = 5;

    let reason = fx.pipeline(config).run(std::future::pending()).await;

    assert_eq!(reason, ExitReason::Success);
    assert_eq!(fx.submits(), 200);
    assert_eq!(fx.count(|c| matches!(c, ApiCall::ListAssets)), 40);
    assert_eq!(fx.journal().len(), 200);
}

#[tokio::test]
async fn restart_does_not_resubmit_recorded_files() {
    let fx = Fixture::new();
    fx.write("test.cklb", "test");
    fx.pipeline(fx.config(true)).run(std::future::pending()).await;
    fx.api.clear_calls();

    let reason = fx
        .pipeline(fx.config(true))
        .run(std::future::pending())
        .await;

    assert_eq!(reason, ExitReason::Success);
    assert_eq!(fx.submits(), 0);
}

#[tokio::test]
async fn outage_during_startup_recovers() {
    let fx = Fixture::new();
    fx.write("test.cklb", "test");
    fx.api.set_offline(true);

    let api = fx.api.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        api.set_offline(false);
    });
    let pipeline = fx.pipeline(fx.config(true));
    let alarm = pipeline.alarm();
    let reason = pipeline.run(std::future::pending()).await;

    assert_eq!(reason, ExitReason::Success);
    assert!(fx.count(|c| matches!(c, ApiCall::Probe)) >= 1);
    assert!(!alarm.is_raised(AlarmKind::ApiOffline));
    assert_eq!(fx.submits(), 1);
}

async fn eventually(what: &str, done: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn outage_mid_run_pauses_delivery_until_service_returns() {
    let fx = Fixture::new();
    fx.write("first.cklb", "first");
    let mut config = fx.config(false);
    config.discovery.scan_interval = Duration::from_millis(50);
    let pipeline = fx.pipeline(config);
    let alarm = pipeline.alarm();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let list_calls = || fx.count(|c| matches!(c, ApiCall::ListAssets));

    let operator = async {
        eventually("first delivery", || fx.submits() == 1).await;

        fx.api.set_offline(true);
        fx.write("second.cklb", "second");
        fx.write("third.cklb", "third");
        eventually("alarm", || alarm.is_raised(AlarmKind::ApiOffline)).await;

        // Paused: nothing but probes while the alarm is up
        let listed = list_calls();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(list_calls(), listed);
        assert_eq!(fx.submits(), 1);
        assert!(fx.count(|c| matches!(c, ApiCall::Probe)) >= 1);

        fx.api.set_offline(false);
        eventually("queued files", || fx.submits() == 3).await;
        assert!(!alarm.is_raised(AlarmKind::ApiOffline));
        let _ = stop_tx.send(());
    };
    let (reason, ()) = tokio::join!(
        pipeline.run(async {
            let _ = stop_rx.await;
        }),
        operator
    );

    assert_eq!(reason, ExitReason::Success);
    assert_eq!(fx.journal().len(), 3);
}

#[tokio::test]
async fn history_is_flushed_while_running() {
    let fx = Fixture::new();
    let path = fx.write("test.cklb", "test");
    let mut config = fx.config(false);
    config.history.flush_interval = Duration::from_millis(20);
    let pipeline = fx.pipeline(config);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let operator = async {
        // Still running, so the periodic flush wrote it and not the exit snapshot
        eventually("journal append", || fx.journal() == vec![path.clone()]).await;
        let _ = stop_tx.send(());
    };
    let (reason, ()) = tokio::join!(
        pipeline.run(async {
            let _ = stop_rx.await;
        }),
        operator
    );

    assert_eq!(reason, ExitReason::Success);
    assert_eq!(fx.journal(), vec![path]);
}

#[tokio::test]
async fn event_mode_does_not_grow_history() {
    let fx = Fixture::new();
    fx.write("test.cklb", "test");
    let mut config = fx.config(false);
    config.discovery.mode = DiscoveryMode::Events;
    config.discovery.add_existing = true;
    let pipeline = fx.pipeline(config);
    let history = pipeline.history();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let operator = async {
        eventually("delivery", || fx.submits() == 1).await;
        let _ = stop_tx.send(());
    };
    let (reason, ()) = tokio::join!(
        pipeline.run(async {
            let _ = stop_rx.await;
        }),
        operator
    );

    assert_eq!(reason, ExitReason::Success);
    assert!(history.lock().unwrap().is_empty());
    assert!(fx.journal().is_empty());
}

#[tokio::test]
async fn exhausted_retries_exit_with_fault_code() {
    let fx = Fixture::new();
    fx.write("test.cklb", "test");
    fx.api.set_offline(true);
    let mut config = fx.config(true);
    config.api_retry.bound = 2;

    let reason = fx.pipeline(config).run(std::future::pending()).await;

    assert_eq!(reason, ExitReason::Fault(AlarmKind::ApiOffline));
    assert_eq!(fx.count(|c| matches!(c, ApiCall::Probe)), 2);
    assert_eq!(fx.submits(), 0);
}

#[tokio::test]
async fn rejected_grant_is_terminal_by_default() {
    let fx = Fixture::new();
    fx.api.set_access_level(1);

    let reason = fx
        .pipeline(fx.config(true))
        .run(std::future::pending())
        .await;
    assert_eq!(reason.code(), 5);
}

#[tokio::test]
async fn preflight_data_error_is_init_failure() {
    let fx = Fixture::new();
    fx.api.set_auth_error(Some(ApiError::Status {
        status: 404,
        body: "no such collection".to_string(),
    }));

    let reason = fx
        .pipeline(fx.config(true))
        .run(std::future::pending())
        .await;
    assert_eq!(reason, ExitReason::InitFailure);
}

#[tokio::test]
async fn shutdown_stops_continuous_run_and_snapshots_history() {
    let fx = Fixture::new();
    let path = fx.write("test.cklb", "test");

    let reason = fx
        .pipeline(fx.config(false))
        .run(tokio::time::sleep(Duration::from_millis(300)))
        .await;

    assert_eq!(reason, ExitReason::Success);
    assert_eq!(fx.submits(), 1);
    assert_eq!(fx.journal(), vec![path]);
}

#[test]
fn missing_root_fails_before_anything_runs() {
    let fx = Fixture::new();
    let mut config = fx.config(true);
    config.discovery.root = fx.dir.path().join("absent");

    let result = Pipeline::new(config, fx.deps(FakeParser::new()));
    assert!(matches!(
        result,
        Err(EngineError::Config(ConfigError::BadRoot(_)))
    ));
    assert!(!fx.history_path().exists());
}

#[tokio::test]
async fn files_without_a_decoder_are_never_discovered() {
    let fx = Fixture::new();
    fx.write("legacy.ckl", "legacy");
    let json = fx.write("modern.cklb", "modern");
    let deps = fx.deps(FakeParser::only(&[FormatHint::Cklb]));

    let reason = Pipeline::new(fx.config(true), deps)
        .unwrap()
        .run(std::future::pending())
        .await;

    assert_eq!(reason, ExitReason::Success);
    assert_eq!(fx.submits(), 1);
    assert_eq!(
        fx.count(|c| matches!(c, ApiCall::CreateAsset { name, .. } if name == "legacy")),
        0
    );
    // Left unrecorded so a later decoder can still pick it up
    assert_eq!(fx.journal(), vec![json]);
}

#[test]
fn no_decodable_extension_is_a_config_error() {
    let fx = Fixture::new();
    let mut config = fx.config(true);
    config.discovery.extensions = vec!["ckl".to_string(), "xml".to_string()];

    let result = Pipeline::new(config, fx.deps(FakeParser::only(&[FormatHint::Cklb])));
    assert!(matches!(
        result,
        Err(EngineError::Config(ConfigError::NoDecoder(ref skipped))) if skipped.len() == 2
    ));
    assert!(!fx.history_path().exists());
}

#[test]
fn extension_list_is_narrowed_to_decodable_formats() {
    let mut extensions = vec!["CKL".to_string(), ".cklb".to_string(), "txt".to_string()];
    restrict_to_decodable(&mut extensions, &FakeParser::only(&[FormatHint::Cklb])).unwrap();
    assert_eq!(extensions, vec![".cklb"]);
}
