// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline orchestration
//!
//! Owns the alarm, History and the queues, wires
//! discovery -> parse -> delivery, and decides the exit reason.

use crate::cargo::CargoQueue;
use crate::delivery::Delivery;
use crate::error::EngineError;
use crate::filter::FileFilter;
use crate::monitor::{monitors, run_monitor, Prober};
use crate::parse::ParseStage;
use crate::preflight::Preflight;
use crate::scan::ScanDiscovery;
use crate::watch::EventDiscovery;
use crate::SharedHistory;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sw_adapters::{ChecklistParser, ComplianceApi, FormatHint, TokenProvider};
use sw_core::{
    Alarm, AlarmEvent, AlarmReceiver, ConfigError, DiscoveryMode, ExitReason, PipelineConfig,
};
use sw_storage::History;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

/// External collaborators the pipeline talks to
#[derive(Clone)]
pub struct PipelineDeps<A, T, P> {
    pub api: A,
    pub tokens: T,
    pub parser: P,
}

pub struct Pipeline<A, T, P> {
    config: PipelineConfig,
    deps: PipelineDeps<A, T, P>,
    filter: FileFilter,
    history: SharedHistory,
    /// Held across every journal write so writes never interleave
    journal: JournalLock,
    alarm: Alarm,
}

type JournalLock = Arc<tokio::sync::Mutex<()>>;

impl<A, T, P> Pipeline<A, T, P>
where
    A: ComplianceApi,
    T: TokenProvider,
    P: ChecklistParser,
{
    /// Validate configuration and load History. Nothing runs yet.
    pub fn new(mut config: PipelineConfig, deps: PipelineDeps<A, T, P>) -> Result<Self, EngineError> {
        config.validate()?;
        let root = config.discovery.root.clone();
        config.discovery.root =
            std::fs::canonicalize(&root).map_err(|_| ConfigError::BadRoot(root))?;

        restrict_to_decodable(&mut config.discovery.extensions, &deps.parser)?;
        let filter = FileFilter::new(&config.discovery)?;
        let history = History::load(&config.history.path)?;
        tracing::info!(
            path = %config.history.path.display(),
            entries = history.len(),
            "history loaded"
        );

        Ok(Self {
            config,
            deps,
            filter,
            history: Arc::new(Mutex::new(history)),
            journal: JournalLock::default(),
            alarm: Alarm::new(),
        })
    }

    pub fn alarm(&self) -> Alarm {
        self.alarm.clone()
    }

    pub fn history(&self) -> SharedHistory {
        Arc::clone(&self.history)
    }

    /// Run until a one-shot drain completes, `shutdown` resolves, or a fault
    /// exhausts its retry budget. History is snapshotted on every exit path.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> ExitReason {
        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
        let mut background = JoinSet::new();

        background.spawn(log_alarms(self.alarm.subscribe()));
        let prober = Prober::new(
            self.deps.api.clone(),
            self.deps.tokens.clone(),
            self.alarm.clone(),
            self.config.delivery.collection_id.clone(),
        );
        for monitor in monitors(&self.config) {
            background.spawn(run_monitor(
                monitor,
                self.alarm.clone(),
                prober.clone(),
                exit_tx.clone(),
            ));
        }
        background.spawn(flush_history(
            self.history(),
            Arc::clone(&self.journal),
            self.config.history.flush_interval,
        ));

        let reason = tokio::select! {
            Some(reason) = exit_rx.recv() => reason,
            _ = shutdown => {
                tracing::info!("shutdown requested");
                ExitReason::Success
            }
            reason = self.drive() => reason,
        };
        background.shutdown().await;

        // An aborted flush may still be writing on a blocking thread
        let _writing = self.journal.lock().await;
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = history.snapshot_to_disk() {
            tracing::error!(error = %e, "failed to write history snapshot");
        }
        tracing::info!(code = reason.code(), entries = history.len(), "stopped: {}", reason);
        reason
    }

    async fn drive(&self) -> ExitReason {
        let preflight = Preflight::new(
            self.deps.api.clone(),
            self.deps.tokens.clone(),
            self.alarm.clone(),
            self.config.delivery.collection_id.clone(),
        );
        let import = match preflight.run().await {
            Ok(import) => Arc::new(import),
            Err(e) => {
                tracing::error!(error = %e, "startup failed");
                return ExitReason::InitFailure;
            }
        };

        let discovery = &self.config.discovery;
        let delivery = &self.config.delivery;
        let cargo = CargoQueue::new(delivery.high_water_mark());
        // Only scan discovery consults History; event mode would grow it without bound
        let checkpoint = (discovery.mode == DiscoveryMode::Scan).then(|| self.history());
        let (candidates_tx, candidates_rx) = mpsc::channel(delivery.parse_concurrency);

        // Dropping the set aborts every stage
        let mut stages: JoinSet<Result<(), EngineError>> = JoinSet::new();
        match discovery.mode {
            DiscoveryMode::Scan => {
                let scan = ScanDiscovery::new(
                    self.filter.clone(),
                    self.history(),
                    self.alarm.clone(),
                    discovery.scan_interval,
                    discovery.one_shot,
                );
                stages.spawn(async move {
                    scan.run(candidates_tx).await;
                    Ok(())
                });
            }
            DiscoveryMode::Events => {
                let events = EventDiscovery::new(
                    self.filter.clone(),
                    self.alarm.clone(),
                    discovery.add_existing,
                    discovery.use_polling,
                    discovery.scan_interval,
                    discovery.stability_threshold,
                );
                stages.spawn(events.run(candidates_tx));
            }
        }

        let parse = ParseStage::new(
            self.deps.parser.clone(),
            import,
            cargo.clone(),
            checkpoint.clone(),
            self.alarm.clone(),
            delivery.parse_concurrency,
        );
        stages.spawn(async move {
            parse.run(candidates_rx).await;
            Ok(())
        });

        let batch_delay = (!discovery.one_shot).then_some(delivery.batch_delay);
        let consumer = Delivery::new(
            self.deps.api.clone(),
            delivery.collection_id.clone(),
            delivery.create_objects,
            delivery.strict_revision_check,
            checkpoint,
            self.alarm.clone(),
        )
        .run(cargo, delivery.batch_size, batch_delay);
        tokio::pin!(consumer);

        tracing::info!(
            root = %discovery.root.display(),
            mode = ?discovery.mode,
            one_shot = discovery.one_shot,
            "pipeline started"
        );

        loop {
            tokio::select! {
                totals = &mut consumer => {
                    tracing::info!(
                        batches = totals.batches,
                        failed_batches = totals.failed_batches,
                        results = totals.results,
                        assets_created = totals.assets_created,
                        inserted = totals.reviews_inserted,
                        updated = totals.reviews_updated,
                        "drain complete"
                    );
                    return ExitReason::Success;
                }
                Some(joined) = stages.join_next() => match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "discovery failed");
                        return ExitReason::InitFailure;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "pipeline stage failed");
                        return ExitReason::InitFailure;
                    }
                },
            }
        }
    }
}

/// Drop extensions the decoder cannot handle so their files are never
/// discovered, instead of being recorded as undecodable
fn restrict_to_decodable<P: ChecklistParser>(
    extensions: &mut Vec<String>,
    parser: &P,
) -> Result<(), ConfigError> {
    let (decodable, skipped): (Vec<String>, Vec<String>) =
        std::mem::take(extensions).into_iter().partition(|ext| {
            FormatHint::from_extension(ext).is_some_and(|hint| parser.supports(hint))
        });
    if decodable.is_empty() {
        return Err(ConfigError::NoDecoder(skipped));
    }
    if !skipped.is_empty() {
        tracing::warn!(extensions = ?skipped, "no decoder for these extensions, not watching them");
    }
    *extensions = decodable;
    Ok(())
}

async fn log_alarms(mut events: AlarmReceiver) {
    while let Some(event) = events.recv().await {
        match event {
            AlarmEvent::Raised(kind) => tracing::warn!(alarm = %kind, "alarm raised, pipeline paused"),
            AlarmEvent::Lowered(kind) => tracing::info!(alarm = %kind, "alarm lowered"),
        }
    }
}

async fn flush_history(history: SharedHistory, journal: JournalLock, every: Duration) {
    let mut tick = tokio::time::interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick.tick().await;
    loop {
        tick.tick().await;
        let writing = Arc::clone(&journal).lock_owned().await;
        let pending = history.lock().unwrap_or_else(|e| e.into_inner()).take_pending();
        let Some(write) = pending else {
            continue;
        };

        let applied = tokio::task::spawn_blocking(move || {
            let _writing = writing;
            let result = write.apply();
            (write, result)
        })
        .await;
        match applied {
            Ok((_, Ok(()))) => {}
            Ok((write, Err(e))) => {
                tracing::warn!(
                    error = %e,
                    rewrite = write.is_rewrite(),
                    lines = write.len(),
                    "history flush failed"
                );
                history.lock().unwrap_or_else(|e| e.into_inner()).restore(write);
            }
            Err(e) => {
                // The final snapshot rewrites everything regardless
                tracing::warn!(error = %e, "history flush task failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
