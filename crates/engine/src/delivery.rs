// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch delivery against one snapshot of remote state
//!
//! Batches run strictly one at a time. Each begins with a fresh asset and
//! installed-benchmark snapshot that is never reused by a later batch.

use crate::cargo::CargoQueue;
use crate::SharedHistory;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use sw_adapters::{ApiError, Asset, ComplianceApi, CreateOutcome, InstalledBenchmark, NewAsset};
use sw_core::{Alarm, AlarmKind, Checklist, ParsedResult, Review};
use tracing::Instrument;
use uuid::Uuid;

/// Counts for one delivered batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub results: usize,
    pub tasks: usize,
    pub assets_created: usize,
    pub stigs_assigned: usize,
    pub reviews_inserted: u32,
    pub reviews_updated: u32,
    pub reviews_rejected: u32,
    pub tasks_skipped: usize,
    pub tasks_failed: usize,
    pub checklists_ignored: usize,
}

/// A batch cut short by a connectivity fault
#[derive(Debug)]
pub struct BatchFailure {
    pub alarm: AlarmKind,
    pub error: ApiError,
    /// Results whose tasks had not reached a terminal outcome, in batch order
    pub undelivered: Vec<ParsedResult>,
    pub report: BatchReport,
}

/// Totals across every batch of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryTotals {
    pub batches: usize,
    pub failed_batches: usize,
    pub results: usize,
    pub assets_created: usize,
    pub reviews_inserted: u32,
    pub reviews_updated: u32,
}

impl DeliveryTotals {
    fn record(&mut self, report: &BatchReport) {
        self.batches += 1;
        self.results += report.results;
        self.assets_created += report.assets_created;
        self.reviews_inserted += report.reviews_inserted;
        self.reviews_updated += report.reviews_updated;
    }
}

/// All results for one target asset within a batch
#[derive(Debug)]
pub(crate) struct AssetTask {
    pub key: String,
    pub results: Vec<ParsedResult>,
    /// Matching remote record from the batch snapshot
    pub asset: Option<Asset>,
    /// Submittable checklists per benchmark, in arrival order
    pub checklists: BTreeMap<String, Vec<Checklist>>,
}

impl AssetTask {
    fn known_asset(&self) -> bool {
        self.asset.is_some()
    }

    pub fn benchmark_ids(&self) -> Vec<String> {
        self.checklists.keys().cloned().collect()
    }

    /// Reviews from the latest checklist of each benchmark
    pub fn reviews(&self) -> Vec<Review> {
        self.checklists
            .values()
            .filter_map(|list| list.last())
            .flat_map(|c| c.reviews.iter().cloned())
            .collect()
    }

    fn sources(&self) -> impl Iterator<Item = &PathBuf> {
        self.results.iter().map(|r| &r.source_ref)
    }

    fn new_asset(&self, collection_id: &str) -> NewAsset {
        // Target properties come from the most recent result
        let target = self
            .results
            .last()
            .map(|r| r.target.clone())
            .unwrap_or_default();
        NewAsset {
            name: target.name,
            collection_id: collection_id.to_string(),
            fqdn: target.fqdn,
            ip: target.ip,
            mac: target.mac,
            noncomputing: target.noncomputing,
            metadata: target.metadata,
            benchmark_ids: self.benchmark_ids(),
        }
    }
}

/// Group a batch by target name and drop checklists the service cannot accept.
/// Returns the tasks in first-seen order and the number of ignored checklists.
pub(crate) fn build_tasks(
    batch: Vec<ParsedResult>,
    assets: &[Asset],
    installed: &[InstalledBenchmark],
    strict_revision_check: bool,
) -> (Vec<AssetTask>, usize) {
    let by_name: HashMap<String, &Asset> =
        assets.iter().map(|a| (a.name.to_lowercase(), a)).collect();
    let installed: HashMap<&str, &InstalledBenchmark> = installed
        .iter()
        .map(|b| (b.benchmark_id.as_str(), b))
        .collect();

    let mut tasks: Vec<AssetTask> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut ignored = 0;

    for result in batch {
        let key = result.asset_key();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            tasks.push(AssetTask {
                asset: by_name.get(&key).map(|a| (*a).clone()),
                key: key.clone(),
                results: Vec::new(),
                checklists: BTreeMap::new(),
            });
            tasks.len() - 1
        });
        let task = &mut tasks[slot];

        for checklist in &result.checklists {
            let accepted = installed.get(checklist.benchmark_id.as_str()).is_some_and(|b| {
                !strict_revision_check || b.revision_strs.contains(&checklist.revision_str)
            });
            if !accepted {
                tracing::info!(
                    path = %result.source_ref.display(),
                    benchmark_id = %checklist.benchmark_id,
                    revision = %checklist.revision_str,
                    "checklist ignored, not installed"
                );
                ignored += 1;
                continue;
            }
            task.checklists
                .entry(checklist.benchmark_id.clone())
                .or_default()
                .push(checklist.clone());
        }
        task.results.push(result);
    }

    (tasks, ignored)
}

enum TaskOutcome {
    Submitted,
    NoReviews,
    Skipped,
}

#[derive(Clone)]
pub struct Delivery<A> {
    api: A,
    collection_id: String,
    create_objects: bool,
    strict_revision_check: bool,
    /// Delivered paths land here when discovery checkpoints against History
    history: Option<SharedHistory>,
    alarm: Alarm,
}

impl<A: ComplianceApi> Delivery<A> {
    pub fn new(
        api: A,
        collection_id: impl Into<String>,
        create_objects: bool,
        strict_revision_check: bool,
        history: Option<SharedHistory>,
        alarm: Alarm,
    ) -> Self {
        Self {
            api,
            collection_id: collection_id.into(),
            create_objects,
            strict_revision_check,
            history,
            alarm,
        }
    }

    fn record_history<'a>(&self, paths: impl IntoIterator<Item = &'a PathBuf>) {
        if let Some(history) = &self.history {
            history
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .add_all(paths.into_iter().cloned());
        }
    }

    /// Drain the cargo queue one batch at a time until it is closed and empty.
    /// Without a delay a partial batch is released only once input ends.
    pub async fn run(
        self,
        cargo: CargoQueue,
        batch_size: usize,
        delay: Option<Duration>,
    ) -> DeliveryTotals {
        let mut totals = DeliveryTotals::default();
        loop {
            self.alarm.wait_clear().await;
            let Some(batch) = cargo.next_batch(batch_size, delay).await else {
                break;
            };
            if self.alarm.state().any() {
                // Raised while the batch was filling
                cargo.restore_front(batch);
                continue;
            }

            match self.deliver(batch).await {
                Ok(report) => totals.record(&report),
                Err(failure) => {
                    totals.failed_batches += 1;
                    tracing::warn!(
                        batch_id = %failure.report.batch_id,
                        alarm = %failure.alarm,
                        error = %failure.error,
                        requeued = failure.undelivered.len(),
                        "batch interrupted"
                    );
                    cargo.restore_front(failure.undelivered);
                }
            }
        }
        tracing::debug!(batches = totals.batches, "delivery stopped");
        totals
    }

    /// Deliver one batch. A connectivity fault raises the alarm and hands back
    /// the results that still need delivery.
    pub async fn deliver(&self, batch: Vec<ParsedResult>) -> Result<BatchReport, BatchFailure> {
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", %batch_id);
        self.deliver_inner(batch_id, batch).instrument(span).await
    }

    async fn deliver_inner(
        &self,
        batch_id: Uuid,
        batch: Vec<ParsedResult>,
    ) -> Result<BatchReport, BatchFailure> {
        let start = Instant::now();
        let mut report = BatchReport {
            batch_id,
            results: batch.len(),
            ..BatchReport::default()
        };
        tracing::info!(results = batch.len(), "batch started");

        let snapshot = tokio::try_join!(
            self.api.list_assets(&self.collection_id),
            self.api.list_installed_benchmarks(),
        );
        let (assets, installed) = match snapshot {
            Ok(snapshot) => snapshot,
            Err(error) => {
                if let Some(alarm) = error.alarm() {
                    self.alarm.raise(alarm);
                    return Err(BatchFailure {
                        alarm,
                        error,
                        undelivered: batch,
                        report,
                    });
                }
                tracing::error!(error = %error, "snapshot fetch failed, batch dropped");
                self.record_history(batch.iter().map(|r| &r.source_ref));
                report.tasks_failed = batch.len();
                return Ok(report);
            }
        };

        let (tasks, ignored) = build_tasks(batch, &assets, &installed, self.strict_revision_check);
        report.tasks = tasks.len();
        report.checklists_ignored = ignored;

        let mut tasks = tasks.into_iter();
        while let Some(task) = tasks.next() {
            match self.deliver_task(&task, &mut report).await {
                Ok(TaskOutcome::Skipped) => {
                    report.tasks_skipped += 1;
                    tracing::info!(asset = %task.key, "unknown asset skipped, creation disabled");
                }
                Ok(TaskOutcome::NoReviews) => {
                    tracing::info!(asset = %task.key, "no reviews to submit");
                }
                Ok(TaskOutcome::Submitted) => {}
                Err(error) => match error.alarm() {
                    Some(alarm) => {
                        self.alarm.raise(alarm);
                        let undelivered = std::iter::once(task)
                            .chain(tasks)
                            .flat_map(|t| t.results)
                            .collect();
                        return Err(BatchFailure {
                            alarm,
                            error,
                            undelivered,
                            report,
                        });
                    }
                    None => {
                        report.tasks_failed += 1;
                        tracing::warn!(asset = %task.key, error = %error, "task failed");
                    }
                },
            }
            self.record_history(task.sources());
        }

        tracing::info!(
            tasks = report.tasks,
            assets_created = report.assets_created,
            stigs_assigned = report.stigs_assigned,
            inserted = report.reviews_inserted,
            updated = report.reviews_updated,
            rejected = report.reviews_rejected,
            skipped = report.tasks_skipped,
            failed = report.tasks_failed,
            ignored = report.checklists_ignored,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch delivered"
        );
        Ok(report)
    }

    async fn deliver_task(
        &self,
        task: &AssetTask,
        report: &mut BatchReport,
    ) -> Result<TaskOutcome, ApiError> {
        let asset = match &task.asset {
            Some(asset) => asset.clone(),
            None if !self.create_objects => return Ok(TaskOutcome::Skipped),
            None => match self
                .api
                .create_or_get_asset(&task.new_asset(&self.collection_id))
                .await?
            {
                CreateOutcome::Created(asset) => {
                    report.assets_created += 1;
                    asset
                }
                CreateOutcome::Existing(asset) => {
                    tracing::debug!(asset = %task.key, "asset created concurrently, using existing");
                    asset
                }
            },
        };

        let missing: Vec<String> = task
            .benchmark_ids()
            .into_iter()
            .filter(|b| !asset.benchmark_ids.contains(b))
            .collect();
        if !missing.is_empty() {
            let mut assigned = asset.benchmark_ids.clone();
            assigned.extend(missing.iter().cloned());
            self.api
                .patch_asset_stigs(&self.collection_id, &asset.asset_id, &assigned)
                .await?;
            report.stigs_assigned += missing.len();
            tracing::debug!(
                asset = %task.key,
                known = task.known_asset(),
                added = ?missing,
                "benchmarks assigned"
            );
        }

        let reviews = task.reviews();
        if reviews.is_empty() {
            return Ok(TaskOutcome::NoReviews);
        }
        let summary = self
            .api
            .submit_reviews(&self.collection_id, &asset.asset_id, &reviews)
            .await?;
        report.reviews_inserted += summary.inserted;
        report.reviews_updated += summary.updated;
        report.reviews_rejected += summary.rejected;
        Ok(TaskOutcome::Submitted)
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
