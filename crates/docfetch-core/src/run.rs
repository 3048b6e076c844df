//! One orchestrated run: dataset → queue → workers → reconcile → report → merge.
//!
//! Any [`RunError`] aborts the run; the status report and metadata merge are only
//! written after every queued entry has been reconciled.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DocfetchConfig;
use crate::dataset::load_dataset;
use crate::error::{create_dir, RunError};
use crate::fetch::Fetch;
use crate::metadata::{merge_metadata, read_store};
use crate::queue::{build_queue, existing_downloads, QueuePlan};
use crate::reconcile::{reconcile, Outcome, Status};
use crate::report::{status_records, write_status_report};
use crate::scheduler::run_batch;
use crate::worker::WorkerContext;

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub queued: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped_existing: usize,
    pub excluded_no_address: usize,
    /// Eligible entries left for a later run by the batch cap.
    pub deferred: usize,
    pub outcomes: Vec<Outcome>,
    pub status_report: PathBuf,
    pub metadata_output: PathBuf,
}

/// Builds this run's queue without creating directories or fetching anything.
pub fn plan(cfg: &DocfetchConfig) -> Result<QueuePlan, RunError> {
    let dataset = load_dataset(&cfg.dataset_path, &cfg.columns)?;
    let existing = existing_downloads(&cfg.destination_dir, cfg.extension())
        .map_err(|e| RunError::read("destination directory", &cfg.destination_dir, e))?;
    let plan = build_queue(&dataset.entries, &existing, cfg.batch_cap);
    tracing::debug!(
        entries = dataset.entries.len(),
        invalid_ids = dataset.invalid_identifiers,
        duplicate_ids = dataset.duplicate_identifiers,
        eligible = plan.eligible,
        queued = plan.queue.len(),
        "queue planned"
    );
    Ok(plan)
}

/// Runs one batch end to end with the given fetcher.
pub async fn run_once(cfg: &DocfetchConfig, fetcher: Arc<dyn Fetch>) -> Result<RunSummary, RunError> {
    let plan = plan(cfg)?;
    create_dir(&cfg.destination_dir)?;
    create_dir(&cfg.output_dir)?;

    let extension = cfg.extension().to_string();
    tracing::info!(
        queued = plan.queue.len(),
        skipped_existing = plan.skipped_existing,
        excluded_no_address = plan.excluded_no_address,
        deferred = plan.deferred(),
        "download queue built"
    );

    let ctx = Arc::new(WorkerContext {
        fetcher,
        destination: cfg.destination_dir.clone(),
        extension: extension.clone(),
    });
    let batch = run_batch(&plan.queue, ctx, &cfg.scheduler_options()).await?;

    let outcomes = reconcile(&plan.queue, &batch, &cfg.destination_dir, &extension);
    // Read before writing anything: a missing store must leave no report behind.
    let store = read_store(&cfg.metadata_path)?;
    let status_report = cfg.status_report_path();
    write_status_report(&status_report, &status_records(&outcomes))?;

    let downloaded_now = existing_downloads(&cfg.destination_dir, &extension)
        .map_err(|e| RunError::read("destination directory", &cfg.destination_dir, e))?;
    let metadata_output = cfg.metadata_output_path();
    merge_metadata(
        &store,
        &metadata_output,
        &plan.queue,
        &downloaded_now,
        &cfg.columns.id,
    )?;

    let downloaded = outcomes.iter().filter(|o| o.status == Status::Downloaded).count();
    let summary = RunSummary {
        queued: plan.queue.len(),
        downloaded,
        failed: outcomes.len() - downloaded,
        skipped_existing: plan.skipped_existing,
        excluded_no_address: plan.excluded_no_address,
        deferred: plan.deferred(),
        outcomes,
        status_report,
        metadata_output,
    };
    tracing::info!(
        queued = summary.queued,
        downloaded = summary.downloaded,
        failed = summary.failed,
        "run complete"
    );
    Ok(summary)
}
