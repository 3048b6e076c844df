//! Concurrency scheduler.
//!
//! Keeps up to `concurrency_limit` workers in flight at once; when one finishes,
//! the next queued entry is started immediately. Each worker runs in
//! `spawn_blocking` (curl is blocking) and is wrapped in a supervising task that
//! enforces the time budget and turns panics into failed reports. Reports are
//! gathered by this single collector and keyed by identifier, so no shared
//! mutable list is touched from worker threads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::dataset::Entry;
use crate::error::{create_dir, RunError};
use crate::fetch::{ErrorDetail, ErrorKind};
use crate::identifier::Identifier;
use crate::worker::{run_worker, WorkerContext, WorkerReport};

/// Default maximum number of simultaneous downloads.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Extra time the supervisor allows past the fetcher's own timeout before abandoning a worker.
pub const DEFAULT_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum worker threads alive at once, including workers abandoned after a
    /// timeout. Clamped to at least 1.
    pub concurrency_limit: usize,
    /// Per-worker time budget.
    pub worker_timeout: Duration,
    /// Added to `worker_timeout` for the supervisor backstop.
    pub timeout_grace: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            worker_timeout: Duration::from_secs(300),
            timeout_grace: DEFAULT_TIMEOUT_GRACE,
        }
    }
}

/// One report per queued identifier, collected after every worker has finished.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub reports: HashMap<Identifier, WorkerReport>,
}

impl BatchReport {
    pub fn get(&self, id: &Identifier) -> Option<&WorkerReport> {
        self.reports.get(id)
    }

    /// Error recorded for `id` during the run, if any.
    pub fn error_for(&self, id: &Identifier) -> Option<&ErrorDetail> {
        self.reports.get(id).and_then(WorkerReport::error)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Runs every entry in `queue` through a worker, at most `concurrency_limit` at a time,
/// and returns only after all of them have reported.
///
/// Fails only if the destination directory cannot be created; per-entry failures are data.
pub async fn run_batch(
    queue: &[Entry],
    ctx: Arc<WorkerContext>,
    opts: &SchedulerOptions,
) -> Result<BatchReport, RunError> {
    create_dir(&ctx.destination)?;

    let limit = opts
        .concurrency_limit
        .clamp(1, Semaphore::MAX_PERMITS.min(u32::MAX as usize));
    let total = queue.len();
    let budget = opts.worker_timeout;
    let backstop = opts.worker_timeout + opts.timeout_grace;

    tracing::info!(total, limit, "starting download of {} entries", total);

    // A permit is held by the blocking thread itself, so a worker abandoned by the
    // backstop keeps its slot until its thread actually returns.
    let slots = Arc::new(Semaphore::new(limit));
    let mut pending = queue.iter();
    let mut join_set = JoinSet::new();
    let mut reports: HashMap<Identifier, WorkerReport> = HashMap::with_capacity(total);

    loop {
        while join_set.len() < limit {
            let Some(entry) = pending.next() else {
                break;
            };
            let permit = match Arc::clone(&slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("worker slots closed: {}", e);
                    break;
                }
            };
            join_set.spawn(supervise(entry.clone(), Arc::clone(&ctx), permit, budget, backstop));
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        match joined {
            Ok(report) => {
                let done = reports.len() + 1;
                match &report.result {
                    Ok(bytes) => tracing::info!(id = %report.identifier, bytes, "[{}/{}] finished", done, total),
                    Err(e) => tracing::info!(id = %report.identifier, "[{}/{}] failed: {}", done, total, e),
                }
                reports.insert(report.identifier.clone(), report);
            }
            // The supervisor never panics; this only happens if the runtime cancels the task.
            Err(e) => tracing::error!("worker task join: {}", e),
        }
    }

    // Barrier: abandoned workers must be gone before anyone looks at the destination.
    if let Err(e) = slots.acquire_many(limit as u32).await {
        tracing::error!("worker slots closed: {}", e);
    }

    for entry in queue {
        reports.entry(entry.identifier.clone()).or_insert_with(|| {
            tracing::error!(id = %entry.identifier, "worker produced no report");
            WorkerReport::failed(
                entry.identifier.clone(),
                ErrorDetail::new(ErrorKind::Other, "worker produced no report", None),
            )
        });
    }

    tracing::info!("all downloads finished");
    Ok(BatchReport { reports })
}

/// Runs one worker on the blocking pool and converts join errors and overruns into reports.
/// `permit` moves into the blocking closure and is released when the thread returns.
async fn supervise(
    entry: Entry,
    ctx: Arc<WorkerContext>,
    permit: OwnedSemaphorePermit,
    budget: Duration,
    backstop: Duration,
) -> WorkerReport {
    let id = entry.identifier.clone();
    let abort = Arc::new(AtomicBool::new(false));
    let worker_abort = Arc::clone(&abort);
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        run_worker(&entry, &ctx, &worker_abort)
    });

    match tokio::time::timeout(backstop, handle).await {
        Ok(Ok(report)) => report,
        Ok(Err(join_err)) => {
            tracing::error!(id = %id, "worker panicked: {}", join_err);
            WorkerReport::failed(id, ErrorDetail::panicked(join_err))
        }
        Err(_) => {
            // The blocking thread keeps running until it observes the token; it will
            // discard its temp file instead of renaming it.
            abort.store(true, Ordering::Release);
            tracing::warn!(id = %id, "worker exceeded {}s; abandoned", budget.as_secs());
            WorkerReport::failed(id, ErrorDetail::timed_out(budget))
        }
    }
}
