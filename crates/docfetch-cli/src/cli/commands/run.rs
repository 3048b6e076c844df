//! `docfetch run` – fetch one batch and update the reports.

use anyhow::Result;
use docfetch_core::config::DocfetchConfig;
use docfetch_core::fetch::CurlFetcher;
use docfetch_core::reconcile::Status;
use docfetch_core::run;
use std::sync::Arc;
use std::time::Instant;

pub async fn run_batch(cfg: &DocfetchConfig) -> Result<()> {
    let started = Instant::now();
    let fetcher = Arc::new(CurlFetcher::new(cfg.curl_options()));
    let summary = run::run_once(cfg, fetcher).await?;

    for outcome in summary.outcomes.iter().filter(|o| o.status == Status::Failed) {
        if let Some(err) = &outcome.error {
            println!("  failed {}: {}", outcome.identifier, err);
        }
    }
    println!(
        "downloaded {}/{} in {:.1}s ({} already present, {} without address, {} deferred)",
        summary.downloaded,
        summary.queued,
        started.elapsed().as_secs_f64(),
        summary.skipped_existing,
        summary.excluded_no_address,
        summary.deferred
    );
    println!("status report: {}", summary.status_report.display());
    println!("metadata:      {}", summary.metadata_output.display());
    Ok(())
}
