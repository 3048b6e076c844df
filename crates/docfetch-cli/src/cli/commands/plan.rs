//! `docfetch plan` – show the next batch without fetching.

use anyhow::Result;
use docfetch_core::config::DocfetchConfig;
use docfetch_core::run;

pub fn run_plan(cfg: &DocfetchConfig) -> Result<()> {
    let plan = run::plan(cfg)?;

    if plan.queue.is_empty() {
        println!("nothing to download");
    } else {
        println!("{:<24} {}", "ID", "ADDRESS");
        for entry in &plan.queue {
            println!("{:<24} {}", entry.identifier, entry.address().unwrap_or("-"));
        }
    }
    println!(
        "queued {}, already downloaded {}, no address {}, deferred {}",
        plan.queue.len(),
        plan.skipped_existing,
        plan.excluded_no_address,
        plan.deferred()
    );
    Ok(())
}
