//! Download queue construction: entry filter and batch selector.
//!
//! Nothing here touches the network or writes to disk; the only I/O is listing the
//! destination directory to learn which identifiers are already downloaded.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use crate::dataset::Entry;
use crate::identifier::Identifier;

/// Default maximum number of entries fetched per run.
pub const DEFAULT_BATCH_CAP: usize = 10;

/// Identifiers that already have `<id>.<ext>` in `dir`. A missing directory means nothing
/// has been downloaded yet.
pub fn existing_downloads(dir: &Path, extension: &str) -> io::Result<HashSet<Identifier>> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e),
    };

    let mut ids = HashSet::new();
    for dirent in read_dir {
        let dirent = dirent?;
        if !dirent.file_type()?.is_file() {
            continue;
        }
        let name = dirent.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(id) = Identifier::from_file_name(name, extension) {
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Result of filtering the dataset down to this run's queue.
#[derive(Debug, Clone, Default)]
pub struct QueuePlan {
    /// Entries to fetch this run, in dataset order, at most `batch_cap` long.
    pub queue: Vec<Entry>,
    /// Eligible entries before the batch cap was applied.
    pub eligible: usize,
    /// Entries with neither a primary nor a fallback address.
    pub excluded_no_address: usize,
    /// Entries whose destination file already exists.
    pub skipped_existing: usize,
}

impl QueuePlan {
    /// Eligible entries left for later runs because of the batch cap.
    pub fn deferred(&self) -> usize {
        self.eligible - self.queue.len()
    }
}

/// Entry filter: keeps entries that have an address and are not already downloaded.
pub fn filter_eligible(entries: &[Entry], existing: &HashSet<Identifier>) -> QueuePlan {
    let mut plan = QueuePlan::default();
    for entry in entries {
        if !entry.has_address() {
            plan.excluded_no_address += 1;
            continue;
        }
        if existing.contains(&entry.identifier) {
            plan.skipped_existing += 1;
            continue;
        }
        plan.queue.push(entry.clone());
    }
    plan.eligible = plan.queue.len();
    plan
}

/// Batch selector: keeps the first `cap` entries, preserving order.
pub fn select_batch(mut queue: Vec<Entry>, cap: usize) -> Vec<Entry> {
    queue.truncate(cap);
    queue
}

/// Filter then cap. `|queue| = min(eligible, cap)`.
pub fn build_queue(entries: &[Entry], existing: &HashSet<Identifier>, cap: usize) -> QueuePlan {
    let mut plan = filter_eligible(entries, existing);
    plan.queue = select_batch(std::mem::take(&mut plan.queue), cap);
    plan
}
