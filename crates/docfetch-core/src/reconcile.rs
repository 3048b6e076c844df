//! Outcome reconciliation.
//!
//! The destination file is the source of truth: a worker's own success flag is
//! only used to explain a failure, never to claim a download.

use std::fmt;
use std::path::Path;

use crate::dataset::Entry;
use crate::fetch::ErrorDetail;
use crate::identifier::Identifier;
use crate::scheduler::BatchReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Downloaded,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Downloaded => "Downloaded",
            Status::Failed => "Failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result for one queued entry. `Downloaded` iff the destination file existed
/// at reconciliation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub identifier: Identifier,
    pub status: Status,
    pub error: Option<ErrorDetail>,
}

/// Determines each queued entry's status from the filesystem, in queue order.
///
/// Missing files take their error from the per-identifier map in `batch`; if the worker
/// recorded none (e.g. it reported success but the file is gone) the detail is "File not found".
pub fn reconcile(queue: &[Entry], batch: &BatchReport, destination: &Path, extension: &str) -> Vec<Outcome> {
    queue
        .iter()
        .map(|entry| {
            let id = &entry.identifier;
            let path = destination.join(id.file_name(extension));
            if path.is_file() {
                if let Some(err) = batch.error_for(id) {
                    tracing::warn!(id = %id, "worker reported `{}` but {} exists; counting as downloaded", err, path.display());
                }
                Outcome {
                    identifier: id.clone(),
                    status: Status::Downloaded,
                    error: None,
                }
            } else {
                let error = match batch.error_for(id) {
                    Some(err) => err.clone(),
                    None => {
                        if batch.get(id).is_some_and(|r| r.result.is_ok()) {
                            tracing::warn!(id = %id, "worker reported success but {} is missing", path.display());
                        }
                        ErrorDetail::file_not_found()
                    }
                };
                Outcome {
                    identifier: id.clone(),
                    status: Status::Failed,
                    error: Some(error),
                }
            }
        })
        .collect()
}
