//! Status report: one `(Index, Status, Error)` row per queued entry.

use std::path::Path;

use crate::error::RunError;
use crate::reconcile::{Outcome, Status};
use crate::table::Table;

/// File name of the status report inside the output directory.
pub const STATUS_FILE_NAME: &str = "Download_Status.csv";

/// Column headers of the status report.
pub const STATUS_COLUMNS: [&str; 3] = ["Index", "Status", "Error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub identifier: String,
    pub status: Status,
    /// Empty for downloaded entries.
    pub error: String,
}

impl From<&Outcome> for StatusRecord {
    fn from(o: &Outcome) -> Self {
        Self {
            identifier: o.identifier.to_string(),
            status: o.status,
            error: o.error.as_ref().map(ToString::to_string).unwrap_or_default(),
        }
    }
}

pub fn status_records(outcomes: &[Outcome]) -> Vec<StatusRecord> {
    outcomes.iter().map(StatusRecord::from).collect()
}

/// Builds the three-column report table, preserving record order.
pub fn status_table(records: &[StatusRecord]) -> Table {
    let mut table = Table::new(STATUS_COLUMNS.iter().map(|c| c.to_string()).collect());
    table.rows = records
        .iter()
        .map(|r| vec![r.identifier.clone(), r.status.as_str().to_string(), r.error.clone()])
        .collect();
    table
}

/// Writes the report to `path`. Written even when `records` is empty.
pub fn write_status_report(path: &Path, records: &[StatusRecord]) -> Result<(), RunError> {
    status_table(records).write_atomic(path, "status report")?;
    tracing::info!("download status written to {}", path.display());
    Ok(())
}
