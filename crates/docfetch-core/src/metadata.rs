//! Metadata merger.
//!
//! Builds one record per processed entry, appends the records to the master store,
//! then drops earlier rows for the same identifier so the newest record wins.
//! Rows for identifiers outside the batch are left exactly as they were.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::dataset::Entry;
use crate::error::RunError;
use crate::identifier::Identifier;
use crate::table::Table;

/// Store column holding the `Yes`/`No` downloaded flag.
pub const DOWNLOADED_FLAG_COLUMN: &str = "pdf_downloaded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadedFlag {
    Yes,
    No,
}

impl DownloadedFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadedFlag::Yes => "Yes",
            DownloadedFlag::No => "No",
        }
    }
}

impl From<bool> for DownloadedFlag {
    fn from(downloaded: bool) -> Self {
        if downloaded {
            DownloadedFlag::Yes
        } else {
            DownloadedFlag::No
        }
    }
}

/// Row appended to the master store for one processed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub identifier: Identifier,
    pub pdf_downloaded: DownloadedFlag,
    /// Dataset columns that also exist in the store schema.
    pub fields: HashMap<String, String>,
}

/// One record per queued entry. The flag comes from `downloaded` (a post-run listing of the
/// destination directory), not from this run's outcomes.
pub fn build_records(
    queue: &[Entry],
    downloaded: &HashSet<Identifier>,
    store_headers: &[String],
    id_column: &str,
) -> Vec<MetadataRecord> {
    let schema: HashSet<&str> = store_headers
        .iter()
        .map(String::as_str)
        .filter(|h| *h != id_column && *h != DOWNLOADED_FLAG_COLUMN)
        .collect();

    queue
        .iter()
        .map(|entry| MetadataRecord {
            identifier: entry.identifier.clone(),
            pdf_downloaded: downloaded.contains(&entry.identifier).into(),
            fields: entry
                .extra
                .iter()
                .filter(|(k, _)| schema.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
        .collect()
}

/// Appends `records` to `store` and deduplicates by identifier, keeping the last row.
///
/// The identifier and flag columns are added to the schema if missing. Rows with an
/// empty identifier cell are never deduplicated.
pub fn merge_records(store: &Table, records: &[MetadataRecord], id_column: &str) -> Table {
    let mut merged = store.clone();
    let id_idx = merged.ensure_column(id_column);
    let flag_idx = merged.ensure_column(DOWNLOADED_FLAG_COLUMN);
    let width = merged.headers.len();

    for record in records {
        let mut row = vec![String::new(); width];
        for (i, header) in merged.headers.iter().enumerate() {
            if let Some(v) = record.fields.get(header) {
                row[i] = v.clone();
            }
        }
        row[id_idx] = record.identifier.to_string();
        row[flag_idx] = record.pdf_downloaded.as_str().to_string();
        merged.rows.push(row);
    }

    dedup_keep_last(&mut merged, id_idx);
    merged
}

fn dedup_keep_last(table: &mut Table, id_idx: usize) {
    let mut last: HashMap<String, usize> = HashMap::new();
    for (i, row) in table.rows.iter().enumerate() {
        let key = row[id_idx].trim();
        if !key.is_empty() {
            last.insert(key.to_string(), i);
        }
    }

    let mut i = 0;
    table.rows.retain(|row| {
        let key = row[id_idx].trim();
        let keep = key.is_empty() || last.get(key) == Some(&i);
        i += 1;
        keep
    });
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Records appended for this batch.
    pub appended: usize,
    /// Of those, how many are flagged `Yes`.
    pub downloaded: usize,
    /// Rows in the persisted store.
    pub rows: usize,
}

/// Reads the master metadata store.
pub fn read_store(store_path: &Path) -> Result<Table, RunError> {
    Table::read(store_path, "metadata store")
}

/// Merges this batch into `store` and persists the result to `output_path`
/// (which may be the store's own path).
pub fn merge_metadata(
    store: &Table,
    output_path: &Path,
    queue: &[Entry],
    downloaded: &HashSet<Identifier>,
    id_column: &str,
) -> Result<MergeSummary, RunError> {
    let records = build_records(queue, downloaded, &store.headers, id_column);
    let merged = merge_records(store, &records, id_column);
    merged.write_atomic(output_path, "metadata store")?;

    let summary = MergeSummary {
        appended: records.len(),
        downloaded: records
            .iter()
            .filter(|r| r.pdf_downloaded == DownloadedFlag::Yes)
            .count(),
        rows: merged.rows.len(),
    };
    tracing::info!(
        appended = summary.appended,
        rows = summary.rows,
        "metadata updated and saved to {}",
        output_path.display()
    );
    Ok(summary)
}
