//! Dataset rows as typed entries.

use std::collections::HashSet;
use std::path::Path;

use crate::config::ColumnNames;
use crate::error::RunError;
use crate::identifier::Identifier;
use crate::table::{non_empty, Table};

/// One dataset row: identifier, candidate addresses, and the remaining columns
/// carried through unmodified for the metadata merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub identifier: Identifier,
    pub primary: Option<String>,
    pub fallback: Option<String>,
    /// Every non-identifier column of the row as `(header, value)`, in dataset column order.
    pub extra: Vec<(String, String)>,
}

impl Entry {
    /// Address to fetch: primary if present, else fallback.
    pub fn address(&self) -> Option<&str> {
        self.primary.as_deref().or(self.fallback.as_deref())
    }

    pub fn has_address(&self) -> bool {
        self.address().is_some()
    }

    /// Value of the extra column `header`, if the dataset has it.
    pub fn extra_field(&self, header: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }
}

/// Parsed dataset plus counts of rows that could not become entries.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub entries: Vec<Entry>,
    pub invalid_identifiers: usize,
    pub duplicate_identifiers: usize,
}

/// Reads the dataset CSV at `path` and converts it into entries.
pub fn load_dataset(path: &Path, columns: &ColumnNames) -> Result<Dataset, RunError> {
    let table = Table::read(path, "dataset")?;
    entries_from_table(&table, columns, path)
}

/// Converts dataset rows into entries, in dataset order.
///
/// Rows with an unusable identifier are dropped; for duplicate identifiers the first row wins.
/// Missing address columns are treated as all-null.
pub fn entries_from_table(
    table: &Table,
    columns: &ColumnNames,
    path: &Path,
) -> Result<Dataset, RunError> {
    let id_col = table.column(&columns.id).ok_or_else(|| RunError::MissingColumn {
        what: "dataset",
        path: path.to_path_buf(),
        column: columns.id.clone(),
    })?;
    let primary_col = table.column(&columns.primary_url);
    let fallback_col = table.column(&columns.fallback_url);
    if primary_col.is_none() && fallback_col.is_none() {
        tracing::warn!(
            "dataset {} has neither `{}` nor `{}`; no entry is downloadable",
            path.display(),
            columns.primary_url,
            columns.fallback_url
        );
    }

    let mut dataset = Dataset::default();
    let mut seen: HashSet<Identifier> = HashSet::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let Some(identifier) = Identifier::parse(&row[id_col]) else {
            if !row[id_col].trim().is_empty() {
                tracing::warn!(row = row_idx + 1, raw = %row[id_col], "identifier is not filesystem-safe; row skipped");
            }
            dataset.invalid_identifiers += 1;
            continue;
        };
        if !seen.insert(identifier.clone()) {
            tracing::warn!(id = %identifier, row = row_idx + 1, "duplicate identifier; keeping first row");
            dataset.duplicate_identifiers += 1;
            continue;
        }

        let cell = |col: Option<usize>| col.and_then(|c| non_empty(&row[c])).map(str::to_string);
        let extra = table
            .headers
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(i, _)| *i != id_col)
            .map(|(_, (h, v))| (h.clone(), v.clone()))
            .collect();

        dataset.entries.push(Entry {
            identifier,
            primary: cell(primary_col),
            fallback: cell(fallback_col),
            extra,
        });
    }

    Ok(dataset)
}
