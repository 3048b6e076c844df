//! Header-addressed CSV tables.
//!
//! Used for the input dataset, the master metadata store and the status report.
//! Writes go through a temp file in the target directory and are renamed into place,
//! so an interrupted run never leaves a truncated store behind.

use std::io::Write;
use std::path::Path;

use crate::error::RunError;

/// In-memory table: one header row plus string cells. Rows always have `headers.len()` cells;
/// an empty cell is treated as null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Reads a CSV file with a header row. Short rows are padded with empty cells,
    /// overlong rows are truncated to the header width.
    pub fn read(path: &Path, what: &'static str) -> Result<Self, RunError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| RunError::read(what, path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| RunError::read(what, path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| RunError::read(what, path, e))?;
            if record.len() > width {
                tracing::warn!(
                    line = ?record.position().map(|p| p.line()),
                    "{}: row has {} cells, header has {}; extra cells dropped",
                    path.display(),
                    record.len(),
                    width
                );
            }
            let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Index of the column named `name` (exact match after trimming headers).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Appends `name` as a new column (empty in existing rows) unless already present.
    /// Returns its index.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Writes the table to `path` atomically (temp file in the same directory, then rename).
    pub fn write_atomic(&self, path: &Path, what: &'static str) -> Result<(), RunError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| RunError::write(what, path, e))?;
        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            writer
                .write_record(&self.headers)
                .map_err(|e| RunError::write(what, path, e))?;
            for row in &self.rows {
                writer
                    .write_record(row)
                    .map_err(|e| RunError::write(what, path, e))?;
            }
            writer.flush().map_err(|e| RunError::write(what, path, e))?;
        }
        tmp.flush().map_err(|e| RunError::write(what, path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| RunError::write(what, path, e))?;
        tmp.persist(path).map_err(|e| RunError::write(what, path, e.error))?;
        Ok(())
    }
}

/// Returns the trimmed cell, or `None` when it is empty (null).
pub fn non_empty(cell: &str) -> Option<&str> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_pads_short_rows_and_trims_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, " BRnum ,Pdf_URL,Year\nA,http://x/a,2019\nB\n").unwrap();

        let table = Table::read(&path, "dataset").unwrap();
        assert_eq!(table.headers, vec!["BRnum", "Pdf_URL", "Year"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["B", "", ""]);
        assert_eq!(table.column("Year"), Some(2));
    }

    #[test]
    fn read_missing_file_is_store_read() {
        let dir = tempfile::tempdir().unwrap();
        let err = Table::read(&dir.path().join("nope.csv"), "dataset").unwrap_err();
        assert!(matches!(err, RunError::StoreRead { .. }));
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old,content\n1,2\n").unwrap();

        let mut table = Table::new(vec!["Index".into(), "Error".into()]);
        table.rows.push(vec!["A".into(), "HTTP 404, not found".into()]);
        table.write_atomic(&path, "status report").unwrap();

        let back = Table::read(&path, "status report").unwrap();
        assert_eq!(back, table);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temp file must be renamed, not left behind");
    }

    #[test]
    fn ensure_column_extends_rows() {
        let mut table = Table::new(vec!["id".into()]);
        table.rows.push(vec!["A".into()]);
        assert_eq!(table.ensure_column("pdf_downloaded"), 1);
        assert_eq!(table.ensure_column("id"), 0);
        assert_eq!(table.rows[0], vec!["A", ""]);
    }

    #[test]
    fn non_empty_treats_whitespace_as_null() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" x "), Some("x"));
    }
}
