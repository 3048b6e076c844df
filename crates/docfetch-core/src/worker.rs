//! Download worker: fetches one entry to `<destination>/<id>.<ext>`.
//!
//! Every failure is converted into a [`WorkerReport`] here; nothing propagates to
//! the scheduler. The final filename only appears after a complete, synced transfer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dataset::Entry;
use crate::fetch::{parse_address, ErrorDetail, Fetch, FetchError};
use crate::identifier::Identifier;
use crate::storage::{temp_path, PartFile};

/// Shared, read-only state every worker needs.
#[derive(Clone)]
pub struct WorkerContext {
    pub fetcher: Arc<dyn Fetch>,
    pub destination: PathBuf,
    pub extension: String,
}

impl WorkerContext {
    pub fn final_path(&self, id: &Identifier) -> PathBuf {
        self.destination.join(id.file_name(&self.extension))
    }
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext")
            .field("destination", &self.destination)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

/// What a worker says happened. The reconciler treats this as a hint; the
/// filesystem decides the final status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub identifier: Identifier,
    /// Bytes written on success, error detail on failure.
    pub result: Result<u64, ErrorDetail>,
}

impl WorkerReport {
    pub fn failed(identifier: Identifier, detail: ErrorDetail) -> Self {
        Self {
            identifier,
            result: Err(detail),
        }
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        self.result.as_ref().err()
    }
}

/// Runs one entry to completion. Blocking; call from `spawn_blocking`.
pub fn run_worker(entry: &Entry, ctx: &WorkerContext, abort: &AtomicBool) -> WorkerReport {
    let id = entry.identifier.clone();
    let Some(address) = entry.address() else {
        return WorkerReport::failed(id, ErrorDetail::missing_address());
    };

    tracing::debug!(id = %id, url = address, "download started");
    let final_path = ctx.final_path(&id);
    match fetch_to(address, &final_path, ctx.fetcher.as_ref(), abort) {
        Ok(bytes) => {
            tracing::info!(id = %id, bytes, "downloaded");
            WorkerReport { identifier: id, result: Ok(bytes) }
        }
        Err(e) => {
            let detail = ErrorDetail::from_fetch_error(&e);
            tracing::warn!(id = %id, url = address, kind = detail.kind.label(), "download failed: {}", detail);
            WorkerReport::failed(id, detail)
        }
    }
}

/// Resolve, fetch into the temp file, sync, and rename into place.
fn fetch_to(
    address: &str,
    final_path: &Path,
    fetcher: &dyn Fetch,
    abort: &AtomicBool,
) -> Result<u64, FetchError> {
    let url = parse_address(address)?;
    let mut part = PartFile::create(&temp_path(final_path))?;

    let written = match fetcher.fetch(&url, &mut part, abort) {
        Ok(n) => n,
        Err(e) => {
            part.discard();
            return Err(e);
        }
    };
    if let Err(e) = part.sync() {
        part.discard();
        return Err(FetchError::Storage(e));
    }
    if abort.load(Ordering::Acquire) {
        part.discard();
        return Err(FetchError::Aborted);
    }
    part.finalize(final_path)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ErrorKind;
    use std::io::Write;
    use url::Url;

    /// Writes a fixed body, or fails with the given status, per URL path.
    struct StaticFetcher;

    impl Fetch for StaticFetcher {
        fn fetch(&self, url: &Url, sink: &mut dyn Write, _abort: &AtomicBool) -> Result<u64, FetchError> {
            match url.path() {
                "/ok.pdf" => {
                    sink.write_all(b"%PDF-1.4 ok")?;
                    Ok(11)
                }
                "/half.pdf" => {
                    sink.write_all(b"%PDF-1.4 trunc")?;
                    Err(FetchError::Curl(curl::Error::new(18))) // CURLE_PARTIAL_FILE
                }
                _ => Err(FetchError::Http(404)),
            }
        }
    }

    fn ctx(dir: &Path) -> WorkerContext {
        WorkerContext {
            fetcher: Arc::new(StaticFetcher),
            destination: dir.to_path_buf(),
            extension: "pdf".into(),
        }
    }

    fn entry(id: &str, primary: Option<&str>, fallback: Option<&str>) -> Entry {
        Entry {
            identifier: Identifier::parse(id).unwrap(),
            primary: primary.map(str::to_string),
            fallback: fallback.map(str::to_string),
            extra: Vec::new(),
        }
    }

    #[test]
    fn success_places_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let abort = AtomicBool::new(false);
        let report = run_worker(&entry("A", Some("http://h/ok.pdf"), None), &ctx(dir.path()), &abort);
        assert_eq!(report.result, Ok(11));
        assert_eq!(std::fs::read(dir.path().join("A.pdf")).unwrap(), b"%PDF-1.4 ok");
        assert!(!dir.path().join("A.pdf.part").exists());
    }

    #[test]
    fn fallback_used_when_primary_absent() {
        let dir = tempfile::tempdir().unwrap();
        let abort = AtomicBool::new(false);
        let report = run_worker(&entry("B", None, Some("http://h/ok.pdf")), &ctx(dir.path()), &abort);
        assert!(report.result.is_ok());
        assert!(dir.path().join("B.pdf").exists());
    }

    #[test]
    fn partial_transfer_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let abort = AtomicBool::new(false);
        let report = run_worker(&entry("C", Some("http://h/half.pdf"), None), &ctx(dir.path()), &abort);
        let detail = report.error().unwrap();
        assert_eq!(detail.kind, ErrorKind::Connection);
        assert!(!dir.path().join("C.pdf").exists());
        assert!(!dir.path().join("C.pdf.part").exists());
    }

    #[test]
    fn invalid_address_is_a_failed_report() {
        let dir = tempfile::tempdir().unwrap();
        let abort = AtomicBool::new(false);
        let report = run_worker(&entry("D", None, Some("invalid-url")), &ctx(dir.path()), &abort);
        let detail = report.error().unwrap();
        assert_eq!(detail.kind, ErrorKind::InvalidAddress);
        assert!(detail.kind.is_network());
        assert!(detail.to_string().starts_with("invalid address `invalid-url`"));
    }

    #[test]
    fn http_error_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let abort = AtomicBool::new(false);
        let report = run_worker(&entry("E", Some("http://h/missing.pdf"), None), &ctx(dir.path()), &abort);
        assert_eq!(report.error().unwrap().to_string(), "HTTP 404");
        assert!(!dir.path().join("E.pdf").exists());
    }

    #[test]
    fn abort_before_rename_discards() {
        let dir = tempfile::tempdir().unwrap();
        let abort = AtomicBool::new(true);
        let report = run_worker(&entry("F", Some("http://h/ok.pdf"), None), &ctx(dir.path()), &abort);
        assert_eq!(report.error().unwrap().kind, ErrorKind::Timeout);
        assert!(!dir.path().join("F.pdf").exists());
    }

    #[test]
    fn unwritable_destination_is_filesystem_failure() {
        let dir = tempfile::tempdir().unwrap();
        let abort = AtomicBool::new(false);
        let mut c = ctx(dir.path());
        c.destination = dir.path().join("does-not-exist");
        let report = run_worker(&entry("G", Some("http://h/ok.pdf"), None), &c, &abort);
        assert_eq!(report.error().unwrap().kind, ErrorKind::Filesystem);
    }
}
