//! Integration test: local HTTP server, real curl fetcher, full run pipeline.
//!
//! Covers the A/B/C scenario (valid primary, invalid fallback, no address) and the
//! two-run forward-progress guarantee.

mod common;

use std::path::Path;
use std::sync::Arc;

use docfetch_core::config::DocfetchConfig;
use docfetch_core::fetch::{CurlFetcher, CurlOptions, ErrorKind};
use docfetch_core::reconcile::Status;
use docfetch_core::run::{plan, run_once};
use docfetch_core::table::Table;
use tempfile::tempdir;

fn pdf_body(tag: u8) -> Vec<u8> {
    let mut body = b"%PDF-1.7\n".to_vec();
    body.extend((0u8..100).cycle().take(32 * 1024).map(|b| b ^ tag));
    body
}

fn fetcher() -> Arc<CurlFetcher> {
    Arc::new(CurlFetcher::new(CurlOptions {
        connect_timeout: std::time::Duration::from_secs(5),
        timeout: std::time::Duration::from_secs(20),
        ..CurlOptions::default()
    }))
}

fn config(dir: &Path, dataset: String) -> DocfetchConfig {
    std::fs::write(dir.join("reports.csv"), dataset).unwrap();
    std::fs::write(
        dir.join("metadata.csv"),
        "BRnum,Company,pdf_downloaded\nOLD,Legacy Ltd,Yes\n",
    )
    .unwrap();
    DocfetchConfig {
        dataset_path: dir.join("reports.csv"),
        metadata_path: dir.join("metadata.csv"),
        destination_dir: dir.join("Downloads"),
        output_dir: dir.join("Output"),
        worker_timeout_secs: 20,
        ..DocfetchConfig::default()
    }
}

#[tokio::test]
async fn valid_invalid_and_missing_addresses() {
    let body = pdf_body(1);
    let server = common::doc_server::start(vec![("/a.pdf", body.clone())]);
    let dir = tempdir().unwrap();
    let cfg = config(
        dir.path(),
        format!(
            "BRnum,Pdf_URL,Report Html Address,Company\n\
             A,{},,Alpha AG\n\
             B,,invalid-url,Beta plc\n\
             C,,,Gamma SA\n",
            server.url("/a.pdf")
        ),
    );

    let summary = run_once(&cfg, fetcher()).await.expect("run_once");

    assert_eq!(summary.queued, 2);
    assert_eq!(summary.excluded_no_address, 1);
    assert_eq!(summary.outcomes[0].status, Status::Downloaded);
    assert_eq!(summary.outcomes[1].status, Status::Failed);
    let b_err = summary.outcomes[1].error.as_ref().unwrap();
    assert!(b_err.kind.is_network(), "B should fail with a network error, got {:?}", b_err);

    let a_path = dir.path().join("Downloads/A.pdf");
    assert_eq!(std::fs::read(&a_path).unwrap(), body, "file content must match");
    assert!(!dir.path().join("Downloads/B.pdf").exists());
    assert!(!dir.path().join("Downloads/C.pdf").exists());

    let report = Table::read(&summary.status_report, "status report").unwrap();
    assert_eq!(report.headers, vec!["Index", "Status", "Error"]);
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0][..2], ["A", "Downloaded"]);
    assert_eq!(report.rows[1][..2], ["B", "Failed"]);
    assert!(report.rows[1][2].contains("invalid-url"));

    let store = Table::read(&summary.metadata_output, "metadata store").unwrap();
    let flag = |id: &str| {
        store
            .rows
            .iter()
            .find(|r| r[0] == id)
            .map(|r| r[2].clone())
    };
    assert_eq!(flag("A").as_deref(), Some("Yes"));
    assert_eq!(flag("B").as_deref(), Some("No"));
    assert_eq!(flag("C"), None);
    assert_eq!(flag("OLD").as_deref(), Some("Yes"));
    let a_row = store.rows.iter().find(|r| r[0] == "A").unwrap();
    assert_eq!(a_row[1], "Alpha AG");
}

#[tokio::test]
async fn second_run_skips_completed_entries() {
    let server = common::doc_server::start(vec![("/a.pdf", pdf_body(2))]);
    let dir = tempdir().unwrap();
    let dataset = format!(
        "BRnum,Pdf_URL,Report Html Address,Company\n\
         A,{},,Alpha AG\n\
         B,{},,Beta plc\n",
        server.url("/a.pdf"),
        server.url("/b-missing.pdf")
    );
    let cfg = config(dir.path(), dataset);

    let first = run_once(&cfg, fetcher()).await.expect("first run");
    assert_eq!(first.downloaded, 1);
    let b_err = first.outcomes[1].error.as_ref().unwrap();
    assert_eq!(b_err.kind, ErrorKind::Http(404));
    assert_eq!(server.hits("/a.pdf"), 1);

    let queued: Vec<_> = plan(&cfg)
        .unwrap()
        .queue
        .iter()
        .map(|e| e.identifier.to_string())
        .collect();
    assert_eq!(queued, vec!["B"]);

    let second = run_once(&cfg, fetcher()).await.expect("second run");
    assert_eq!(second.queued, 1);
    assert_eq!(second.skipped_existing, 1);
    assert_eq!(second.outcomes[0].identifier.as_str(), "B");
    assert_eq!(server.hits("/a.pdf"), 1, "A must not be fetched again");
    assert_eq!(server.hits("/b-missing.pdf"), 2);

    let report = Table::read(&second.status_report, "status report").unwrap();
    assert_eq!(report.rows.len(), 1);
}

#[tokio::test]
async fn batch_cap_and_concurrency_limit_bound_the_run() {
    let docs: Vec<(String, Vec<u8>)> = (0..12).map(|i| (format!("/r{}.pdf", i), pdf_body(i as u8))).collect();
    let server = common::doc_server::start(docs.iter().map(|(p, b)| (p.as_str(), b.clone())).collect());
    let dir = tempdir().unwrap();
    let mut dataset = String::from("BRnum,Pdf_URL\n");
    for i in 0..12 {
        dataset.push_str(&format!("R{},{}\n", i, server.url(&format!("/r{}.pdf", i))));
    }
    let mut cfg = config(dir.path(), dataset);
    cfg.batch_cap = 7;
    cfg.concurrency_limit = 3;

    let summary = run_once(&cfg, fetcher()).await.expect("run_once");
    assert_eq!(summary.queued, 7);
    assert_eq!(summary.downloaded, 7);
    assert_eq!(summary.deferred, 5);
    let ids: Vec<_> = summary.outcomes.iter().map(|o| o.identifier.to_string()).collect();
    assert_eq!(ids, vec!["R0", "R1", "R2", "R3", "R4", "R5", "R6"]);
    assert_eq!(server.hits("/r7.pdf"), 0);

    let again = run_once(&cfg, fetcher()).await.expect("second run");
    assert_eq!(again.queued, 5);
    assert_eq!(again.downloaded, 5);
}
