//! Fetch primitive and per-entry error reporting.
//!
//! [`Fetch`] is the "fetch URL to a writer" primitive the worker drives; the
//! production implementation is [`CurlFetcher`]. Errors are classified into
//! [`ErrorKind`] and carried as [`ErrorDetail`] data so they never escape a worker.

mod classify;
mod http;
mod detail;
mod error;

pub use http::{CurlFetcher, CurlOptions};
pub use classify::{classify, classify_curl_error, classify_http_status, ErrorKind};
pub use detail::{ErrorDetail, FILE_NOT_FOUND};
pub use error::FetchError;

use std::io::Write;
use std::sync::atomic::AtomicBool;
use url::Url;

/// Downloads one document into `sink`. Blocking; called from a worker thread.
///
/// Implementations should stop early and return [`FetchError::Aborted`] once `abort`
/// is set (the scheduler sets it when a worker overruns its timeout).
pub trait Fetch: Send + Sync {
    /// Streams the body of `url` into `sink`. Returns the number of bytes written.
    fn fetch(&self, url: &Url, sink: &mut dyn Write, abort: &AtomicBool) -> Result<u64, FetchError>;
}

/// Schemes a worker will hand to a fetcher.
pub const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Parses and checks a dataset address before any network activity.
pub fn parse_address(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidAddress {
        address: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(FetchError::InvalidAddress {
            address: raw.to_string(),
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_http_and_https() {
        assert!(parse_address("https://example.com/r/2019.pdf").is_ok());
        assert!(parse_address("  http://example.com/a  ").is_ok());
    }

    #[test]
    fn parse_address_rejects_garbage_and_other_schemes() {
        assert!(matches!(
            parse_address("invalid-url"),
            Err(FetchError::InvalidAddress { .. })
        ));
        assert!(matches!(
            parse_address("ftp://example.com/a.pdf"),
            Err(FetchError::InvalidAddress { .. })
        ));
    }
}
