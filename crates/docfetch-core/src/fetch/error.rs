//! Fetch error type for classification.

use std::fmt;
use std::time::Duration;

/// Error returned by a single document fetch (address, curl, HTTP or storage failure).
/// Kept typed so it can be classified before being flattened into an [`super::ErrorDetail`].
#[derive(Debug)]
pub enum FetchError {
    /// Address did not parse or uses a scheme we do not fetch.
    InvalidAddress { address: String, reason: String },
    /// Curl reported an error (timeout, connection, DNS, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Temp file could not be created, written, synced or renamed.
    Storage(std::io::Error),
    /// Abort token was set while the transfer was running.
    Aborted,
    /// Worker overran its time budget and was abandoned by the scheduler.
    TimedOut(Duration),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidAddress { address, reason } => {
                write!(f, "invalid address `{}`: {}", address, reason)
            }
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Storage(e) => write!(f, "storage: {}", e),
            FetchError::Aborted => write!(f, "transfer aborted"),
            FetchError::TimedOut(d) => write!(f, "timed out after {}s", d.as_secs()),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Storage(e) => Some(e),
            FetchError::InvalidAddress { .. }
            | FetchError::Http(_)
            | FetchError::Aborted
            | FetchError::TimedOut(_) => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Storage(e)
    }
}
