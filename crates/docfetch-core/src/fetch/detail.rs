//! Human-readable, structured error detail recorded per identifier.

use std::fmt;
use std::time::Duration;

use super::classify::{classify, ErrorKind};
use super::error::FetchError;

/// Message shown for a queued entry whose file is missing and whose worker recorded no error.
pub const FILE_NOT_FOUND: &str = "File not found";

/// Error detail for a failed entry: a short message plus the underlying cause, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    pub cause: Option<String>,
}

impl ErrorDetail {
    pub fn new(kind: ErrorKind, message: impl Into<String>, cause: Option<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause,
        }
    }

    pub fn from_fetch_error(err: &FetchError) -> Self {
        let kind = classify(err);
        match err {
            FetchError::InvalidAddress { address, reason } => Self::new(
                kind,
                format!("invalid address `{}`", address),
                Some(reason.clone()),
            ),
            FetchError::Curl(e) => {
                let message = match kind {
                    ErrorKind::Timeout => "request timed out",
                    ErrorKind::Connection => "connection failed",
                    ErrorKind::InvalidAddress => "address rejected by client",
                    ErrorKind::Filesystem => "write failed",
                    _ => "transfer failed",
                };
                let mut cause = e.description().to_string();
                if let Some(extra) = e.extra_description() {
                    cause = format!("{} ({})", cause, extra);
                }
                Self::new(kind, message, Some(cause))
            }
            FetchError::Http(code) => Self::new(kind, format!("HTTP {}", code), None),
            FetchError::Storage(e) => Self::new(kind, "write failed", Some(e.to_string())),
            FetchError::Aborted => Self::new(kind, "transfer aborted", None),
            FetchError::TimedOut(d) => Self::timed_out(*d),
        }
    }

    pub fn timed_out(budget: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("timed out after {}s", budget.as_secs()),
            None,
        )
    }

    pub fn panicked(cause: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Other, "worker panicked", Some(cause.to_string()))
    }

    pub fn missing_address() -> Self {
        Self::new(ErrorKind::InvalidAddress, "no download address", None)
    }

    pub fn file_not_found() -> Self {
        Self::new(ErrorKind::Other, FILE_NOT_FOUND, None)
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}
