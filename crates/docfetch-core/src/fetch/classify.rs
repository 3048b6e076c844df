//! Classify fetch errors into failure kinds.

use super::error::FetchError;

/// What went wrong with one entry. Timeout, connection, HTTP and address errors are
/// network failures; `Filesystem` covers local temp-file and rename errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect, low-speed, total, or scheduler backstop).
    Timeout,
    /// Network-level failure (connection refused/reset, DNS, etc.).
    Connection,
    /// Server answered with a non-success status.
    Http(u16),
    /// Address did not parse or used an unsupported scheme.
    InvalidAddress,
    /// Local write/rename failed.
    Filesystem,
    /// Any other error (worker panic, missing report, unknown curl code).
    Other,
}

impl ErrorKind {
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::Connection | ErrorKind::Http(_) | ErrorKind::InvalidAddress
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::Http(_) => "http",
            ErrorKind::InvalidAddress => "invalid address",
            ErrorKind::Filesystem => "filesystem",
            ErrorKind::Other => "other",
        }
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    ErrorKind::Http(u16::try_from(code).unwrap_or(u16::MAX))
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_ssl_connect_error()
        || e.is_peer_failed_verification()
        || e.is_partial_file()
        || e.is_too_many_redirects()
    {
        return ErrorKind::Connection;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return ErrorKind::InvalidAddress;
    }
    if e.is_write_error() {
        return ErrorKind::Filesystem;
    }
    ErrorKind::Other
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::InvalidAddress { .. } => ErrorKind::InvalidAddress,
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::Storage(_) => ErrorKind::Filesystem,
        FetchError::Aborted | FetchError::TimedOut(_) => ErrorKind::Timeout,
    }
}
