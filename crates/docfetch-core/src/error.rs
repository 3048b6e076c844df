//! Run-level (fatal) errors.
//!
//! Per-entry failures never show up here; they are converted to data at the worker
//! boundary (see [`crate::fetch::ErrorDetail`]). Anything in [`RunError`] aborts the
//! run before the status report and metadata merge are written.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed source error carried by [`RunError`] variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RunError {
    /// Dataset, metadata store or destination listing could not be read.
    #[error("failed to read {what} at {}", path.display())]
    StoreRead {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A required column is absent from a tabular input.
    #[error("{what} at {} has no `{column}` column", path.display())]
    MissingColumn {
        what: &'static str,
        path: PathBuf,
        column: String,
    },

    /// Status report or metadata output could not be persisted.
    #[error("failed to write {what} at {}", path.display())]
    StoreWrite {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Destination or output directory could not be created.
    #[error("failed to create directory {}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    pub(crate) fn read(what: &'static str, path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        RunError::StoreRead {
            what,
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(what: &'static str, path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        RunError::StoreWrite {
            what,
            path: path.into(),
            source: source.into(),
        }
    }
}

/// `create_dir_all` mapped to [`RunError::DirectoryCreate`].
pub(crate) fn create_dir(path: &std::path::Path) -> Result<(), RunError> {
    std::fs::create_dir_all(path).map_err(|source| RunError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}
