//! Error types for path derivation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while deriving or creating case folders.
#[derive(Debug, Error)]
pub enum PathError {
    /// Folder kind outside the closed set.
    #[error(
        "Invalid folder kind {0:?}, must be \"IMPORT\", \"EXPORT - Internal\", \
         \"EXPORT - External\" or \"Uploads\""
    )]
    InvalidFolderKind(String),

    /// No date bucket was recorded for this id in the current cycle.
    #[error("No date bucket recorded for {0}, its root folder was never ensured")]
    UnmappedCase(String),

    /// Creation timestamp cannot be represented as a date.
    #[error("Creation timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    /// Failed to create a folder.
    #[error("Failed to create folder: {path}")]
    FolderCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
