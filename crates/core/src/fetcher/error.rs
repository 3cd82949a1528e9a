use std::path::PathBuf;

use thiserror::Error;

use crate::paths::PathError;
use crate::storage::StorageError;

/// Errors from downloading a single remote file.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not open stream for file {file_id}: {source}")]
    StreamUnavailable {
        file_id: String,
        #[source]
        source: StorageError,
    },

    #[error("copy to {path} failed: {reason}")]
    CopyFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

impl FetchError {
    pub(crate) fn copy_failed(path: &std::path::Path, reason: impl ToString) -> Self {
        FetchError::CopyFailed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Metric label for this failure.
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::StreamUnavailable { .. } => "stream_unavailable",
            FetchError::CopyFailed { .. } => "copy_failed",
            FetchError::Path(_) => "path_error",
        }
    }
}
