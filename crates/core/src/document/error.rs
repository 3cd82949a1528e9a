use thiserror::Error;

use crate::paths::PathError;

/// Errors from generating a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("render failed: {0}")]
    Render(String),

    #[error("case details unreadable: {0}")]
    InvalidDetails(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Path(#[from] PathError),
}
