use thiserror::Error;

/// Errors from the remote storage service.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("storage API error: {0}")]
    ApiError(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StorageError::Timeout
        } else if e.is_connect() {
            StorageError::ConnectionFailed(e.to_string())
        } else {
            StorageError::ApiError(e.to_string())
        }
    }
}
