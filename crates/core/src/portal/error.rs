use thiserror::Error;

/// Errors from the case portal APIs.
#[derive(Debug, Clone, Error)]
pub enum PortalError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("portal API error: {0}")]
    ApiError(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PortalError::Timeout
        } else if e.is_connect() {
            PortalError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            PortalError::InvalidResponse(e.to_string())
        } else {
            PortalError::ApiError(e.to_string())
        }
    }
}
