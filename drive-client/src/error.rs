//! Client error types

use thiserror::Error;

/// Drive client error type
#[derive(Debug, Error)]
pub enum DriveError {
    /// HTTP request failed (connect, timeout, TLS, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token missing, expired or revoked
    #[error("Authentication required")]
    Unauthorized,

    /// Scope or API key rejected
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DriveError {
    /// Whether re-authenticating could fix the failure
    pub fn is_auth(&self) -> bool {
        matches!(self, DriveError::Unauthorized)
    }
}

/// Result type for client operations
pub type DriveResult<T> = Result<T, DriveError>;
