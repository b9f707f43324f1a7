//! Sync core error types

use drive_client::DriveError;
use shared::{InvoiceError, SnapshotError};
use thiserror::Error;

use crate::cache::CacheError;
use crate::handle_store::HandleStoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Snapshot failed structural validation; nothing was applied
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// File capability revoked or never granted
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Cloud sign-in or token issuance failed
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Network error: {0}")]
    Network(#[from] DriveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cloud operation attempted before `init`
    #[error("Cloud backend not initialized")]
    NotInitialized,

    /// Cloud connect attempted without an API key / client id
    #[error("Missing cloud credentials: configure the API key and client id first")]
    MissingCredentials,

    /// Cloud operation attempted without a token
    #[error("Not authenticated")]
    NotAuthenticated,

    /// User dismissed the picker
    #[error("Cancelled by user")]
    Cancelled,

    /// Checkout rejected (empty cart, unknown payment method)
    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// Snapshot could not be encoded for writing
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Handle store error: {0}")]
    HandleStore(#[from] HandleStoreError),
}

impl From<SnapshotError> for SyncError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::InvalidFormat(msg) => SyncError::InvalidFormat(msg),
            // Only produced when encoding, never when reading a file
            SnapshotError::Json(e) => SyncError::Serialization(e.to_string()),
        }
    }
}

impl SyncError {
    /// The drive rejected the bearer token (expired or revoked)
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, SyncError::Network(e) if e.is_auth())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_errors_map_by_direction() {
        let invalid = SyncError::from(SnapshotError::InvalidFormat("missing `invoices`".into()));
        assert!(matches!(invalid, SyncError::InvalidFormat(_)));

        let json_err = serde_json::from_str::<i32>("x").unwrap_err();
        let err = SyncError::from(SnapshotError::Json(json_err));
        assert!(matches!(err, SyncError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
