//! Bearer token issuance
//!
//! The consent flow itself belongs to the front end. The core only needs
//! something that turns a client id and a scope into a token.

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};

/// Least-privilege scope: only files this app created
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Run the consent flow. Denial or failure is [`SyncError::AuthFailure`].
    async fn request_token(&self, client_id: &str, scope: &str) -> SyncResult<String>;
}

/// Token provisioned out of band (`DRIVE_ACCESS_TOKEN`)
#[derive(Clone, Default)]
pub struct StaticTokenIssuer {
    token: Option<String>,
}

impl StaticTokenIssuer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn from_env() -> Self {
        Self {
            token: std::env::var("DRIVE_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        }
    }
}

impl std::fmt::Debug for StaticTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenIssuer")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl TokenIssuer for StaticTokenIssuer {
    async fn request_token(&self, client_id: &str, _scope: &str) -> SyncResult<String> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => Err(SyncError::AuthFailure(format!(
                "no access token available for client {client_id}; set DRIVE_ACCESS_TOKEN"
            ))),
        }
    }
}
