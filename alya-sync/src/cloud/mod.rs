//! Cloud backend
//!
//! Keeps the backup in one JSON file inside a well-known drive folder.
//! Every lookup queries before it creates, so repeated saves converge on a
//! single folder and a single file.
//!
//! The bearer token lives only in memory. Operations before [`CloudBackend::init`]
//! fail with `NotInitialized`, operations without a token with `NotAuthenticated`.

mod drive;
mod token;

pub use drive::DriveApi;
pub use token::{DRIVE_SCOPE, StaticTokenIssuer, TokenIssuer};

use std::sync::Arc;

use drive_client::{DriveAuth, DriveFile, FileMetadata, UserInfo, query};
use serde::{Deserialize, Serialize};
use shared::AppSnapshot;

use crate::error::{SyncError, SyncResult};

/// User-entered drive credentials, cached under the `ApiConfig` key
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredentials {
    pub api_key: String,
    pub client_id: String,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client_id: client_id.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.client_id.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

pub struct CloudBackend {
    api: Arc<dyn DriveApi>,
    issuer: Arc<dyn TokenIssuer>,
    folder_name: String,
    credentials: Option<ApiCredentials>,
    token: Option<String>,
}

impl CloudBackend {
    pub fn new(
        api: Arc<dyn DriveApi>,
        issuer: Arc<dyn TokenIssuer>,
        folder_name: impl Into<String>,
    ) -> Self {
        Self {
            api,
            issuer,
            folder_name: folder_name.into(),
            credentials: None,
            token: None,
        }
    }

    /// One-time setup with the user's API key and client id.
    ///
    /// Re-initializing with different credentials drops the current token.
    pub fn init(&mut self, credentials: ApiCredentials) -> SyncResult<()> {
        if !credentials.is_complete() {
            return Err(SyncError::MissingCredentials);
        }
        if self.credentials.as_ref() != Some(&credentials) {
            self.token = None;
        }
        self.credentials = Some(credentials);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    /// Run the consent flow and keep the token for this process
    pub async fn sign_in(&mut self) -> SyncResult<()> {
        let credentials = self.credentials.as_ref().ok_or(SyncError::NotInitialized)?;
        let token = self
            .issuer
            .request_token(&credentials.client_id, DRIVE_SCOPE)
            .await
            .map_err(|e| match e {
                SyncError::AuthFailure(_) => e,
                other => SyncError::AuthFailure(other.to_string()),
            })?;
        if token.trim().is_empty() {
            return Err(SyncError::AuthFailure("empty access token".into()));
        }

        self.token = Some(token);
        tracing::info!("Cloud sign-in succeeded");
        Ok(())
    }

    pub fn sign_out(&mut self) {
        if self.token.take().is_some() {
            tracing::info!("Cloud token dropped");
        }
    }

    fn auth(&self) -> SyncResult<DriveAuth> {
        let credentials = self.credentials.as_ref().ok_or(SyncError::NotInitialized)?;
        let token = self.token.as_ref().ok_or(SyncError::NotAuthenticated)?;
        Ok(DriveAuth::new(credentials.api_key.clone(), token.clone()))
    }

    pub async fn user_info(&self) -> SyncResult<UserInfo> {
        let auth = self.auth()?;
        Ok(self.api.user_info(&auth).await?)
    }

    /// Id of the backup folder, created on first use
    pub async fn ensure_folder_exists(&self) -> SyncResult<String> {
        let auth = self.auth()?;
        self.folder_id(&auth).await
    }

    async fn folder_id(&self, auth: &DriveAuth) -> SyncResult<String> {
        let folders = self
            .api
            .list_files(auth, &query::folder_by_name(&self.folder_name))
            .await?;
        if let Some(folder) = folders.into_iter().next() {
            return Ok(folder.id);
        }

        let folder = self.api.create_folder(auth, &self.folder_name).await?;
        tracing::info!(folder_id = %folder.id, name = %self.folder_name, "Created backup folder");
        Ok(folder.id)
    }

    async fn find_file(
        &self,
        auth: &DriveAuth,
        folder_id: &str,
        file_name: &str,
    ) -> SyncResult<Option<DriveFile>> {
        let files = self
            .api
            .list_files(auth, &query::file_in_folder(file_name, folder_id))
            .await?;
        Ok(files.into_iter().next())
    }

    /// Upload the snapshot, updating the existing file in place when there is one
    pub async fn save_file(&self, snapshot: &AppSnapshot, file_name: &str) -> SyncResult<DriveFile> {
        let auth = self.auth()?;
        let folder_id = self.folder_id(&auth).await?;
        let body = snapshot.stamped().to_json_pretty()?;

        let file = match self.find_file(&auth, &folder_id, file_name).await? {
            Some(existing) => {
                let metadata = FileMetadata::json_file(file_name, None);
                self.api.update_file(&auth, &existing.id, &metadata, &body).await?
            }
            None => {
                let metadata = FileMetadata::json_file(file_name, Some(&folder_id));
                let created = self.api.create_file(&auth, &metadata, &body).await?;
                tracing::info!(file_id = %created.id, name = %file_name, "Created backup file");
                created
            }
        };

        tracing::debug!(file_id = %file.id, bytes = body.len(), "Snapshot uploaded");
        Ok(file)
    }

    /// Download and validate the snapshot, `None` if it does not exist yet
    pub async fn load_file(&self, file_name: &str) -> SyncResult<Option<AppSnapshot>> {
        let auth = self.auth()?;
        let folder_id = self.folder_id(&auth).await?;

        let Some(file) = self.find_file(&auth, &folder_id, file_name).await? else {
            return Ok(None);
        };
        let text = self.api.download(&auth, &file.id).await?;
        Ok(Some(AppSnapshot::from_json(&text)?))
    }
}
