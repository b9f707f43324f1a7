//! HTTP client for the drive REST API

use crate::types::{DriveAuth, DriveFile, FileList, FileMetadata, UserInfo, JSON_MIME_TYPE};
use crate::{DriveConfig, DriveError, DriveResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// HTTP client for the drive API
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: Client,
    config: DriveConfig,
}

impl DriveClient {
    /// Create a new client from configuration
    pub fn new(config: DriveConfig) -> DriveResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Attach bearer token and API key
    fn authorize(request: RequestBuilder, auth: &DriveAuth) -> RequestBuilder {
        let request = request.bearer_auth(&auth.access_token);
        if auth.api_key.is_empty() {
            request
        } else {
            request.query(&[("key", auth.api_key.as_str())])
        }
    }

    /// Map non-success statuses onto [`DriveError`]
    async fn check(response: reqwest::Response) -> DriveResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED => DriveError::Unauthorized,
            StatusCode::FORBIDDEN => DriveError::Forbidden(text),
            StatusCode::NOT_FOUND => DriveError::NotFound(text),
            _ => DriveError::Api {
                status: status.as_u16(),
                body: text,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> DriveResult<T> {
        let response = Self::check(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| DriveError::InvalidResponse(e.to_string()))
    }

    // ========== Files API ==========

    /// `GET /files?q=...`
    pub async fn list_files(&self, auth: &DriveAuth, query: &str) -> DriveResult<Vec<DriveFile>> {
        let url = format!("{}/files", self.config.api_url);
        let request = self.client.get(&url).query(&[
            ("q", query),
            ("fields", "files(id, name, mimeType)"),
            ("spaces", "drive"),
        ]);

        let list: FileList = Self::send_json(Self::authorize(request, auth)).await?;
        tracing::trace!(query = %query, count = list.files.len(), "Listed drive files");
        Ok(list.files)
    }

    /// `POST /files` with metadata only (folders)
    pub async fn create_folder(&self, auth: &DriveAuth, name: &str) -> DriveResult<DriveFile> {
        let url = format!("{}/files", self.config.api_url);
        let request = self
            .client
            .post(&url)
            .query(&[("fields", "id, name, mimeType")])
            .json(&FileMetadata::folder(name));

        Self::send_json(Self::authorize(request, auth)).await
    }

    /// `POST /upload/files?uploadType=multipart`
    pub async fn create_file(
        &self,
        auth: &DriveAuth,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile> {
        let url = format!("{}/files", self.config.upload_url);
        let request = self.multipart(self.client.post(&url), metadata, body)?;
        Self::send_json(Self::authorize(request, auth)).await
    }

    /// `PATCH /upload/files/{id}?uploadType=multipart`, keeps id and parents
    pub async fn update_file(
        &self,
        auth: &DriveAuth,
        file_id: &str,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile> {
        let url = format!("{}/files/{}", self.config.upload_url, file_id);
        let metadata = FileMetadata {
            parents: Vec::new(),
            ..metadata.clone()
        };
        let request = self.multipart(self.client.patch(&url), &metadata, body)?;
        Self::send_json(Self::authorize(request, auth)).await
    }

    /// `GET /files/{id}?alt=media`, raw body
    pub async fn download(&self, auth: &DriveAuth, file_id: &str) -> DriveResult<String> {
        let url = format!("{}/files/{}", self.config.api_url, file_id);
        let request = self.client.get(&url).query(&[("alt", "media")]);
        let response = Self::check(Self::authorize(request, auth).send().await?).await?;
        Ok(response.text().await?)
    }

    // ========== OAuth ==========

    /// Profile of the token owner
    pub async fn user_info(&self, auth: &DriveAuth) -> DriveResult<UserInfo> {
        let request = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&auth.access_token);
        Self::send_json(request).await
    }

    fn multipart(
        &self,
        request: RequestBuilder,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<RequestBuilder> {
        let boundary = format!("alya-{}", uuid::Uuid::new_v4().simple());
        let payload = multipart_related(&boundary, &serde_json::to_string(metadata)?, body);

        Ok(request
            .query(&[("uploadType", "multipart"), ("fields", "id, name, mimeType")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(payload))
    }
}

/// Two-part `multipart/related` body: JSON metadata, then JSON media
pub(crate) fn multipart_related(boundary: &str, metadata_json: &str, body: &str) -> String {
    format!(
        "--{boundary}\r\n\
         Content-Type: {JSON_MIME_TYPE}; charset=UTF-8\r\n\r\n\
         {metadata_json}\r\n\
         --{boundary}\r\n\
         Content-Type: {JSON_MIME_TYPE}\r\n\r\n\
         {body}\r\n\
         --{boundary}--\r\n"
    )
}
