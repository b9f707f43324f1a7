//! Drive REST seam
//!
//! One method per call the backend makes, typed at the boundary so no raw
//! JSON from the remote side leaks further in.

use async_trait::async_trait;
use drive_client::{DriveAuth, DriveClient, DriveFile, DriveResult, FileMetadata, UserInfo};

#[async_trait]
pub trait DriveApi: Send + Sync {
    async fn list_files(&self, auth: &DriveAuth, query: &str) -> DriveResult<Vec<DriveFile>>;

    async fn create_folder(&self, auth: &DriveAuth, name: &str) -> DriveResult<DriveFile>;

    /// Multipart create; `metadata.parents` places the file
    async fn create_file(
        &self,
        auth: &DriveAuth,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile>;

    /// Multipart update in place, keeping id and location
    async fn update_file(
        &self,
        auth: &DriveAuth,
        file_id: &str,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile>;

    async fn download(&self, auth: &DriveAuth, file_id: &str) -> DriveResult<String>;

    async fn user_info(&self, auth: &DriveAuth) -> DriveResult<UserInfo>;
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn list_files(&self, auth: &DriveAuth, query: &str) -> DriveResult<Vec<DriveFile>> {
        DriveClient::list_files(self, auth, query).await
    }

    async fn create_folder(&self, auth: &DriveAuth, name: &str) -> DriveResult<DriveFile> {
        DriveClient::create_folder(self, auth, name).await
    }

    async fn create_file(
        &self,
        auth: &DriveAuth,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile> {
        DriveClient::create_file(self, auth, metadata, body).await
    }

    async fn update_file(
        &self,
        auth: &DriveAuth,
        file_id: &str,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile> {
        DriveClient::update_file(self, auth, file_id, metadata, body).await
    }

    async fn download(&self, auth: &DriveAuth, file_id: &str) -> DriveResult<String> {
        DriveClient::download(self, auth, file_id).await
    }

    async fn user_info(&self, auth: &DriveAuth) -> DriveResult<UserInfo> {
        DriveClient::user_info(self, auth).await
    }
}
