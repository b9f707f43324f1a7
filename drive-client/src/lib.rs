//! Drive Client - HTTP client for the cloud drive REST API
//!
//! Thin, typed wrapper over the handful of calls the backup sync needs:
//! file listing by query, folder creation, multipart create/update,
//! media download and the OAuth user-info endpoint.
//!
//! The client holds no credentials. Each call takes a [`DriveAuth`] so the
//! owner of the token decides when it exists and when it is dropped.

pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod types;

pub use config::DriveConfig;
pub use error::{DriveError, DriveResult};
pub use http::DriveClient;
pub use types::{DriveAuth, DriveFile, FileMetadata, UserInfo, FOLDER_MIME_TYPE, JSON_MIME_TYPE};
