//! Request/response types for the drive REST surface

use serde::{Deserialize, Serialize};

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const JSON_MIME_TYPE: &str = "application/json";

/// Credentials attached to every call
#[derive(Clone)]
pub struct DriveAuth {
    /// Project API key, sent as the `key` query parameter when non-empty
    pub api_key: String,
    /// OAuth bearer token
    pub access_token: String,
}

impl DriveAuth {
    pub fn new(api_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for DriveAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveAuth")
            .field("api_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// File or folder resource (only the fields we request)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// `files.list` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// Metadata part of a create/update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub mime_type: String,
    /// Only honoured on create; the API rejects `parents` on update
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl FileMetadata {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            parents: Vec::new(),
        }
    }

    pub fn json_file(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            mime_type: JSON_MIME_TYPE.to_string(),
            parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
        }
    }
}

/// OAuth user-info profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub picture: String,
}
