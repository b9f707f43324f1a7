//! Orchestrator state and outcome types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which backend receives flushes
///
/// Persisted under the `SyncMode` cache key. The aliases accept the values
/// the shop's web client wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Cache only
    #[default]
    #[serde(rename = "none")]
    Disconnected,
    #[serde(rename = "local-file", alias = "local")]
    LocalFile,
    #[serde(rename = "cloud", alias = "drive")]
    Cloud,
}

impl SyncMode {
    pub fn is_connected(self) -> bool {
        !matches!(self, SyncMode::Disconnected)
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Disconnected => write!(f, "none"),
            SyncMode::LocalFile => write!(f, "local-file"),
            SyncMode::Cloud => write!(f, "cloud"),
        }
    }
}

/// Token state of the cloud session (meaningful in [`SyncMode::Cloud`])
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudAuth {
    #[default]
    Authenticated,
    /// Restored from a previous run, or the drive rejected the token.
    /// Flushes are skipped until the user signs in again.
    ReauthRequired,
}

/// What the UI polls for the save indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub mode: SyncMode,
    pub has_handle: bool,
    pub is_saving: bool,
    pub needs_reauth: bool,
    /// Epoch millis of the last successful flush in this process
    pub last_saved_at: Option<i64>,
}

/// Result of a connect call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The restored handle is still writable; cached state kept
    Reconnected(PathBuf),
    /// A newly picked file was linked and its contents loaded
    Opened(PathBuf),
    /// Fallback input: contents loaded, nothing linked, session detached
    ImportedWithoutHandle,
    /// The cloud copy replaced local state
    RemoteLoaded,
    /// No cloud copy yet: the local snapshot was uploaded as the first one
    RemoteBootstrapped,
}

/// Why a flush did not write anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotConnected,
    /// Another flush holds the writer lock
    Busy,
    PermissionRevoked,
    ReauthRequired,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotConnected => write!(f, "not connected"),
            SkipReason::Busy => write!(f, "flush already in progress"),
            SkipReason::PermissionRevoked => write!(f, "file permission revoked"),
            SkipReason::ReauthRequired => write!(f, "cloud re-authentication required"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    WrittenToFile(PathBuf),
    DownloadedAsFallback(PathBuf),
    Uploaded,
    Skipped(SkipReason),
    Failed(String),
}

impl FlushOutcome {
    /// Something was persisted somewhere
    pub fn is_saved(&self) -> bool {
        matches!(
            self,
            FlushOutcome::WrittenToFile(_) | FlushOutcome::DownloadedAsFallback(_) | FlushOutcome::Uploaded
        )
    }
}

/// What started a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Debounced,
    Scheduled,
    Manual,
    Shutdown,
}

impl std::fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushTrigger::Debounced => write!(f, "debounced"),
            FlushTrigger::Scheduled => write!(f, "scheduled"),
            FlushTrigger::Manual => write!(f, "manual"),
            FlushTrigger::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_wire_values() {
        assert_eq!(serde_json::to_string(&SyncMode::Disconnected).unwrap(), r#""none""#);
        assert_eq!(serde_json::to_string(&SyncMode::LocalFile).unwrap(), r#""local-file""#);
        assert_eq!(serde_json::to_string(&SyncMode::Cloud).unwrap(), r#""cloud""#);

        let legacy: SyncMode = serde_json::from_str(r#""drive""#).unwrap();
        assert_eq!(legacy, SyncMode::Cloud);
        let legacy: SyncMode = serde_json::from_str(r#""local""#).unwrap();
        assert_eq!(legacy, SyncMode::LocalFile);
    }

    #[test]
    fn test_status_wire_names() {
        let status = SyncStatus {
            mode: SyncMode::Cloud,
            has_handle: false,
            is_saving: true,
            needs_reauth: true,
            last_saved_at: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["mode"], "cloud");
        assert_eq!(json["isSaving"], true);
        assert_eq!(json["needsReauth"], true);
    }
}
