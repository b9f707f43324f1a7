//! Local file backend
//!
//! One JSON snapshot file, reached through a user-granted [`FileHandle`].
//! Writes never raise: every failure comes back as [`WriteOutcome::Failed`]
//! and the orchestrator decides whether it matters.

use std::path::PathBuf;
use std::sync::Arc;

use shared::AppSnapshot;

use crate::error::{SyncError, SyncResult};
use crate::fs_access::{FileHandle, FileSystemAccess, PermissionState};
use crate::handle_store::HandleStore;

/// Result of writing a snapshot through the local file backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Overwrote the linked file in place
    WrittenToFile(PathBuf),
    /// No usable handle: the snapshot was saved as a download instead
    DownloadedAsFallback(PathBuf),
    Failed(String),
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, WriteOutcome::Failed(_))
    }
}

/// A validated snapshot read from a user-chosen file
#[derive(Debug, Clone)]
pub struct OpenedSnapshot {
    pub snapshot: AppSnapshot,
    /// `None` on the fallback input path
    pub handle: Option<FileHandle>,
}

/// Daily backup file name, `DulceAlya_Backup_YYYY-MM-DD.json`
pub fn backup_file_name(date: chrono::NaiveDate) -> String {
    format!("DulceAlya_Backup_{}.json", date.format("%Y-%m-%d"))
}

pub struct LocalFileBackend {
    fs: Arc<dyn FileSystemAccess>,
    store: HandleStore,
    handle: Option<FileHandle>,
}

impl LocalFileBackend {
    pub fn new(fs: Arc<dyn FileSystemAccess>, store: HandleStore) -> Self {
        Self {
            fs,
            store,
            handle: None,
        }
    }

    pub fn handle(&self) -> Option<&FileHandle> {
        self.handle.as_ref()
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Reload the handle saved by a previous session.
    ///
    /// Permission is not checked here; [`verify_permission`](Self::verify_permission)
    /// runs before the first write.
    pub fn restore(&mut self) -> bool {
        self.handle = self.store.get_handle();
        if let Some(handle) = &self.handle {
            tracing::info!(path = %handle.path.display(), "Restored file handle");
        }
        self.handle.is_some()
    }

    /// Let the user choose a snapshot file, validate it and keep its handle.
    ///
    /// Nothing is held or persisted unless the file decodes as a snapshot.
    pub async fn pick_and_open(&mut self) -> SyncResult<OpenedSnapshot> {
        if !self.fs.supports_handles() {
            let text = self.fs.pick_contents().await?.ok_or(SyncError::Cancelled)?;
            let snapshot = AppSnapshot::from_json(&text)?;
            tracing::info!("Opened snapshot through fallback input, no handle held");
            return Ok(OpenedSnapshot {
                snapshot,
                handle: None,
            });
        }

        let handle = self.fs.pick_file().await?.ok_or(SyncError::Cancelled)?;
        let text = self.fs.read(&handle).await?;
        let snapshot = AppSnapshot::from_json(&text)?;

        if let Err(e) = self.store.save_handle(&handle) {
            // Still usable for this session, just not restorable
            tracing::warn!(error = %e, "Failed to persist file handle");
        }
        tracing::info!(
            path = %handle.path.display(),
            invoices = snapshot.invoices.len(),
            products = snapshot.products.len(),
            "Opened snapshot file"
        );
        self.handle = Some(handle.clone());

        Ok(OpenedSnapshot {
            snapshot,
            handle: Some(handle),
        })
    }

    /// Whether the held handle is still writable, asking again once if not
    pub async fn verify_permission(&self) -> bool {
        let Some(handle) = &self.handle else {
            return false;
        };

        match self.fs.query_permission(handle).await {
            PermissionState::Granted => true,
            _ => {
                let state = self.fs.request_permission(handle).await;
                if !state.is_granted() {
                    tracing::debug!(path = %handle.path.display(), ?state, "File permission not granted");
                }
                state.is_granted()
            }
        }
    }

    /// Stamp and write the snapshot; downloads it when no handle is held
    pub async fn write(&self, snapshot: &AppSnapshot) -> WriteOutcome {
        let json = match snapshot.stamped().to_json_pretty() {
            Ok(json) => json,
            Err(e) => return WriteOutcome::Failed(e.to_string()),
        };

        let Some(handle) = &self.handle else {
            let name = backup_file_name(chrono::Local::now().date_naive());
            return match self.fs.download(&name, &json).await {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "No file linked, snapshot downloaded");
                    WriteOutcome::DownloadedAsFallback(path)
                }
                Err(e) => WriteOutcome::Failed(e.to_string()),
            };
        };

        match self.fs.write(handle, &json).await {
            Ok(()) => WriteOutcome::WrittenToFile(handle.path.clone()),
            Err(e) => {
                tracing::error!(path = %handle.path.display(), error = %e, "Snapshot write failed");
                WriteOutcome::Failed(e.to_string())
            }
        }
    }

    /// Export button: always a fresh download, never the linked file
    pub async fn download_backup(&self, snapshot: &AppSnapshot) -> SyncResult<PathBuf> {
        let json = snapshot.stamped().to_json_pretty()?;
        let name = backup_file_name(chrono::Local::now().date_naive());
        let path = self.fs.download(&name, &json).await?;
        tracing::info!(path = %path.display(), "Backup exported");
        Ok(path)
    }

    /// Drop the held handle and the persisted one
    pub fn forget(&mut self) -> SyncResult<()> {
        self.handle = None;
        self.store.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_file_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(backup_file_name(date), "DulceAlya_Backup_2026-10-19.json");
    }

    #[test]
    fn test_write_outcome_success() {
        assert!(WriteOutcome::WrittenToFile("a".into()).is_success());
        assert!(WriteOutcome::DownloadedAsFallback("a".into()).is_success());
        assert!(!WriteOutcome::Failed("disk full".into()).is_success());
    }
}
