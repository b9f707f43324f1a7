//! Filesystem capability
//!
//! The sync core never opens user files directly. It goes through a
//! [`FileSystemAccess`] implementation that hands out [`FileHandle`]s,
//! answers permission queries and performs scoped writes. The desktop build
//! uses [`NativeFileSystem`]; tests swap in an in-memory double.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Durable reference to a user-chosen snapshot file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    pub path: PathBuf,
    /// Epoch millis when the user picked the file
    pub granted_at: i64,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            granted_at: shared::util::now_millis(),
        }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Read/write permission on a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    /// Not granted yet, asking may succeed
    Prompt,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Whether the platform can hand out durable handles.
    /// When false, only [`pick_contents`](Self::pick_contents) is usable.
    fn supports_handles(&self) -> bool;

    /// Let the user choose an existing file. `Ok(None)` means cancelled.
    async fn pick_file(&self) -> std::io::Result<Option<FileHandle>>;

    /// Generic file-input fallback: returns the chosen file's text only.
    async fn pick_contents(&self) -> std::io::Result<Option<String>>;

    async fn query_permission(&self, handle: &FileHandle) -> PermissionState;

    /// Ask again (may be interactive on platforms that prompt)
    async fn request_permission(&self, handle: &FileHandle) -> PermissionState;

    async fn read(&self, handle: &FileHandle) -> std::io::Result<String>;

    /// Replace the file's contents. The writer is always closed, on error too.
    async fn write(&self, handle: &FileHandle, contents: &str) -> std::io::Result<()>;

    /// Browser-style download of `contents` as `file_name`. Returns where it landed.
    async fn download(&self, file_name: &str, contents: &str) -> std::io::Result<PathBuf>;
}

/// Desktop filesystem
///
/// There is no OS picker here: the front end resolves the path (argument,
/// dialog, ...) and sets it with [`NativeFileSystem::with_selection`].
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    selection: Option<PathBuf>,
    download_dir: PathBuf,
}

impl NativeFileSystem {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            selection: None,
            download_dir: download_dir.into(),
        }
    }

    /// Path the next `pick_file` / `pick_contents` returns
    pub fn with_selection(mut self, path: impl Into<PathBuf>) -> Self {
        self.selection = Some(path.into());
        self
    }

    fn permission_for(path: &Path) -> PermissionState {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() && !meta.permissions().readonly() => PermissionState::Granted,
            Ok(_) => PermissionState::Denied,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PermissionState::Prompt,
            Err(_) => PermissionState::Denied,
        }
    }
}

#[async_trait]
impl FileSystemAccess for NativeFileSystem {
    fn supports_handles(&self) -> bool {
        true
    }

    async fn pick_file(&self) -> std::io::Result<Option<FileHandle>> {
        let Some(path) = &self.selection else {
            return Ok(None);
        };
        let path = tokio::fs::canonicalize(path).await?;
        Ok(Some(FileHandle::new(path)))
    }

    async fn pick_contents(&self) -> std::io::Result<Option<String>> {
        match &self.selection {
            Some(path) => Ok(Some(tokio::fs::read_to_string(path).await?)),
            None => Ok(None),
        }
    }

    async fn query_permission(&self, handle: &FileHandle) -> PermissionState {
        Self::permission_for(&handle.path)
    }

    async fn request_permission(&self, handle: &FileHandle) -> PermissionState {
        // No prompt on a desktop filesystem; re-check in case it changed
        Self::permission_for(&handle.path)
    }

    async fn read(&self, handle: &FileHandle) -> std::io::Result<String> {
        tokio::fs::read_to_string(&handle.path).await
    }

    async fn write(&self, handle: &FileHandle, contents: &str) -> std::io::Result<()> {
        let path = handle.path.clone();
        let contents = contents.to_owned();
        tokio::task::spawn_blocking(move || write_replace(&path, contents.as_bytes()))
            .await
            .map_err(std::io::Error::other)?
    }

    async fn download(&self, file_name: &str, contents: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(file_name);
        let target = path.clone();
        let contents = contents.to_owned();
        tokio::task::spawn_blocking(move || write_replace(&target, contents.as_bytes()))
            .await
            .map_err(std::io::Error::other)??;
        Ok(path)
    }
}

/// Temp file next to the target, fsync, rename over it
fn write_replace(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
