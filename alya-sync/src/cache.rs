//! CacheStore - 本地缓存
//!
//! Always-on mirror of every mutation, one JSON document per key. This is
//! what the front end shows after a restart, independent of any backend.
//!
//! Reads never fail: a missing, unreadable or malformed entry yields the
//! caller's default. Corrupt cache state must never take the POS down.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Independently encoded cache entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Invoices,
    Products,
    History,
    Settings,
    Cart,
    DriveUser,
    SyncMode,
    ApiConfig,
}

impl CacheKey {
    pub const ALL: [CacheKey; 8] = [
        CacheKey::Invoices,
        CacheKey::Products,
        CacheKey::History,
        CacheKey::Settings,
        CacheKey::Cart,
        CacheKey::DriveUser,
        CacheKey::SyncMode,
        CacheKey::ApiConfig,
    ];

    /// Storage name, shared with the shop's web client
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Invoices => "dulce_alya_invoices",
            CacheKey::Products => "dulce_alya_products",
            CacheKey::History => "dulce_alya_login_history",
            CacheKey::Settings => "dulce_alya_settings",
            CacheKey::Cart => "dulce_alya_cart",
            CacheKey::DriveUser => "dulce_alya_drive_user",
            CacheKey::SyncMode => "dulce_alya_sync_mode",
            CacheKey::ApiConfig => "dulce_alya_api_config",
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File-backed key/value cache
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open (and create) the cache directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Serialize `value` and atomically replace the entry
    pub fn write<T: Serialize + ?Sized>(&self, key: CacheKey, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_vec(value)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.entry_path(key)).map_err(|e| e.error)?;

        tracing::trace!(key = %key, bytes = json.len(), "Cache entry written");
        Ok(())
    }

    /// Decode the entry, or `None` when it is absent or malformed
    pub fn get<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let path = self.entry_path(key);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache entry unreadable, using default");
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache entry malformed, using default");
                None
            }
        }
    }

    /// Decode the entry, falling back to `default`
    pub fn read<T: DeserializeOwned>(&self, key: CacheKey, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: CacheKey) -> bool {
        self.entry_path(key).exists()
    }

    pub fn remove(&self, key: CacheKey) -> Result<(), CacheError> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
