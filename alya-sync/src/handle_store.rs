//! redb-based session handle store
//!
//! Keeps the single file handle the user linked, across restarts. It lives
//! in its own database rather than the JSON cache so clearing the cache
//! never loses the link.
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `file_handles` | `"db_main_handle"` | JSON-serialized `FileHandle` |

use std::path::{Path, PathBuf};

use redb::{Database, ReadableDatabase, TableDefinition};
use thiserror::Error;

use crate::fs_access::FileHandle;

const HANDLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("file_handles");
const HANDLE_KEY: &str = "db_main_handle";

#[derive(Debug, Error)]
pub enum HandleStoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type HandleStoreResult<T> = Result<T, HandleStoreError>;

/// Single-handle store
///
/// The database is opened per operation and closed right after, so a
/// locked or corrupt file degrades to "no handle" instead of failing
/// startup, and a second session on the same work dir can still read it.
#[derive(Debug, Clone)]
pub struct HandleStore {
    path: PathBuf,
}

impl HandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn database(&self) -> HandleStoreResult<Database> {
        let db = Database::create(&self.path)?;
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(HANDLES_TABLE)?;
        }
        write_txn.commit()?;
        Ok(db)
    }

    /// Overwrite the stored handle
    pub fn save_handle(&self, handle: &FileHandle) -> HandleStoreResult<()> {
        let bytes = serde_json::to_vec(handle)?;
        let db = self.database()?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(HANDLES_TABLE)?;
            table.insert(HANDLE_KEY, bytes.as_slice())?;
        }
        write_txn.commit()?;
        tracing::debug!(path = %handle.path.display(), "File handle persisted");
        Ok(())
    }

    /// Last saved handle, `None` if absent or the store cannot be read
    pub fn get_handle(&self) -> Option<FileHandle> {
        match self.try_get_handle() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Handle store unavailable");
                None
            }
        }
    }

    fn try_get_handle(&self) -> HandleStoreResult<Option<FileHandle>> {
        let db = self.database()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(HANDLES_TABLE)?;
        let Some(guard) = table.get(HANDLE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(guard.value())?))
    }

    pub fn clear(&self) -> HandleStoreResult<()> {
        let db = self.database()?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(HANDLES_TABLE)?;
            table.remove(HANDLE_KEY)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
