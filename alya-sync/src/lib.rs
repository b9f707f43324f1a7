//! Dulce Alya sync core
//!
//! Persistence for the shop's point of sale: an always-on local cache, an
//! optional linked snapshot file, and an optional cloud drive backup, tied
//! together by [`SyncOrchestrator`].
//!
//! # 模块结构
//!
//! - `cache` - 本地缓存 (one JSON document per key)
//! - `handle_store` - 文件句柄存储 (redb)
//! - `fs_access` - filesystem capability trait and native implementation
//! - `local_file` - local snapshot file backend
//! - `cloud` - cloud drive backend, drive seam and token issuer
//! - `ledger` - in-memory shop state mirrored to the cache
//! - `orchestrator` - mode state machine, flush routing, background worker
//! - `auth` - staff login gate

pub mod auth;
pub mod cache;
pub mod cloud;
pub mod config;
pub mod error;
pub mod fs_access;
pub mod handle_store;
pub mod ledger;
pub mod local_file;
pub mod logging;
pub mod orchestrator;
pub mod paths;

// Re-exports
pub use auth::LoginGate;
pub use cache::{CacheError, CacheKey, CacheStore};
pub use cloud::{ApiCredentials, CloudBackend, DriveApi, StaticTokenIssuer, TokenIssuer};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use fs_access::{FileHandle, FileSystemAccess, NativeFileSystem, PermissionState};
pub use handle_store::{HandleStore, HandleStoreError};
pub use ledger::Ledger;
pub use local_file::{LocalFileBackend, OpenedSnapshot, WriteOutcome};
pub use orchestrator::{
    CloudAuth, ConnectOutcome, FlushOutcome, FlushTrigger, SkipReason, SyncMode, SyncOrchestrator,
    SyncStatus,
};
pub use paths::DataPaths;

pub use shared::{AppSnapshot, CartItem, CheckoutDetails, Invoice, LoginEvent, Product};
