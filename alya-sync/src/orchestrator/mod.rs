//! SyncOrchestrator - 同步编排
//!
//! Owns the ledger, the file handle and the cloud token, and decides where
//! a flush goes. The UI only talks to this type.
//!
//! ```text
//!            connect_local()             connect_cloud()
//!   ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//!   │  LocalFile   │ ◀─── │ Disconnected │ ───▶ │    Cloud     │
//!   └──────────────┘      └──────────────┘      └──────────────┘
//!          └── disconnect_local() ─┘ └─ disconnect_cloud() ──┘
//! ```
//!
//! Every flush (debounced, scheduled, manual, connect bootstrap) runs under
//! one writer lock. Lock order: writer lock, backend (`local` / `cloud`),
//! then the short-lived `state` and `ledger` locks, which are never held
//! across an await.

mod types;
mod worker;

pub use types::{
    CloudAuth, ConnectOutcome, FlushOutcome, FlushTrigger, SkipReason, SyncMode, SyncStatus,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use drive_client::{DriveClient, UserInfo};
use parking_lot::{Mutex, RwLock};
use shared::models::Settings;
use shared::{AppSnapshot, CartItem, CheckoutDetails, Invoice, LoginEvent, Product};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::LoginGate;
use crate::cache::{CacheKey, CacheStore};
use crate::cloud::{ApiCredentials, CloudBackend, DriveApi, StaticTokenIssuer, TokenIssuer};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::fs_access::{FileSystemAccess, NativeFileSystem};
use crate::handle_store::HandleStore;
use crate::ledger::Ledger;
use crate::local_file::{LocalFileBackend, WriteOutcome};
use worker::SyncWorker;

#[derive(Debug, Clone, Copy, Default)]
struct SessionState {
    mode: SyncMode,
    cloud_auth: CloudAuth,
    has_handle: bool,
}

struct Inner {
    config: SyncConfig,
    cache: CacheStore,
    gate: LoginGate,
    ledger: Mutex<Ledger>,
    state: RwLock<SessionState>,
    local: tokio::sync::Mutex<LocalFileBackend>,
    cloud: tokio::sync::Mutex<CloudBackend>,
    /// Single-writer guard around every flush
    writer: tokio::sync::Mutex<()>,
    saving: AtomicBool,
    /// Epoch millis, 0 = never
    last_saved_at: AtomicI64,
    changes_tx: mpsc::UnboundedSender<()>,
    changes_rx: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Raised while a flush is writing; lowered on every exit path
struct SavingFlag<'a>(&'a AtomicBool);

impl<'a> SavingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for SavingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sync context, cheap to clone
///
/// The background worker holds a clone, so [`shutdown`](Self::shutdown)
/// must be called to release it.
#[derive(Clone)]
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
}

impl SyncOrchestrator {
    pub fn new(
        config: SyncConfig,
        fs: Arc<dyn FileSystemAccess>,
        drive: Arc<dyn DriveApi>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> SyncResult<Self> {
        let paths = config.paths();
        std::fs::create_dir_all(paths.base())?;
        let cache = CacheStore::open(paths.cache_dir())?;
        let handles = HandleStore::new(paths.handles_db());
        let ledger = Ledger::load(cache.clone());

        let mut cloud = CloudBackend::new(drive, issuer, config.cloud_folder_name.clone());
        if let Some(credentials) = cache.get::<ApiCredentials>(CacheKey::ApiConfig) {
            if let Err(e) = cloud.init(credentials) {
                tracing::debug!(error = %e, "Stored cloud credentials incomplete, ignored");
            }
        }

        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let inner = Inner {
            gate: LoginGate::from_config(&config),
            cache,
            ledger: Mutex::new(ledger),
            state: RwLock::new(SessionState::default()),
            local: tokio::sync::Mutex::new(LocalFileBackend::new(fs, handles)),
            cloud: tokio::sync::Mutex::new(cloud),
            writer: tokio::sync::Mutex::new(()),
            saving: AtomicBool::new(false),
            last_saved_at: AtomicI64::new(0),
            changes_tx,
            changes_rx: Mutex::new(Some(changes_rx)),
            shutdown: CancellationToken::new(),
            worker: Mutex::new(None),
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Desktop wiring: native filesystem, HTTP drive client, env token.
    ///
    /// `selection` is the file the next local connect opens.
    pub fn with_native(config: SyncConfig, selection: Option<PathBuf>) -> SyncResult<Self> {
        let mut fs = NativeFileSystem::new(&config.download_dir);
        if let Some(path) = selection {
            fs = fs.with_selection(path);
        }
        let drive = DriveClient::new(config.drive.clone())?;
        Self::new(
            config,
            Arc::new(fs),
            Arc::new(drive),
            Arc::new(StaticTokenIssuer::from_env()),
        )
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    // ========== Lifecycle ==========

    /// Restore the previous session and spawn the background worker
    pub async fn start(&self) {
        if self.inner.worker.lock().is_some() {
            return;
        }
        self.restore_session().await;

        let Some(changes) = self.inner.changes_rx.lock().take() else {
            tracing::warn!("Sync orchestrator already shut down, worker not started");
            return;
        };
        let worker = SyncWorker::new(self.clone(), changes, self.inner.shutdown.clone());
        let handle = tokio::spawn(worker.run());
        *self.inner.worker.lock() = Some(handle);
    }

    /// Stop timers, flush a pending debounced change, wait for the worker
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let handle = self.inner.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Sync worker terminated abnormally: {e}");
            }
        }
    }

    async fn restore_session(&self) {
        let stored = self.inner.cache.read(CacheKey::SyncMode, SyncMode::Disconnected);
        let has_handle = self.inner.local.lock().await.restore();

        let mut state = self.inner.state.write();
        state.has_handle = has_handle;
        match stored {
            SyncMode::Disconnected => {}
            SyncMode::LocalFile if has_handle => {
                state.mode = SyncMode::LocalFile;
                tracing::info!("Restored local file session, permission checked before first write");
            }
            SyncMode::LocalFile => {
                tracing::warn!("Local file mode stored but no handle found, staying disconnected");
            }
            SyncMode::Cloud => {
                state.mode = SyncMode::Cloud;
                state.cloud_auth = CloudAuth::ReauthRequired;
                tracing::info!("Restored cloud mode, sign-in required before the next upload");
            }
        }
    }

    // ========== Status ==========

    pub fn mode(&self) -> SyncMode {
        self.inner.state.read().mode
    }

    pub fn is_saving(&self) -> bool {
        self.inner.saving.load(Ordering::SeqCst)
    }

    pub fn sync_status(&self) -> SyncStatus {
        let state = *self.inner.state.read();
        let last = self.inner.last_saved_at.load(Ordering::SeqCst);
        SyncStatus {
            mode: state.mode,
            has_handle: state.has_handle,
            is_saving: self.is_saving(),
            needs_reauth: state.mode == SyncMode::Cloud
                && state.cloud_auth == CloudAuth::ReauthRequired,
            last_saved_at: (last > 0).then_some(last),
        }
    }

    /// Cached drive profile of the signed-in account
    pub fn drive_user(&self) -> Option<UserInfo> {
        self.inner.cache.get(CacheKey::DriveUser)
    }

    /// Credentials entered on a previous connect
    pub fn stored_credentials(&self) -> Option<ApiCredentials> {
        self.inner.cache.get(CacheKey::ApiConfig)
    }

    fn set_mode(&self, mode: SyncMode) {
        self.inner.state.write().mode = mode;
        if let Err(e) = self.inner.cache.write(CacheKey::SyncMode, &mode) {
            tracing::warn!(%mode, error = %e, "Failed to persist sync mode");
        }
    }

    fn mark_saved(&self) {
        self.inner
            .last_saved_at
            .store(shared::util::now_millis(), Ordering::SeqCst);
    }

    // ========== Local file ==========

    /// Link the local snapshot file.
    ///
    /// A held handle that is still writable is reused as is. Otherwise the
    /// user picks a file, whose contents replace the cached state.
    pub async fn connect_local(&self) -> SyncResult<ConnectOutcome> {
        let _writer = self.inner.writer.lock().await;
        let mut local = self.inner.local.lock().await;

        if let Some(handle) = local.handle().cloned() {
            if local.verify_permission().await {
                self.set_mode(SyncMode::LocalFile);
                tracing::info!(path = %handle.path.display(), "Local file reconnected");
                return Ok(ConnectOutcome::Reconnected(handle.path));
            }
        }

        let opened = local.pick_and_open().await?;
        self.inner.ledger.lock().replace(opened.snapshot)?;

        // Without a handle there is nothing to write back to; detach so the
        // imported data is never auto-pushed to another backend
        let Some(handle) = opened.handle else {
            if self.mode() != SyncMode::Disconnected {
                self.inner.state.write().cloud_auth = CloudAuth::default();
                self.set_mode(SyncMode::Disconnected);
            }
            tracing::info!("Snapshot loaded without a handle, session detached");
            return Ok(ConnectOutcome::ImportedWithoutHandle);
        };

        self.inner.state.write().has_handle = true;
        self.set_mode(SyncMode::LocalFile);
        tracing::info!(path = %handle.path.display(), "Local file connected");
        Ok(ConnectOutcome::Opened(handle.path))
    }

    /// Unlink the local file and forget the stored handle
    pub async fn disconnect_local(&self) -> SyncResult<()> {
        let _writer = self.inner.writer.lock().await;
        self.inner.local.lock().await.forget()?;

        self.inner.state.write().has_handle = false;
        if self.mode() == SyncMode::LocalFile {
            self.set_mode(SyncMode::Disconnected);
        }
        tracing::info!("Local file disconnected");
        Ok(())
    }

    /// Download a dated backup copy, regardless of the mode
    pub async fn export_backup(&self) -> SyncResult<PathBuf> {
        let snapshot = self.snapshot();
        self.inner.local.lock().await.download_backup(&snapshot).await
    }

    /// Replace all data with a snapshot file, without linking it
    pub async fn import_file(&self, path: &Path) -> SyncResult<()> {
        let text = tokio::fs::read_to_string(path).await?;
        let snapshot = AppSnapshot::from_json(&text)?;
        {
            let _writer = self.inner.writer.lock().await;
            self.inner.ledger.lock().replace(snapshot)?;
        }
        tracing::info!(path = %path.display(), "Snapshot imported");
        self.notify_change();
        Ok(())
    }

    // ========== Cloud ==========

    /// Sign in and adopt the cloud copy, or seed it from local state.
    ///
    /// Failures leave the current mode untouched.
    pub async fn connect_cloud(&self, credentials: ApiCredentials) -> SyncResult<ConnectOutcome> {
        let _writer = self.inner.writer.lock().await;
        let mut cloud = self.inner.cloud.lock().await;

        cloud.init(credentials.clone())?;
        if let Err(e) = self.inner.cache.write(CacheKey::ApiConfig, &credentials) {
            tracing::warn!(error = %e, "Failed to cache cloud credentials");
        }
        cloud.sign_in().await?;
        self.store_profile(&cloud).await;

        let file_name = self.inner.config.cloud_file_name.clone();
        let loaded = {
            let _saving = SavingFlag::raise(&self.inner.saving);
            match cloud.load_file(&file_name).await {
                Ok(Some(snapshot)) => {
                    self.inner.ledger.lock().replace(snapshot)?;
                    Ok(ConnectOutcome::RemoteLoaded)
                }
                Ok(None) => {
                    let snapshot = self.snapshot();
                    match cloud.save_file(&snapshot, &file_name).await {
                        Ok(_) => {
                            self.mark_saved();
                            Ok(ConnectOutcome::RemoteBootstrapped)
                        }
                        Err(e) => Err(e),
                    }
                }
                Err(e) => Err(e),
            }
        };

        let outcome = match loaded {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_auth_expired() {
                    cloud.sign_out();
                }
                tracing::warn!(error = %e, "Cloud connect failed, mode unchanged");
                return Err(e);
            }
        };

        {
            let mut state = self.inner.state.write();
            state.cloud_auth = CloudAuth::Authenticated;
        }
        self.set_mode(SyncMode::Cloud);
        tracing::info!(?outcome, "Cloud connected");
        Ok(outcome)
    }

    /// Sign in again with the stored credentials (restored or expired session)
    pub async fn reauthenticate_cloud(&self) -> SyncResult<()> {
        {
            let _writer = self.inner.writer.lock().await;
            let mut cloud = self.inner.cloud.lock().await;
            cloud.sign_in().await?;
            self.store_profile(&cloud).await;
            self.inner.state.write().cloud_auth = CloudAuth::Authenticated;
        }
        tracing::info!("Cloud session re-authenticated");
        // Anything skipped while signed out goes up now
        self.notify_change();
        Ok(())
    }

    /// Drop the token and profile; back to cache only
    pub async fn disconnect_cloud(&self) -> SyncResult<()> {
        let _writer = self.inner.writer.lock().await;
        self.inner.cloud.lock().await.sign_out();
        self.inner.cache.remove(CacheKey::DriveUser)?;

        if self.mode() == SyncMode::Cloud {
            self.inner.state.write().cloud_auth = CloudAuth::default();
            self.set_mode(SyncMode::Disconnected);
        }
        tracing::info!("Cloud disconnected");
        Ok(())
    }

    async fn store_profile(&self, cloud: &CloudBackend) {
        match cloud.user_info().await {
            Ok(user) => {
                if let Err(e) = self.inner.cache.write(CacheKey::DriveUser, &user) {
                    tracing::warn!(error = %e, "Failed to cache drive profile");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to fetch drive profile"),
        }
    }

    // ========== Flush ==========

    /// Save now, bypassing the debounce.
    ///
    /// With nothing linked, the snapshot is downloaded instead.
    pub async fn manual_save(&self) -> FlushOutcome {
        self.flush(FlushTrigger::Manual).await
    }

    pub(crate) async fn flush(&self, trigger: FlushTrigger) -> FlushOutcome {
        let _writer = match trigger {
            FlushTrigger::Scheduled => match self.inner.writer.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::debug!(%trigger, "Flush skipped, another one is running");
                    return FlushOutcome::Skipped(SkipReason::Busy);
                }
            },
            _ => self.inner.writer.lock().await,
        };
        let _saving = SavingFlag::raise(&self.inner.saving);

        let outcome = self.flush_locked(trigger).await;
        match &outcome {
            FlushOutcome::WrittenToFile(_)
            | FlushOutcome::DownloadedAsFallback(_)
            | FlushOutcome::Uploaded => {
                self.mark_saved();
                tracing::debug!(%trigger, ?outcome, "Snapshot flushed");
            }
            FlushOutcome::Skipped(reason @ (SkipReason::NotConnected | SkipReason::Busy)) => {
                tracing::debug!(%trigger, %reason, "Flush skipped");
            }
            FlushOutcome::Skipped(reason) => {
                tracing::warn!(%trigger, %reason, "Flush skipped");
            }
            FlushOutcome::Failed(reason) => {
                tracing::warn!(%trigger, %reason, "Flush failed");
            }
        }
        outcome
    }

    /// Route one flush to the active backend; caller holds the writer lock
    async fn flush_locked(&self, trigger: FlushTrigger) -> FlushOutcome {
        let state = *self.inner.state.read();
        match state.mode {
            SyncMode::Disconnected if trigger == FlushTrigger::Manual => {
                let snapshot = self.snapshot();
                match self.inner.local.lock().await.download_backup(&snapshot).await {
                    Ok(path) => FlushOutcome::DownloadedAsFallback(path),
                    Err(e) => FlushOutcome::Failed(e.to_string()),
                }
            }
            SyncMode::Disconnected => FlushOutcome::Skipped(SkipReason::NotConnected),
            SyncMode::LocalFile => {
                let local = self.inner.local.lock().await;
                if !local.verify_permission().await {
                    return FlushOutcome::Skipped(SkipReason::PermissionRevoked);
                }
                // Taken after the permission check so the latest state goes out
                let snapshot = self.snapshot();
                match local.write(&snapshot).await {
                    WriteOutcome::WrittenToFile(path) => FlushOutcome::WrittenToFile(path),
                    WriteOutcome::DownloadedAsFallback(path) => {
                        FlushOutcome::DownloadedAsFallback(path)
                    }
                    WriteOutcome::Failed(reason) => FlushOutcome::Failed(reason),
                }
            }
            SyncMode::Cloud if state.cloud_auth == CloudAuth::ReauthRequired => {
                FlushOutcome::Skipped(SkipReason::ReauthRequired)
            }
            SyncMode::Cloud => {
                let mut cloud = self.inner.cloud.lock().await;
                let snapshot = self.snapshot();
                match cloud.save_file(&snapshot, &self.inner.config.cloud_file_name).await {
                    Ok(_) => FlushOutcome::Uploaded,
                    Err(e) if e.is_auth_expired() => {
                        cloud.sign_out();
                        self.inner.state.write().cloud_auth = CloudAuth::ReauthRequired;
                        tracing::warn!("Drive rejected the token, re-authentication required");
                        FlushOutcome::Failed(e.to_string())
                    }
                    Err(SyncError::NotAuthenticated) => {
                        self.inner.state.write().cloud_auth = CloudAuth::ReauthRequired;
                        FlushOutcome::Skipped(SkipReason::ReauthRequired)
                    }
                    Err(e) => FlushOutcome::Failed(e.to_string()),
                }
            }
        }
    }

    /// Arm the debounce (the worker ignores it while disconnected)
    fn notify_change(&self) {
        if self.inner.changes_tx.send(()).is_err() {
            tracing::trace!("Change dropped, worker gone");
        }
    }

    // ========== Ledger ==========

    pub fn snapshot(&self) -> AppSnapshot {
        self.inner.ledger.lock().snapshot()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.inner.ledger.lock().invoices().to_vec()
    }

    pub fn products(&self) -> Vec<Product> {
        self.inner.ledger.lock().products().to_vec()
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.inner.ledger.lock().product(id).cloned()
    }

    pub fn history(&self) -> Vec<LoginEvent> {
        self.inner.ledger.lock().history().to_vec()
    }

    pub fn settings(&self) -> Settings {
        self.inner.ledger.lock().settings().clone()
    }

    pub fn cart(&self) -> Vec<CartItem> {
        self.inner.ledger.lock().cart().to_vec()
    }

    pub fn add_invoice(&self, invoice: Invoice) -> SyncResult<()> {
        self.inner.ledger.lock().add_invoice(invoice)?;
        self.notify_change();
        Ok(())
    }

    /// Bill the cart, record the invoice and empty the open cart
    pub fn checkout(&self, cart: &[CartItem], details: CheckoutDetails) -> SyncResult<Invoice> {
        let invoice = Invoice::from_cart(cart, details)?;
        {
            let mut ledger = self.inner.ledger.lock();
            ledger.add_invoice(invoice.clone())?;
            // The sale is recorded; a stale cart is only cosmetic
            if let Err(e) = ledger.set_cart(Vec::new()) {
                tracing::warn!(error = %e, "Failed to clear the cart after checkout");
            }
        }
        tracing::info!(folio = %invoice.folio, total = invoice.total, "Invoice recorded");
        self.notify_change();
        Ok(invoice)
    }

    pub fn upsert_product(&self, product: Product) -> SyncResult<()> {
        self.inner.ledger.lock().upsert_product(product)?;
        self.notify_change();
        Ok(())
    }

    pub fn delete_product(&self, id: &str) -> SyncResult<bool> {
        let removed = self.inner.ledger.lock().delete_product(id)?;
        if removed {
            self.notify_change();
        }
        Ok(removed)
    }

    pub fn record_login(&self, event: LoginEvent) -> SyncResult<()> {
        self.inner.ledger.lock().record_login(event)?;
        self.notify_change();
        Ok(())
    }

    /// Check staff credentials; the attempt is logged either way
    pub fn login(&self, user: &str, password: &str) -> SyncResult<LoginEvent> {
        let event = self.inner.gate.attempt(user, password);
        self.record_login(event.clone())?;
        Ok(event)
    }

    /// Cached only; settings changes do not arm the debounce
    pub fn update_settings(&self, settings: Settings) -> SyncResult<()> {
        self.inner.ledger.lock().update_settings(settings)
    }

    /// Cached only, never part of a snapshot
    pub fn set_cart(&self, cart: Vec<CartItem>) -> SyncResult<()> {
        self.inner.ledger.lock().set_cart(cart)
    }
}
