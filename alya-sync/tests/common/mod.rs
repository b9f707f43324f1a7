//! Shared test doubles: in-memory filesystem, in-memory drive, scripted token issuer
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alya_sync::{
    FileHandle, FileSystemAccess, PermissionState, SyncConfig, SyncError, SyncOrchestrator,
    SyncResult, TokenIssuer,
};
use async_trait::async_trait;
use drive_client::{DriveAuth, DriveError, DriveFile, DriveResult, FileMetadata, UserInfo};
use shared::{AppSnapshot, CartItem, CheckoutDetails, Invoice, PaymentMethod, Product, ProductCategory};

// ========== Filesystem ==========

pub struct MemoryFs {
    files: Mutex<HashMap<PathBuf, String>>,
    downloads: Mutex<Vec<(String, String)>>,
    selection: Mutex<Option<PathBuf>>,
    permission: Mutex<PermissionState>,
    supports_handles: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Mutex<Duration>,
    writes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            files: Mutex::new(HashMap::new()),
            downloads: Mutex::new(Vec::new()),
            selection: Mutex::new(None),
            permission: Mutex::new(PermissionState::Granted),
            supports_handles: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            write_delay: Mutex::new(Duration::ZERO),
            writes: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn put(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.lock().unwrap().insert(path.into(), contents.into());
    }

    /// Next pick returns this file
    pub fn select(&self, path: impl Into<PathBuf>) {
        *self.selection.lock().unwrap() = Some(path.into());
    }

    pub fn set_permission(&self, state: PermissionState) {
        *self.permission.lock().unwrap() = state;
    }

    pub fn set_supports_handles(&self, supported: bool) {
        self.supports_handles.store(supported, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn snapshot_at(&self, path: impl AsRef<Path>) -> AppSnapshot {
        AppSnapshot::from_json(&self.contents(path).expect("file exists")).unwrap()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_writes(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> Vec<(String, String)> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFs {
    fn supports_handles(&self) -> bool {
        self.supports_handles.load(Ordering::SeqCst)
    }

    async fn pick_file(&self) -> std::io::Result<Option<FileHandle>> {
        let selection = self.selection.lock().unwrap().clone();
        Ok(selection.map(FileHandle::new))
    }

    async fn pick_contents(&self) -> std::io::Result<Option<String>> {
        let selection = self.selection.lock().unwrap().clone();
        Ok(selection.and_then(|path| self.contents(path)))
    }

    async fn query_permission(&self, _handle: &FileHandle) -> PermissionState {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self, _handle: &FileHandle) -> PermissionState {
        *self.permission.lock().unwrap()
    }

    async fn read(&self, handle: &FileHandle) -> std::io::Result<String> {
        self.contents(&handle.path)
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }

    async fn write(&self, handle: &FileHandle, contents: &str) -> std::io::Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(std::io::Error::other("disk full"))
        } else {
            self.put(handle.path.clone(), contents);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn download(&self, file_name: &str, contents: &str) -> std::io::Result<PathBuf> {
        self.downloads
            .lock()
            .unwrap()
            .push((file_name.to_string(), contents.to_string()));
        Ok(PathBuf::from("/downloads").join(file_name))
    }
}

// ========== Drive ==========

#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parents: Vec<String>,
    pub body: String,
    pub trashed: bool,
}

#[derive(Default)]
struct DriveState {
    entries: Vec<RemoteEntry>,
    next_id: usize,
    folder_creates: usize,
    file_creates: usize,
    updates: usize,
}

/// In-memory drive that understands the two query shapes the backend sends
#[derive(Default)]
pub struct FakeDrive {
    state: Mutex<DriveState>,
    unauthorized: AtomicBool,
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let len = text[from..].find(end)?;
    Some(&text[from..from + len])
}

impl FakeDrive {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call fails with 401 while set
    pub fn set_unauthorized(&self, value: bool) {
        self.unauthorized.store(value, Ordering::SeqCst);
    }

    fn check(&self, auth: &DriveAuth) -> DriveResult<()> {
        if self.unauthorized.load(Ordering::SeqCst) || auth.access_token.is_empty() {
            return Err(DriveError::Unauthorized);
        }
        Ok(())
    }

    fn insert(&self, name: &str, mime_type: &str, parents: Vec<String>, body: &str) -> DriveFile {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let entry = RemoteEntry {
            id: format!("id-{}", state.next_id),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            parents,
            body: body.to_string(),
            trashed: false,
        };
        let file = DriveFile {
            id: entry.id.clone(),
            name: Some(entry.name.clone()),
            mime_type: Some(entry.mime_type.clone()),
        };
        state.entries.push(entry);
        file
    }

    /// Seed a folder + file as if a previous install had uploaded it
    pub fn seed_file(&self, folder_name: &str, file_name: &str, body: &str) -> String {
        let folder = self.insert(folder_name, drive_client::FOLDER_MIME_TYPE, Vec::new(), "");
        self.insert(file_name, drive_client::JSON_MIME_TYPE, vec![folder.id.clone()], body)
            .id
    }

    pub fn entries(&self) -> Vec<RemoteEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    pub fn folders_named(&self, name: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.name == name && e.mime_type == drive_client::FOLDER_MIME_TYPE)
            .count()
    }

    pub fn files_named(&self, name: &str) -> Vec<RemoteEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.name == name && e.mime_type != drive_client::FOLDER_MIME_TYPE)
            .collect()
    }

    pub fn folder_creates(&self) -> usize {
        self.state.lock().unwrap().folder_creates
    }

    /// Creates plus in-place updates of files
    pub fn upload_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.file_creates + state.updates
    }

    pub fn update_count(&self) -> usize {
        self.state.lock().unwrap().updates
    }
}

#[async_trait]
impl alya_sync::DriveApi for FakeDrive {
    async fn list_files(&self, auth: &DriveAuth, query: &str) -> DriveResult<Vec<DriveFile>> {
        self.check(auth)?;
        let name = between(query, "name='", "'").unwrap_or_default().to_string();
        let folders_only = query.contains(drive_client::FOLDER_MIME_TYPE);
        let parent = between(query, "and '", "' in parents").map(str::to_string);

        Ok(self
            .entries()
            .into_iter()
            .filter(|e| !e.trashed && e.name == name)
            .filter(|e| !folders_only || e.mime_type == drive_client::FOLDER_MIME_TYPE)
            .filter(|e| parent.as_ref().is_none_or(|p| e.parents.contains(p)))
            .map(|e| DriveFile {
                id: e.id,
                name: Some(e.name),
                mime_type: Some(e.mime_type),
            })
            .collect())
    }

    async fn create_folder(&self, auth: &DriveAuth, name: &str) -> DriveResult<DriveFile> {
        self.check(auth)?;
        self.state.lock().unwrap().folder_creates += 1;
        Ok(self.insert(name, drive_client::FOLDER_MIME_TYPE, Vec::new(), ""))
    }

    async fn create_file(
        &self,
        auth: &DriveAuth,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile> {
        self.check(auth)?;
        self.state.lock().unwrap().file_creates += 1;
        Ok(self.insert(&metadata.name, &metadata.mime_type, metadata.parents.clone(), body))
    }

    async fn update_file(
        &self,
        auth: &DriveAuth,
        file_id: &str,
        metadata: &FileMetadata,
        body: &str,
    ) -> DriveResult<DriveFile> {
        self.check(auth)?;
        assert!(metadata.parents.is_empty(), "parents must not be sent on update");
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == file_id)
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))?;
        entry.body = body.to_string();
        let file = DriveFile {
            id: entry.id.clone(),
            name: Some(entry.name.clone()),
            mime_type: Some(entry.mime_type.clone()),
        };
        state.updates += 1;
        Ok(file)
    }

    async fn download(&self, auth: &DriveAuth, file_id: &str) -> DriveResult<String> {
        self.check(auth)?;
        self.entries()
            .into_iter()
            .find(|e| e.id == file_id)
            .map(|e| e.body)
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }

    async fn user_info(&self, auth: &DriveAuth) -> DriveResult<UserInfo> {
        self.check(auth)?;
        Ok(UserInfo {
            name: "Alya".into(),
            email: "alya@example.com".into(),
            picture: String::new(),
        })
    }
}

// ========== Token issuer ==========

pub struct FakeIssuer {
    token: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeIssuer {
    pub fn granting(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenIssuer for FakeIssuer {
    async fn request_token(&self, _client_id: &str, _scope: &str) -> SyncResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SyncError::AuthFailure("consent denied".into()))
    }
}

// ========== Harness ==========

pub const DB_PATH: &str = "/data/DulceAlya_DB.json";

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub fs: Arc<MemoryFs>,
    pub drive: Arc<FakeDrive>,
    pub issuer: Arc<FakeIssuer>,
    pub orchestrator: SyncOrchestrator,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fs = MemoryFs::new();
        let drive = FakeDrive::new();
        let issuer = FakeIssuer::granting("tok-1");
        let orchestrator = build(dir.path(), &fs, &drive, &issuer);
        Self {
            dir,
            fs,
            drive,
            issuer,
            orchestrator,
        }
    }

    /// A second process on the same work directory and fakes
    pub fn restart(&self) -> SyncOrchestrator {
        build(self.dir.path(), &self.fs, &self.drive, &self.issuer)
    }

    /// Put a valid snapshot file at [`DB_PATH`] and select it
    pub fn offer_file(&self, snapshot: &AppSnapshot) {
        self.fs.put(DB_PATH, snapshot.to_json_pretty().unwrap());
        self.fs.select(DB_PATH);
    }
}

pub fn build(
    dir: &Path,
    fs: &Arc<MemoryFs>,
    drive: &Arc<FakeDrive>,
    issuer: &Arc<FakeIssuer>,
) -> SyncOrchestrator {
    SyncOrchestrator::new(
        SyncConfig::new(dir),
        fs.clone(),
        drive.clone(),
        issuer.clone(),
    )
    .unwrap()
}

// ========== Data ==========

pub fn product(id: &str, price: i64) -> Product {
    Product::new(id, format!("Producto {id}"), ProductCategory::Flavors, price)
}

pub fn invoice(price: i64, quantity: u32) -> Invoice {
    Invoice::from_cart(
        &[CartItem::new(product("p", price), quantity)],
        CheckoutDetails::new(PaymentMethod::Cash),
    )
    .unwrap()
}

pub fn snapshot_with(invoices: usize, products: &[Product]) -> AppSnapshot {
    AppSnapshot::new(
        (0..invoices).map(|i| invoice(1000 * (i as i64 + 1), 1)).collect(),
        products.to_vec(),
        Vec::new(),
        Default::default(),
    )
}
