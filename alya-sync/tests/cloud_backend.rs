mod common;

use std::sync::Arc;

use alya_sync::{ApiCredentials, CloudBackend, SyncError};
use common::{FakeDrive, FakeIssuer};

const FOLDER: &str = "Dulce Alya Backup";
const FILE: &str = "DulceAlya_DB.json";

fn backend(drive: &Arc<FakeDrive>, issuer: &Arc<FakeIssuer>) -> CloudBackend {
    CloudBackend::new(drive.clone(), issuer.clone(), FOLDER)
}

async fn signed_in(drive: &Arc<FakeDrive>) -> CloudBackend {
    let mut cloud = backend(drive, &FakeIssuer::granting("tok"));
    cloud.init(ApiCredentials::new("key", "client")).unwrap();
    cloud.sign_in().await.unwrap();
    cloud
}

#[tokio::test]
async fn test_preconditions() {
    let drive = FakeDrive::new();
    let mut cloud = backend(&drive, &FakeIssuer::granting("tok"));

    assert!(matches!(cloud.sign_in().await, Err(SyncError::NotInitialized)));
    assert!(matches!(
        cloud.ensure_folder_exists().await,
        Err(SyncError::NotInitialized)
    ));
    assert!(matches!(
        cloud.init(ApiCredentials::new("", "client")),
        Err(SyncError::MissingCredentials)
    ));

    cloud.init(ApiCredentials::new("key", "client")).unwrap();
    assert!(matches!(cloud.user_info().await, Err(SyncError::NotAuthenticated)));
    assert!(matches!(cloud.load_file(FILE).await, Err(SyncError::NotAuthenticated)));
}

#[tokio::test]
async fn test_sign_in_denied_is_auth_failure() {
    let drive = FakeDrive::new();
    let mut cloud = backend(&drive, &FakeIssuer::denying());
    cloud.init(ApiCredentials::new("key", "client")).unwrap();

    assert!(matches!(cloud.sign_in().await, Err(SyncError::AuthFailure(_))));
    assert!(!cloud.has_token());
}

#[tokio::test]
async fn test_ensure_folder_is_idempotent() {
    let drive = FakeDrive::new();
    let cloud = signed_in(&drive).await;

    let first = cloud.ensure_folder_exists().await.unwrap();
    let second = cloud.ensure_folder_exists().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(drive.folders_named(FOLDER), 1);
    assert_eq!(drive.folder_creates(), 1);
}

#[tokio::test]
async fn test_save_twice_updates_single_file() {
    let drive = FakeDrive::new();
    let cloud = signed_in(&drive).await;

    let first = common::snapshot_with(1, &[]);
    let second = common::snapshot_with(3, &[common::product("1", 12000)]);
    let created = cloud.save_file(&first, FILE).await.unwrap();
    let updated = cloud.save_file(&second, FILE).await.unwrap();

    assert_eq!(created.id, updated.id);
    let files = drive.files_named(FILE);
    assert_eq!(files.len(), 1);
    assert_eq!(drive.update_count(), 1);

    let folder_id = cloud.ensure_folder_exists().await.unwrap();
    assert_eq!(files[0].parents, vec![folder_id]);
    let stored = shared::AppSnapshot::from_json(&files[0].body).unwrap();
    assert_eq!(stored.invoices, second.invoices);
}

#[tokio::test]
async fn test_load_missing_then_uploaded() {
    let drive = FakeDrive::new();
    let cloud = signed_in(&drive).await;
    assert!(cloud.load_file(FILE).await.unwrap().is_none());

    let snapshot = common::snapshot_with(2, &[common::product("1", 12000)]);
    cloud.save_file(&snapshot, FILE).await.unwrap();

    let loaded = cloud.load_file(FILE).await.unwrap().unwrap();
    assert_eq!(loaded.invoices, snapshot.invoices);
    assert_eq!(loaded.products, snapshot.products);
    assert_eq!(loaded.history, snapshot.history);
    assert_eq!(loaded.settings, snapshot.settings);
}

#[tokio::test]
async fn test_file_outside_backup_folder_is_ignored() {
    let drive = FakeDrive::new();
    drive.seed_file("Other Folder", FILE, r#"{"invoices": [], "products": []}"#);
    let cloud = signed_in(&drive).await;

    assert!(cloud.load_file(FILE).await.unwrap().is_none());
    assert_eq!(drive.folders_named(FOLDER), 1);
}

#[tokio::test]
async fn test_invalid_remote_file() {
    let drive = FakeDrive::new();
    drive.seed_file(FOLDER, FILE, r#"{"products": []}"#);
    let cloud = signed_in(&drive).await;

    assert!(matches!(
        cloud.load_file(FILE).await,
        Err(SyncError::InvalidFormat(_))
    ));
}

#[tokio::test]
async fn test_expired_token_is_distinguishable() {
    let drive = FakeDrive::new();
    let cloud = signed_in(&drive).await;
    drive.set_unauthorized(true);

    let err = cloud
        .save_file(&common::snapshot_with(0, &[]), FILE)
        .await
        .unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_sign_out_drops_token() {
    let drive = FakeDrive::new();
    let mut cloud = signed_in(&drive).await;
    assert_eq!(cloud.user_info().await.unwrap().email, "alya@example.com");

    cloud.sign_out();
    assert!(!cloud.has_token());
    assert!(cloud.is_initialized());
    assert!(matches!(cloud.user_info().await, Err(SyncError::NotAuthenticated)));
}
