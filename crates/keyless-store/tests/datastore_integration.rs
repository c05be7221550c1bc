//! Integration tests for opening datastores from configuration.
//!
//! Run with: cargo test --package keyless-store --test datastore_integration

use keyless_core::{BadgeId, BadgeKind};
use keyless_store::{
    AnyStore, Authorizer, BadgeStore, DatastoreConfig, DatastoreKind, SqliteStore, StoreError,
};

fn id(s: &str) -> BadgeId {
    BadgeId::new(s).unwrap()
}

#[tokio::test]
async fn test_text_file_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.txt");
    std::fs::write(&path, "# members\n8604DE7D\na1b2\n").unwrap();

    let store = AnyStore::open(&DatastoreConfig {
        kind: DatastoreKind::TextFile,
        path,
    })
    .await
    .unwrap();

    assert!(store.check(&id("8604de7d")).await.unwrap());
    assert!(store.check(&id("a1b2")).await.unwrap());
    assert!(!store.check(&id("c3d4")).await.unwrap());
    assert!(matches!(
        store.create_badge(&id("c3d4"), BadgeKind::Card, true).await,
        Err(StoreError::Unsupported { .. })
    ));
}

#[tokio::test]
async fn test_sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatastoreConfig {
        kind: DatastoreKind::Sqlite,
        path: dir.path().join("nested").join("badges.db"),
    };

    let store = AnyStore::open_or_create(&config).await.unwrap();
    store
        .create_badge(&id("a1b2"), BadgeKind::Card, true)
        .await
        .unwrap();
    store
        .create_badge(&id("c3d4"), BadgeKind::Sticker, false)
        .await
        .unwrap();
    store.close().await;

    let reopened = AnyStore::open(&config).await.unwrap();
    assert!(reopened.check(&id("a1b2")).await.unwrap());
    assert!(!reopened.check(&id("c3d4")).await.unwrap());
    assert_eq!(reopened.list_badges().await.unwrap().len(), 2);
    reopened.close().await;
}

#[tokio::test]
async fn test_reopen_reapplies_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("badges.db");

    let store = SqliteStore::create(&path).await.unwrap();
    store
        .create_badge(&id("8604de7d"), BadgeKind::Keychain, true)
        .await
        .unwrap();
    store.close().await;

    for _ in 0..2 {
        let store = SqliteStore::open(&path).await.unwrap();
        assert_eq!(store.list_badges().await.unwrap().len(), 1);
        store.close().await;
    }
}

#[tokio::test]
async fn test_open_missing_database_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatastoreConfig {
        kind: DatastoreKind::Sqlite,
        path: dir.path().join("absent.db"),
    };

    assert!(AnyStore::open(&config).await.is_err());
    assert!(!config.path.exists());
}

#[tokio::test]
async fn test_text_file_list_is_never_created() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatastoreConfig {
        kind: DatastoreKind::TextFile,
        path: dir.path().join("ids.txt"),
    };

    assert!(matches!(
        AnyStore::open_or_create(&config).await,
        Err(StoreError::Io { .. })
    ));
}

#[tokio::test]
async fn test_datastore_config_deserializes_kind() {
    let config: DatastoreConfig =
        serde_json::from_str(r#"{"kind": "sqlite", "path": "/var/lib/keyless/badges.db"}"#)
            .unwrap();
    assert_eq!(config.kind, DatastoreKind::Sqlite);

    let config: DatastoreConfig = serde_json::from_str(r#"{"path": "ids.txt"}"#).unwrap();
    assert_eq!(config.kind, DatastoreKind::TextFile);
}
