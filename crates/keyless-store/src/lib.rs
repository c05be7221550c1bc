//! Badge datastores for the keyless access controller.
//!
//! The controller asks one question of a datastore: may this badge open the
//! door? That question is the [`Authorizer`] trait. Administration (listing,
//! adding, enabling and removing badges) goes through [`BadgeStore`].
//!
//! Two stores are provided:
//!
//! - [`TextFileStore`] - a read-only list with one badge id per line
//! - [`SqliteStore`] - a SQLite database with embedded migrations
//!
//! [`AnyStore`] picks one at runtime from a [`DatastoreConfig`].
//!
//! # Examples
//!
//! ```no_run
//! use keyless_core::BadgeId;
//! use keyless_store::{AnyStore, Authorizer, DatastoreConfig, DatastoreKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatastoreConfig {
//!     kind: DatastoreKind::TextFile,
//!     path: "/etc/keyless/ids.txt".into(),
//! };
//! let store = AnyStore::open(&config).await?;
//!
//! if store.check(&BadgeId::new("8604de7d")?).await? {
//!     println!("access granted");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failing Closed
//!
//! Callers must treat every [`StoreError`] from [`Authorizer::check`] as a
//! denial.

#![allow(async_fn_in_trait)]

pub mod error;
pub mod models;
pub mod sqlite;
pub mod text_file;

pub use error::{StoreError, StoreResult};
pub use models::Badge;
pub use sqlite::SqliteStore;
pub use text_file::TextFileStore;

use keyless_core::{BadgeId, BadgeKind};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;

/// Decides whether a badge may open the door.
///
/// The returned future is `Send` so the decision can be awaited from a
/// spawned task.
pub trait Authorizer: Send + Sync {
    /// Check whether `id` is currently allowed.
    fn check(&self, id: &BadgeId) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Badge administration.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate.
pub trait BadgeStore: Send + Sync {
    /// Whether `id` exists and is enabled.
    async fn has_access(&self, id: &BadgeId) -> StoreResult<bool>;

    /// All badges, enabled or not.
    async fn list_badges(&self) -> StoreResult<Vec<Badge>>;

    /// Look up one badge.
    async fn get_badge(&self, id: &BadgeId) -> StoreResult<Badge>;

    /// Add a badge.
    async fn create_badge(&self, id: &BadgeId, kind: BadgeKind, enabled: bool)
    -> StoreResult<Badge>;

    /// Allow a badge again.
    async fn enable_badge(&self, id: &BadgeId) -> StoreResult<()>;

    /// Stop a badge from opening the door without forgetting it.
    async fn disable_badge(&self, id: &BadgeId) -> StoreResult<()>;

    /// Remove a badge.
    async fn delete_badge(&self, id: &BadgeId) -> StoreResult<()>;
}

/// Which datastore backs the controller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatastoreKind {
    /// [`TextFileStore`]
    #[default]
    TextFile,

    /// [`SqliteStore`]
    Sqlite,
}

/// Datastore selection and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreConfig {
    #[serde(default)]
    pub kind: DatastoreKind,

    /// Badge list file or database file.
    pub path: PathBuf,
}

/// Enum wrapper for datastore dispatch.
#[derive(Debug, Clone)]
pub enum AnyStore {
    TextFile(TextFileStore),
    Sqlite(SqliteStore),
}

impl AnyStore {
    /// Open the datastore described by `config`.
    ///
    /// A missing SQLite database is an error here.
    ///
    /// # Errors
    ///
    /// Returns the underlying store's error if it cannot be opened.
    pub async fn open(config: &DatastoreConfig) -> StoreResult<Self> {
        match config.kind {
            DatastoreKind::TextFile => Ok(Self::TextFile(TextFileStore::open(&config.path).await?)),
            DatastoreKind::Sqlite => Ok(Self::Sqlite(SqliteStore::open(&config.path).await?)),
        }
    }

    /// Like [`open`](Self::open), but creates a missing SQLite database.
    ///
    /// Used by administration commands so the first `badge add` can set up a
    /// fresh deployment. A text file list is never created.
    pub async fn open_or_create(config: &DatastoreConfig) -> StoreResult<Self> {
        match config.kind {
            DatastoreKind::TextFile => Ok(Self::TextFile(TextFileStore::open(&config.path).await?)),
            DatastoreKind::Sqlite => Ok(Self::Sqlite(SqliteStore::create(&config.path).await?)),
        }
    }

    /// Release the store.
    pub async fn close(&self) {
        if let Self::Sqlite(store) = self {
            store.close().await;
        }
    }
}

impl BadgeStore for AnyStore {
    async fn has_access(&self, id: &BadgeId) -> StoreResult<bool> {
        match self {
            Self::TextFile(store) => store.has_access(id).await,
            Self::Sqlite(store) => store.has_access(id).await,
        }
    }

    async fn list_badges(&self) -> StoreResult<Vec<Badge>> {
        match self {
            Self::TextFile(store) => store.list_badges().await,
            Self::Sqlite(store) => store.list_badges().await,
        }
    }

    async fn get_badge(&self, id: &BadgeId) -> StoreResult<Badge> {
        match self {
            Self::TextFile(store) => store.get_badge(id).await,
            Self::Sqlite(store) => store.get_badge(id).await,
        }
    }

    async fn create_badge(
        &self,
        id: &BadgeId,
        kind: BadgeKind,
        enabled: bool,
    ) -> StoreResult<Badge> {
        match self {
            Self::TextFile(store) => store.create_badge(id, kind, enabled).await,
            Self::Sqlite(store) => store.create_badge(id, kind, enabled).await,
        }
    }

    async fn enable_badge(&self, id: &BadgeId) -> StoreResult<()> {
        match self {
            Self::TextFile(store) => store.enable_badge(id).await,
            Self::Sqlite(store) => store.enable_badge(id).await,
        }
    }

    async fn disable_badge(&self, id: &BadgeId) -> StoreResult<()> {
        match self {
            Self::TextFile(store) => store.disable_badge(id).await,
            Self::Sqlite(store) => store.disable_badge(id).await,
        }
    }

    async fn delete_badge(&self, id: &BadgeId) -> StoreResult<()> {
        match self {
            Self::TextFile(store) => store.delete_badge(id).await,
            Self::Sqlite(store) => store.delete_badge(id).await,
        }
    }
}

impl Authorizer for AnyStore {
    async fn check(&self, id: &BadgeId) -> StoreResult<bool> {
        match self {
            Self::TextFile(store) => store.check(id).await,
            Self::Sqlite(store) => store.check(id).await,
        }
    }
}
