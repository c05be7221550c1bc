use crate::error::{StoreError, StoreResult};
use crate::models::Badge;
use crate::{Authorizer, BadgeStore};
use keyless_core::{BadgeId, BadgeKind};
use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Pool size. The dispatcher issues one lookup at a time; the second
/// connection serves an administration command run against a live database.
const POOL_SIZE: u32 = 2;

/// Badge datastore backed by a SQLite database.
///
/// # Example
///
/// ```no_run
/// use keyless_core::{BadgeId, BadgeKind};
/// use keyless_store::{BadgeStore, SqliteStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::create("/var/lib/keyless/badges.db").await?;
///
/// let id = BadgeId::new("8604de7d")?;
/// store.create_badge(&id, BadgeKind::Card, true).await?;
/// assert!(store.has_access(&id).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open an existing badge database and apply pending migrations.
    ///
    /// A missing file is an error, so a mistyped path cannot start the
    /// controller against an empty badge list.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::connect(path.as_ref(), false).await
    }

    /// Open the badge database at `path`, creating the file and its
    /// directory when they are missing.
    pub async fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        Self::connect(path, true).await
    }

    /// Create an in-memory database (primarily for testing)
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to `:memory:` is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::migrated(pool).await
    }

    async fn connect(path: &Path, create: bool) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_SIZE)
            .connect_with(options)
            .await?;

        let store = Self::migrated(pool).await?;
        info!(path = %path.display(), "opened badge database");
        Ok(store)
    }

    async fn migrated(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Close the connection pool, waiting for active connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn set_enabled(&self, id: &BadgeId, enabled: bool) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE badges
            SET enabled = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(enabled)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::BadgeNotFound(id.to_string()));
        }

        debug!(badge_id = %id, enabled, "updated badge");
        Ok(())
    }
}

impl BadgeStore for SqliteStore {
    async fn has_access(&self, id: &BadgeId) -> StoreResult<bool> {
        let enabled: Option<(bool,)> = sqlx::query_as("SELECT enabled FROM badges WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(matches!(enabled, Some((true,))))
    }

    async fn list_badges(&self) -> StoreResult<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>(
            r#"
            SELECT id, kind, enabled, created_at, updated_at
            FROM badges
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    async fn get_badge(&self, id: &BadgeId) -> StoreResult<Badge> {
        sqlx::query_as::<_, Badge>(
            r#"
            SELECT id, kind, enabled, created_at, updated_at
            FROM badges
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::BadgeNotFound(id.to_string()))
    }

    async fn create_badge(&self, id: &BadgeId, kind: BadgeKind, enabled: bool) -> StoreResult<Badge> {
        let result = sqlx::query_as::<_, Badge>(
            r#"
            INSERT INTO badges (id, kind, enabled)
            VALUES (?, ?, ?)
            RETURNING id, kind, enabled, created_at, updated_at
            "#,
        )
        .bind(id.as_str())
        .bind(kind.as_str())
        .bind(enabled)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(badge) => {
                debug!(badge_id = %id, %kind, enabled, "created badge");
                Ok(badge)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateBadge(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn enable_badge(&self, id: &BadgeId) -> StoreResult<()> {
        self.set_enabled(id, true).await
    }

    async fn disable_badge(&self, id: &BadgeId) -> StoreResult<()> {
        self.set_enabled(id, false).await
    }

    async fn delete_badge(&self, id: &BadgeId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM badges WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::BadgeNotFound(id.to_string()));
        }

        debug!(badge_id = %id, "deleted badge");
        Ok(())
    }
}

impl Authorizer for SqliteStore {
    async fn check(&self, id: &BadgeId) -> StoreResult<bool> {
        self.has_access(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BadgeId {
        BadgeId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_badge() {
        let store = SqliteStore::in_memory().await.unwrap();

        let created = store
            .create_badge(&id("8604de7d"), BadgeKind::Card, true)
            .await
            .unwrap();
        assert_eq!(created.id, id("8604de7d"));
        assert_eq!(created.kind, BadgeKind::Card);
        assert!(created.enabled);

        let fetched = store.get_badge(&id("8604DE7D")).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_duplicate_badge() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .create_badge(&id("a1b2"), BadgeKind::Sticker, true)
            .await
            .unwrap();

        let error = store
            .create_badge(&id("a1b2"), BadgeKind::Card, false)
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::DuplicateBadge(ref dup) if dup == "a1b2"));
    }

    #[tokio::test]
    async fn test_has_access_honours_enabled() {
        let store = SqliteStore::in_memory().await.unwrap();
        let badge = id("a1b2");

        assert!(!store.check(&badge).await.unwrap());

        store
            .create_badge(&badge, BadgeKind::Keychain, false)
            .await
            .unwrap();
        assert!(!store.check(&badge).await.unwrap());

        store.enable_badge(&badge).await.unwrap();
        assert!(store.check(&badge).await.unwrap());

        store.disable_badge(&badge).await.unwrap();
        assert!(!store.check(&badge).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_badge_operations() {
        let store = SqliteStore::in_memory().await.unwrap();
        let badge = id("ffff");

        assert!(store.get_badge(&badge).await.unwrap_err().is_not_found());
        assert!(store.enable_badge(&badge).await.unwrap_err().is_not_found());
        assert!(store.disable_badge(&badge).await.unwrap_err().is_not_found());
        assert!(store.delete_badge(&badge).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .create_badge(&id("a1b2"), BadgeKind::Card, true)
            .await
            .unwrap();
        store
            .create_badge(&id("c3d4"), BadgeKind::Other, false)
            .await
            .unwrap();

        assert_eq!(store.list_badges().await.unwrap().len(), 2);

        store.delete_badge(&id("a1b2")).await.unwrap();

        let remaining = store.list_badges().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, id("c3d4"));
        assert!(!remaining[0].enabled);
    }
}
