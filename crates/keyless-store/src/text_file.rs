//! Static badge list read from a text file.

use crate::error::{StoreError, StoreResult};
use crate::models::Badge;
use crate::{Authorizer, BadgeStore};
use chrono::{DateTime, Utc};
use keyless_core::{BadgeId, BadgeKind};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

const STORE_NAME: &str = "text file";

/// Read-only datastore backed by a file with one badge id per line.
///
/// Blank lines and lines starting with `#` are ignored. Ids are normalized
/// the same way scanned ids are, so `8604DE7D` in the file matches a scan of
/// `8604de7d`. The file is read once, when the store is opened.
///
/// # Examples
///
/// ```
/// use keyless_core::BadgeId;
/// use keyless_store::TextFileStore;
///
/// let store = TextFileStore::parse("# front door\n8604de7d\n\na1b2\n", "ids.txt").unwrap();
/// assert!(store.contains(&BadgeId::new("A1B2").unwrap()));
/// assert_eq!(store.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TextFileStore {
    ids: BTreeSet<String>,
    loaded_at: DateTime<Utc>,
}

impl TextFileStore {
    /// Read the badge list at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `InvalidLine` if a line is
    /// not a valid badge id.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let store = Self::parse(&contents, path)?;
        info!(path = %path.display(), badges = store.len(), "loaded badge list");
        Ok(store)
    }

    /// Build a store from file contents. `path` is only used in errors.
    pub fn parse(contents: &str, path: impl AsRef<Path>) -> StoreResult<Self> {
        let mut ids = BTreeSet::new();

        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let id = BadgeId::new(line).map_err(|source| StoreError::InvalidLine {
                path: path.as_ref().to_path_buf(),
                line: index + 1,
                source,
            })?;
            ids.insert(id.as_str().to_string());
        }

        Ok(Self {
            ids,
            loaded_at: Utc::now(),
        })
    }

    /// Whether `id` is listed.
    pub fn contains(&self, id: &BadgeId) -> bool {
        self.ids.contains(id.as_str())
    }

    /// Number of listed badges.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn listed(&self, id: &str) -> StoreResult<Badge> {
        let id = BadgeId::new(id)?;
        Ok(Badge {
            id,
            kind: BadgeKind::Other,
            enabled: true,
            created_at: self.loaded_at,
            updated_at: self.loaded_at,
        })
    }

    fn unsupported<T>(operation: &'static str) -> StoreResult<T> {
        Err(StoreError::Unsupported {
            store: STORE_NAME,
            operation,
        })
    }
}

impl BadgeStore for TextFileStore {
    async fn has_access(&self, id: &BadgeId) -> StoreResult<bool> {
        let granted = self.contains(id);
        debug!(badge_id = %id, granted, "checked badge list");
        Ok(granted)
    }

    async fn list_badges(&self) -> StoreResult<Vec<Badge>> {
        self.ids.iter().map(|id| self.listed(id)).collect()
    }

    async fn get_badge(&self, id: &BadgeId) -> StoreResult<Badge> {
        if !self.contains(id) {
            return Err(StoreError::BadgeNotFound(id.to_string()));
        }
        self.listed(id.as_str())
    }

    async fn create_badge(
        &self,
        _id: &BadgeId,
        _kind: BadgeKind,
        _enabled: bool,
    ) -> StoreResult<Badge> {
        Self::unsupported("create")
    }

    async fn enable_badge(&self, _id: &BadgeId) -> StoreResult<()> {
        Self::unsupported("enable")
    }

    async fn disable_badge(&self, _id: &BadgeId) -> StoreResult<()> {
        Self::unsupported("disable")
    }

    async fn delete_badge(&self, _id: &BadgeId) -> StoreResult<()> {
        Self::unsupported("delete")
    }
}

impl Authorizer for TextFileStore {
    async fn check(&self, id: &BadgeId) -> StoreResult<bool> {
        self.has_access(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(s: &str) -> BadgeId {
        BadgeId::new(s).unwrap()
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let store = TextFileStore::parse("# staff\n\n8604de7d\n   \nA1B2\r\n# c3d4\n", "ids.txt")
            .unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.contains(&id("8604de7d")));
        assert!(store.contains(&id("a1b2")));
        assert!(!store.contains(&id("c3d4")));
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let error = TextFileStore::parse("a1b2\nnot-a-badge\n", "ids.txt").unwrap_err();

        match error {
            StoreError::InvalidLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_denies_everything() {
        let store = TextFileStore::parse("", "ids.txt").unwrap();
        assert!(store.is_empty());
        assert!(!store.contains(&id("a1b2")));
    }

    #[tokio::test]
    async fn test_has_access_is_membership() {
        let store = TextFileStore::parse("a1b2\n", "ids.txt").unwrap();

        assert!(store.check(&id("a1b2")).await.unwrap());
        assert!(!store.check(&id("c3d4")).await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_reports_enabled_other_badges() {
        let store = TextFileStore::parse("c3d4\na1b2\n", "ids.txt").unwrap();

        let badges = store.list_badges().await.unwrap();
        let ids: Vec<_> = badges.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a1b2", "c3d4"]);
        assert!(badges.iter().all(|b| b.enabled && b.kind == BadgeKind::Other));

        assert_eq!(store.get_badge(&id("a1b2")).await.unwrap().id, id("a1b2"));
        assert!(store.get_badge(&id("ffff")).await.unwrap_err().is_not_found());
    }

    #[rstest]
    #[case("create")]
    #[case("enable")]
    #[case("disable")]
    #[case("delete")]
    #[tokio::test]
    async fn test_mutations_are_unsupported(#[case] operation: &str) {
        let store = TextFileStore::parse("a1b2\n", "ids.txt").unwrap();
        let badge = id("a1b2");

        let result = match operation {
            "create" => store
                .create_badge(&badge, BadgeKind::Card, true)
                .await
                .map(|_| ()),
            "enable" => store.enable_badge(&badge).await,
            "disable" => store.disable_badge(&badge).await,
            _ => store.delete_badge(&badge).await,
        };

        assert!(matches!(result, Err(StoreError::Unsupported { .. })));
    }

    #[tokio::test]
    async fn test_open_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        tokio::fs::write(&path, "8604de7d\n").await.unwrap();

        let store = TextFileStore::open(&path).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains(&id("8604de7d")));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = TextFileStore::open(dir.path().join("absent.txt")).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
