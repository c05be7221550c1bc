use chrono::{DateTime, Utc};
use keyless_core::{BadgeId, BadgeKind};
use serde::{Deserialize, Serialize};

/// A badge record.
///
/// Maps to the `badges` table. Only enabled badges open the door; disabled
/// badges are kept so an administrator can re-enable them.
///
/// # Examples
///
/// ```
/// use keyless_core::{BadgeId, BadgeKind};
/// use keyless_store::models::Badge;
///
/// let badge = Badge::new(BadgeId::new("8604de7d").unwrap(), BadgeKind::Card, true);
/// assert!(badge.enabled);
/// assert_eq!(badge.kind, BadgeKind::Card);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Badge {
    /// Identifier read from the badge.
    #[sqlx(try_from = "String")]
    pub id: BadgeId,

    /// Physical form factor.
    #[sqlx(try_from = "String")]
    pub kind: BadgeKind,

    /// Whether the badge currently grants access.
    pub enabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Badge {
    /// Create a badge record stamped with the current time.
    pub fn new(id: BadgeId, kind: BadgeKind, enabled: bool) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            enabled,
            created_at: now,
            updated_at: now,
        }
    }
}
