use crate::{Result, constants::MAX_BADGE_ID_LENGTH, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Badge identifier as read from a scanner (lowercase hex of the UID bytes).
///
/// # Security
/// This type implements constant-time comparison so that looking a badge up
/// in a list does not leak how many leading characters matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BadgeId(String);

impl BadgeId {
    /// Create a badge id from text with validation.
    ///
    /// The id is normalized (trimmed and lowercased) before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidBadgeId` if the id is empty, longer than
    /// [`MAX_BADGE_ID_LENGTH`], or contains non-hex characters.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim().to_ascii_lowercase();

        if id.is_empty() {
            return Err(Error::InvalidBadgeId {
                message: "badge id is empty".to_string(),
            });
        }

        if id.len() > MAX_BADGE_ID_LENGTH {
            return Err(Error::InvalidBadgeId {
                message: format!(
                    "badge id must be at most {MAX_BADGE_ID_LENGTH} chars, got {}",
                    id.len()
                ),
            });
        }

        if let Some(c) = id.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidBadgeId {
                message: format!("unexpected character {c:?} in {id}"),
            });
        }

        Ok(BadgeId(id))
    }

    /// Build a badge id from raw UID bytes.
    ///
    /// ```
    /// use keyless_core::BadgeId;
    ///
    /// let id = BadgeId::from_uid(&[0x86, 0x04, 0xDE, 0x7D]).unwrap();
    /// assert_eq!(id.as_str(), "8604de7d");
    /// ```
    ///
    /// # Errors
    /// Returns `Error::InvalidBadgeId` if the UID is empty or its hex form is
    /// longer than [`MAX_BADGE_ID_LENGTH`].
    pub fn from_uid(uid: &[u8]) -> Result<Self> {
        let hex: String = uid.iter().map(|b| format!("{b:02x}")).collect();
        Self::new(&hex)
    }

    /// Get the badge id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BadgeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BadgeId::new(s)
    }
}

impl TryFrom<String> for BadgeId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        BadgeId::new(&value)
    }
}

impl From<BadgeId> for String {
    fn from(id: BadgeId) -> Self {
        id.0
    }
}

impl PartialEq for BadgeId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for BadgeId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Physical form factor of a badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    Card,
    Sticker,
    Keychain,
    #[default]
    Other,
}

impl BadgeKind {
    /// Lowercase name, as stored in the datastore.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeKind::Card => "card",
            BadgeKind::Sticker => "sticker",
            BadgeKind::Keychain => "keychain",
            BadgeKind::Other => "other",
        }
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BadgeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(BadgeKind::Card),
            "sticker" => Ok(BadgeKind::Sticker),
            "keychain" => Ok(BadgeKind::Keychain),
            "other" => Ok(BadgeKind::Other),
            _ => Err(Error::UnknownBadgeKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for BadgeKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("8604de7d", "8604de7d")]
    #[case("8604DE7D", "8604de7d")]
    #[case("  a1b2\n", "a1b2")]
    #[case("0", "0")]
    fn test_badge_id_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(BadgeId::new(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("a1b2-c3d4")]
    #[case("not hex")]
    fn test_badge_id_rejects(#[case] input: &str) {
        assert!(matches!(
            BadgeId::new(input),
            Err(Error::InvalidBadgeId { .. })
        ));
    }

    #[test]
    fn test_badge_id_rejects_overlong() {
        let id = "a".repeat(MAX_BADGE_ID_LENGTH + 1);
        assert!(BadgeId::new(&id).is_err());
        assert!(BadgeId::new(&id[1..]).is_ok());
    }

    #[test]
    fn test_badge_id_from_uid_is_lowercase_hex() {
        assert_eq!(BadgeId::from_uid(&[0xA1, 0xB2]).unwrap().as_str(), "a1b2");
        assert_eq!(BadgeId::from_uid(&[0x00, 0x0F]).unwrap().as_str(), "000f");
    }

    #[test]
    fn test_badge_id_from_uid_enforces_length() {
        let longest = vec![0xab; MAX_BADGE_ID_LENGTH / 2];
        let id = BadgeId::from_uid(&longest).unwrap();
        assert_eq!(id.as_str().len(), MAX_BADGE_ID_LENGTH);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<BadgeId>(&json).unwrap(), id);

        let too_long = vec![0xab; MAX_BADGE_ID_LENGTH / 2 + 1];
        assert!(BadgeId::from_uid(&too_long).is_err());
        assert!(BadgeId::from_uid(&[]).is_err());
    }

    #[test]
    fn test_badge_id_equality_and_hash() {
        let a: BadgeId = "A1B2".parse().unwrap();
        let b = BadgeId::from_uid(&[0xa1, 0xb2]).unwrap();
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_badge_id_serde_validates() {
        let id: BadgeId = serde_json::from_str("\"C3D4\"").unwrap();
        assert_eq!(id.as_str(), "c3d4");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c3d4\"");
        assert!(serde_json::from_str::<BadgeId>("\"zz\"").is_err());
    }

    #[rstest]
    #[case("card", BadgeKind::Card)]
    #[case("Sticker", BadgeKind::Sticker)]
    #[case("KEYCHAIN", BadgeKind::Keychain)]
    #[case("other", BadgeKind::Other)]
    fn test_badge_kind_parse(#[case] input: &str, #[case] expected: BadgeKind) {
        let kind: BadgeKind = input.parse().unwrap();
        assert_eq!(kind, expected);
        assert_eq!(kind.to_string().parse::<BadgeKind>().unwrap(), expected);
    }

    #[test]
    fn test_badge_kind_unknown() {
        assert_eq!(
            "wristband".parse::<BadgeKind>(),
            Err(Error::UnknownBadgeKind("wristband".to_string()))
        );
        assert_eq!(BadgeKind::default(), BadgeKind::Other);
    }
}
