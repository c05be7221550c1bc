use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by badge datastores.
///
/// Authorization treats every one of these as a denial.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No badge with this id exists
    #[error("Badge not found: {0}")]
    BadgeNotFound(String),

    /// A badge with this id already exists
    #[error("Badge already exists: {0}")]
    DuplicateBadge(String),

    /// A stored or supplied value is not a valid badge record
    #[error("Invalid badge record: {0}")]
    InvalidRecord(#[from] keyless_core::Error),

    /// A line of a badge list file could not be parsed
    #[error("{path}:{line}: {source}")]
    InvalidLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: keyless_core::Error,
    },

    /// A datastore file or directory could not be accessed
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store does not implement this operation
    #[error("{store} store does not support {operation}")]
    Unsupported {
        store: &'static str,
        operation: &'static str,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether the error reports a missing badge.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BadgeNotFound(_))
    }
}

/// Specialized result type for datastore operations
pub type StoreResult<T> = Result<T, StoreError>;
