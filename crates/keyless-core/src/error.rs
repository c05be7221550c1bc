use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid badge id: {message}")]
    InvalidBadgeId { message: String },

    #[error("Unknown badge kind: {0}")]
    UnknownBadgeKind(String),
}

pub type Result<T> = std::result::Result<T, Error>;
