use thiserror::Error;

use crate::store::SnapshotError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True when the in-memory mutation was applied but could not be made durable.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Snapshot(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
