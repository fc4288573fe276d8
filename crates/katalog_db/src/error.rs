//! Error types for the catalogue database layer.

use katalog_store::StoreError;
use thiserror::Error;

/// Convenience result alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors produced by the catalogue database layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// The underlying store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store has no catalogue metadata. Run `init` first.
    #[error("database has not been initialised")]
    NotInitialized,

    /// A stored record could not be decoded.
    #[error("corrupt database record: {message}")]
    Corrupt {
        /// What failed to decode.
        message: String,
    },

    /// The on-disk schema version is newer than this build understands.
    #[error("unsupported database version {major}.{minor}")]
    UnsupportedVersion {
        /// Stored major version.
        major: u8,
        /// Stored minor version.
        minor: u8,
    },

    /// No catalogued volume carries the requested identifier.
    #[error("volume {uid} is not in the catalogue")]
    VolumeNotFound {
        /// The identifier that was looked up.
        uid: uuid::Uuid,
    },
}

impl DbError {
    /// Builds a [`DbError::Corrupt`] from anything displayable.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}
