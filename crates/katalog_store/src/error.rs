//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
///
/// All errors are returned to the caller; the store never retries
/// internally. [`StoreError::ResourceLeak`] is the one condition that is a
/// programming error rather than a recoverable failure - callers should treat
/// it as a program-abort condition.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A blank name was given for a bucket or key.
    #[error("bucket and key names must not be empty")]
    EmptyName,

    /// A bucket or key is absent under the current visibility rules.
    #[error("not found: {name}")]
    NotFound {
        /// The bucket path or key that was not found.
        name: String,
    },

    /// A bucket with this name already exists in the snapshot or overlay.
    #[error("already exists: {name}")]
    AlreadyExists {
        /// The colliding bucket path.
        name: String,
    },

    /// A mutation was attempted through a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// An operation was invoked on a terminated transaction.
    #[error("transaction is no longer active")]
    TransactionDone,

    /// The backend could not be opened.
    #[error("cannot open store at '{path}': {reason}")]
    OpenFailed {
        /// The locator that failed to open.
        path: String,
        /// Why the backend refused it.
        reason: String,
    },

    /// The store was closed while transactions remain open.
    ///
    /// Fatal: this catches resource leaks early rather than silently
    /// corrupting state.
    #[error("store closed with {open} open transaction(s)")]
    ResourceLeak {
        /// Number of transactions still open.
        open: usize,
    },

    /// A stored value could not be decoded.
    #[error("value decode failed: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// Durable engine error passthrough.
    #[error("backend error: {0}")]
    Backend(#[from] redb::Error),
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an already-exists error.
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Creates an open-failed error.
    pub fn open_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OpenFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Backend(err.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Backend(err.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        Self::Backend(err.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        Self::Backend(err.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        Self::Backend(err.into())
    }
}
