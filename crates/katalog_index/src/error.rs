//! Error types for volume probing and indexing.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for indexing operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while probing volumes or crawling a tree.
#[derive(Debug, Error)]
pub enum IndexError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No mounted volume contains the given path.
    #[error("no mounted volume found for path '{path}'")]
    VolumeNotFound {
        /// The path that matched no mount point.
        path: PathBuf,
    },

    /// The crawl was cancelled before completing.
    #[error("indexing was cancelled")]
    Cancelled,

    /// The event receiver went away mid-crawl.
    #[error("event channel closed before indexing finished")]
    ChannelClosed,
}
