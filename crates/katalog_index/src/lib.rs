//! # Katalog Index
//!
//! Volume probing and filesystem crawling for the Katalog file catalogue.
//!
//! [`Volume`] describes a mounted storage volume, probed from any path on
//! it. [`Indexer`] walks a volume's tree and streams [`FileEvent`]s over a
//! channel to whoever wants them - the catalogue database layer, a progress
//! reporter, or a test.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod indexer;
mod volume;

pub use error::{IndexError, IndexResult};
pub use indexer::{EntryKind, EntryMeta, FileEvent, IndexSummary, Indexer};
pub use volume::{format_bytes, Volume, VolumeKind};
