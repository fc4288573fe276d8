//! Filesystem crawler.
//!
//! Walks a volume's tree and streams one [`FileEvent`] per discovered entry
//! over a channel. The walk stays on the starting device when the platform
//! exposes device identifiers, so a crawl of `/` does not wander into other
//! mounts.

use crate::error::{IndexError, IndexResult};
use crate::volume::Volume;
use chrono::{DateTime, Utc};
use crossbeam::channel::Sender;
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// What kind of directory entry was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link (not followed).
    Symlink,
    /// Anything else (sockets, devices, pipes).
    Other,
}

/// Metadata captured for one discovered entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Entry kind.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

impl EntryMeta {
    fn from_metadata(meta: &Metadata) -> Self {
        let kind = if meta.is_file() {
            EntryKind::File
        } else if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        };
        Self {
            kind,
            size: if kind == EntryKind::File { meta.len() } else { 0 },
            modified: meta.modified().ok().map(DateTime::from),
        }
    }
}

/// One event emitted by the crawler.
#[derive(Debug, Clone)]
pub enum FileEvent {
    /// An entry was discovered.
    Entry {
        /// Path relative to the crawl root.
        path: PathBuf,
        /// Captured metadata.
        meta: EntryMeta,
    },
    /// An entry could not be read. The crawl continues.
    Failed {
        /// The path that failed, when known.
        path: PathBuf,
        /// Human-readable reason.
        error: String,
    },
}

/// Totals for one completed crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Regular files discovered.
    pub files: u64,
    /// Directories discovered.
    pub directories: u64,
    /// Entries that could not be read.
    pub errors: u64,
}

/// Walks a tree and streams discovered entries to a channel.
pub struct Indexer {
    root: PathBuf,
    device_id: Option<u64>,
    events: Sender<FileEvent>,
    cancelled: Arc<AtomicBool>,
}

impl Indexer {
    /// Creates an indexer for `volume`, crawling from `root`.
    ///
    /// `root` is usually the volume's mount point, but any directory on the
    /// volume works; the device check comes from the volume.
    pub fn new(volume: &Volume, root: impl Into<PathBuf>, events: Sender<FileEvent>) -> Self {
        Self {
            root: root.into(),
            device_id: volume.device_id,
            events,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates an indexer with no device restriction, for crawling arbitrary
    /// directories.
    pub fn for_path(root: impl Into<PathBuf>, events: Sender<FileEvent>) -> Self {
        Self {
            root: root.into(),
            device_id: None,
            events,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A flag that cancels the crawl when set.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Runs the crawl to completion.
    ///
    /// Every discovered entry (and every unreadable one) is sent to the
    /// event channel. Returns the totals once the whole tree has been
    /// visited.
    ///
    /// # Errors
    ///
    /// - [`IndexError::Cancelled`] if the cancel flag was set mid-crawl
    /// - [`IndexError::ChannelClosed`] if the receiver was dropped
    pub fn run(&self) -> IndexResult<IndexSummary> {
        let mut summary = IndexSummary::default();
        let mut walker = WalkDir::new(&self.root).follow_links(false).into_iter();

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(IndexError::Cancelled);
            }
            let entry = match walker.next() {
                None => break,
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    summary.errors += 1;
                    let path = err.path().map(Path::to_owned).unwrap_or_default();
                    self.send(FileEvent::Failed {
                        path,
                        error: err.to_string(),
                    })?;
                    continue;
                }
            };

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    summary.errors += 1;
                    self.send(FileEvent::Failed {
                        path: entry.path().to_owned(),
                        error: err.to_string(),
                    })?;
                    continue;
                }
            };

            // Stay on the starting device: a foreign device id means another
            // filesystem is mounted below the root.
            if entry.file_type().is_dir() && self.foreign_device(&meta) {
                tracing::debug!(path = %entry.path().display(), "skipping foreign mount");
                walker.skip_current_dir();
                continue;
            }

            let meta = EntryMeta::from_metadata(&meta);
            match meta.kind {
                EntryKind::File => summary.files += 1,
                EntryKind::Directory => summary.directories += 1,
                _ => {}
            }
            let path = match entry.path().strip_prefix(&self.root) {
                Ok(relative) if relative.as_os_str().is_empty() => PathBuf::from("."),
                Ok(relative) => relative.to_owned(),
                Err(_) => entry.path().to_owned(),
            };
            self.send(FileEvent::Entry { path, meta })?;
        }

        tracing::debug!(
            files = summary.files,
            directories = summary.directories,
            errors = summary.errors,
            "crawl finished"
        );
        Ok(summary)
    }

    fn send(&self, event: FileEvent) -> IndexResult<()> {
        self.events
            .send(event)
            .map_err(|_| IndexError::ChannelClosed)
    }

    #[cfg(unix)]
    fn foreign_device(&self, meta: &Metadata) -> bool {
        use std::os::unix::fs::MetadataExt;
        matches!(self.device_id, Some(device) if meta.dev() != device)
    }

    #[cfg(not(unix))]
    fn foreign_device(&self, _meta: &Metadata) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::fs;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("docs/reports")).unwrap();
        fs::write(root.join("docs/a.txt"), b"alpha").unwrap();
        fs::write(root.join("docs/b.txt"), b"beta").unwrap();
        fs::write(root.join("docs/reports/q1.csv"), b"1,2,3").unwrap();
        fs::write(root.join("top.bin"), b"\x00\x01").unwrap();
    }

    #[test]
    fn crawl_counts_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        build_tree(dir.path());

        let (tx, rx) = unbounded();
        let indexer = Indexer::for_path(dir.path(), tx);
        let summary = indexer.run().unwrap();

        assert_eq!(summary.files, 4);
        // Root, docs, docs/reports.
        assert_eq!(summary.directories, 3);
        assert_eq!(summary.errors, 0);

        let events: Vec<FileEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 7);
        let paths: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                FileEvent::Entry { path, meta } if meta.kind == EntryKind::File => {
                    Some(path.display().to_string())
                }
                _ => None,
            })
            .collect();
        assert!(paths.contains(&"docs/a.txt".to_owned()));
        assert!(paths.contains(&"top.bin".to_owned()));
    }

    #[test]
    fn entry_paths_are_relative_to_the_root() {
        let dir = tempfile::tempdir().unwrap();
        build_tree(dir.path());

        let (tx, rx) = unbounded();
        Indexer::for_path(dir.path(), tx).run().unwrap();

        for event in rx.try_iter() {
            if let FileEvent::Entry { path, .. } = event {
                assert!(!path.is_absolute(), "expected relative path: {path:?}");
            }
        }
    }

    #[test]
    fn file_sizes_are_captured() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("five.txt"), b"12345").unwrap();

        let (tx, rx) = unbounded();
        Indexer::for_path(dir.path(), tx).run().unwrap();

        let size = rx
            .try_iter()
            .find_map(|event| match event {
                FileEvent::Entry { path, meta }
                    if path == Path::new("five.txt") =>
                {
                    Some(meta.size)
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(size, 5);
    }

    #[test]
    fn cancelled_crawl_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        build_tree(dir.path());

        let (tx, _rx) = unbounded();
        let indexer = Indexer::for_path(dir.path(), tx);
        indexer.cancel_flag().store(true, Ordering::Relaxed);
        assert!(matches!(indexer.run(), Err(IndexError::Cancelled)));
    }

    #[test]
    fn dropped_receiver_ends_the_crawl() {
        let dir = tempfile::tempdir().unwrap();
        build_tree(dir.path());

        let (tx, rx) = unbounded();
        drop(rx);
        let indexer = Indexer::for_path(dir.path(), tx);
        assert!(matches!(indexer.run(), Err(IndexError::ChannelClosed)));
    }
}
