//! Volume commands implementation.

use crossbeam::channel;
use katalog_db::FileEntry;
use katalog_index::{format_bytes, FileEvent, Indexer, Volume};
use std::path::Path;
use std::thread;
use tracing::warn;

use super::{open_database, CommandResult};

/// Capacity of the indexer event channel.
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Indexes the volume holding `path` into the catalogue.
pub fn add(database: &Path, path: &Path) -> CommandResult {
    let db = open_database(database)?;
    let volume = Volume::from_path(path)?;

    println!("Indexing volume:");
    println!("{volume}");
    println!();

    // The receiver drains concurrently, so the crawl blocks only when it
    // gets this far ahead of the collector.
    let (sender, receiver) = channel::bounded(EVENT_QUEUE_CAPACITY);
    let indexer = Indexer::new(&volume, path, sender);
    let crawl = thread::spawn(move || indexer.run());

    let mut entries = Vec::new();
    for event in receiver {
        match event {
            FileEvent::Entry { path, meta } => {
                entries.push(FileEntry {
                    path: path.to_string_lossy().into_owned(),
                    kind: meta.kind,
                    size: meta.size,
                    modified: meta.modified,
                });
            }
            FileEvent::Failed { path, error } => {
                warn!(path = %path.display(), error, "entry skipped");
            }
        }
    }

    let summary = crawl
        .join()
        .map_err(|_| "indexer thread panicked")??;
    let record = db.index_volume(volume, entries)?;
    db.close()?;

    println!(
        "Catalogued {} files and {} directories ({} skipped)",
        record.files, record.directories, summary.errors
    );
    Ok(())
}

/// Prints information about the volume holding `path`.
pub fn info(path: &Path) -> CommandResult {
    let volume = Volume::from_path(path)?;
    println!("{volume}");
    println!(
        " Used space: {}",
        format_bytes(volume.bytes_total.saturating_sub(volume.bytes_free))
    );
    Ok(())
}
