//! # Katalog Database
//!
//! Catalogue semantics on top of the transactional bucket store.
//!
//! [`Database`] owns a boxed [`Store`] and never cares which backend is
//! behind it. Every public operation runs as one store transaction, so the
//! catalogue is either fully updated or untouched. The bucket layout lives
//! in [`schema`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod schema;

use chrono::Utc;
use katalog_index::{EntryKind, Volume};
use katalog_store::{Bucket, Store, StoreError, StoreExt, Transaction};
use tracing::debug;
use uuid::Uuid;

pub use error::{DbError, DbResult};
pub use schema::{FileEntry, Stats, Version, VolumeRecord};

/// The catalogue database.
///
/// Backend-agnostic: anything implementing [`Store`] works, and the test
/// suite runs the same scenarios against both engines.
pub struct Database {
    store: Box<dyn Store>,
}

impl Database {
    /// Wraps an open store.
    pub fn new(store: Box<dyn Store>) -> Self {
        Self { store }
    }

    /// Gives access to the underlying store.
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Closes the underlying store.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError::ResourceLeak`] when transactions are still
    /// open, and any backend shutdown failure.
    pub fn close(self) -> DbResult<()> {
        self.store.close()?;
        Ok(())
    }

    /// Lays down the catalogue schema and assigns the database identity.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the store already holds
    /// a catalogue.
    pub fn init(&self) -> DbResult<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.store.update(|tx| -> DbResult<()> {
            let stats = tx.create_bucket(schema::BUCKET_STATS)?;
            stats.put(schema::KEY_DATABASE_ID, id.as_bytes())?;
            stats.put(schema::KEY_VERSION, &schema::CURRENT_VERSION.encode())?;
            stats.put_u64(schema::KEY_TOTAL_VOLUMES, 0)?;
            stats.put_u64(schema::KEY_TOTAL_DIRECTORIES, 0)?;
            stats.put_u64(schema::KEY_TOTAL_FILES, 0)?;
            stats.put(schema::KEY_CREATED, &schema::encode_time(now))?;
            stats.put(schema::KEY_LAST_SAVED, &schema::encode_time(now))?;
            tx.create_bucket(schema::BUCKET_VOLUMES)?;
            Ok(())
        })?;
        debug!(%id, "catalogue initialised");
        Ok(id)
    }

    /// Reads the catalogue identity, version, totals and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] when the schema is missing,
    /// [`DbError::UnsupportedVersion`] when the catalogue was written by a
    /// newer build, and [`DbError::Corrupt`] when a metadata record does
    /// not decode.
    pub fn stats(&self) -> DbResult<Stats> {
        self.read(|tx| {
            let stats = stats_bucket(tx)?;
            let version = Version::decode(&stats.get(schema::KEY_VERSION)?)?;
            if version.major > schema::CURRENT_VERSION.major {
                return Err(DbError::UnsupportedVersion {
                    major: version.major,
                    minor: version.minor,
                });
            }
            Ok(Stats {
                id: schema::decode_uuid(&stats.get(schema::KEY_DATABASE_ID)?)?,
                version,
                volumes: stats.get_u64(schema::KEY_TOTAL_VOLUMES)?,
                directories: stats.get_u64(schema::KEY_TOTAL_DIRECTORIES)?,
                files: stats.get_u64(schema::KEY_TOTAL_FILES)?,
                created: schema::decode_time(&stats.get(schema::KEY_CREATED)?)?,
                last_saved: schema::decode_time(&stats.get(schema::KEY_LAST_SAVED)?)?,
            })
        })
    }

    /// Fetches the stored record for one volume.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::VolumeNotFound`] when the identifier is unknown.
    pub fn volume(&self, uid: Uuid) -> DbResult<VolumeRecord> {
        self.read(|tx| {
            let volumes = volumes_bucket(tx)?;
            let bytes = volumes
                .get(&uid.to_string())
                .map_err(|err| match err {
                    StoreError::NotFound { .. } => DbError::VolumeNotFound { uid },
                    other => other.into(),
                })?;
            schema::decode_record(&bytes)
        })
    }

    /// Removes a volume and its file entries from the catalogue.
    ///
    /// Returns `false` when the identifier is unknown, which is not an
    /// error: `volume add` calls this unconditionally before re-indexing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] when the schema is missing.
    pub fn remove_volume(&self, uid: Uuid) -> DbResult<bool> {
        let mut removed = false;
        self.store.update(|tx| -> DbResult<()> {
            let volumes = volumes_bucket(tx)?;
            let key = uid.to_string();
            let old: VolumeRecord = match volumes.get(&key) {
                Ok(bytes) => schema::decode_record(&bytes)?,
                Err(StoreError::NotFound { .. }) => return Ok(()),
                Err(err) => return Err(err.into()),
            };
            volumes.delete(&key)?;
            match volumes.delete_bucket(&key) {
                Ok(()) | Err(StoreError::NotFound { .. }) => {}
                Err(err) => return Err(err.into()),
            }
            let stats = stats_bucket(tx)?;
            decrement(stats.as_ref(), schema::KEY_TOTAL_VOLUMES, 1)?;
            decrement(stats.as_ref(), schema::KEY_TOTAL_DIRECTORIES, old.directories)?;
            decrement(stats.as_ref(), schema::KEY_TOTAL_FILES, old.files)?;
            stats.put(schema::KEY_LAST_SAVED, &schema::encode_time(Utc::now()))?;
            removed = true;
            Ok(())
        })?;
        if removed {
            debug!(%uid, "volume removed from catalogue");
        }
        Ok(removed)
    }

    /// Catalogues a volume, replacing any previous index of it.
    ///
    /// The previous entries are removed in their own transaction, then the
    /// new record and all entries are written atomically: a crawl that fails
    /// halfway leaves the volume absent rather than half-indexed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] when the schema is missing, and
    /// propagates any store failure, in which case nothing was published.
    pub fn index_volume(
        &self,
        volume: Volume,
        entries: impl IntoIterator<Item = FileEntry>,
    ) -> DbResult<VolumeRecord> {
        self.remove_volume(volume.uid)?;

        let uid = volume.uid;
        let key = uid.to_string();
        let mut record = VolumeRecord {
            volume,
            files: 0,
            directories: 0,
            catalogued: Utc::now(),
        };
        self.store.update(|tx| -> DbResult<()> {
            let volumes = volumes_bucket(tx)?;
            let bucket = volumes.create_bucket(&key)?;
            for entry in entries {
                bucket.put(&entry.path, &schema::encode_record(&entry)?)?;
                match entry.kind {
                    EntryKind::File => record.files += 1,
                    EntryKind::Directory => record.directories += 1,
                    // Stored, but counted in neither total.
                    EntryKind::Symlink | EntryKind::Other => {}
                }
            }
            volumes.put(&key, &schema::encode_record(&record)?)?;
            let stats = stats_bucket(tx)?;
            increment(stats.as_ref(), schema::KEY_TOTAL_VOLUMES, 1)?;
            increment(stats.as_ref(), schema::KEY_TOTAL_DIRECTORIES, record.directories)?;
            increment(stats.as_ref(), schema::KEY_TOTAL_FILES, record.files)?;
            stats.put(schema::KEY_LAST_SAVED, &schema::encode_time(record.catalogued))?;
            Ok(())
        })?;
        debug!(
            %uid,
            files = record.files,
            directories = record.directories,
            "volume catalogued",
        );
        Ok(record)
    }

    /// Fetches one catalogued entry of a volume by its relative path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::VolumeNotFound`] when the volume is unknown and
    /// propagates [`StoreError::NotFound`] when the path is not catalogued.
    pub fn file_entry(&self, uid: Uuid, path: &str) -> DbResult<FileEntry> {
        self.read(|tx| {
            let volumes = volumes_bucket(tx)?;
            let bucket = volumes.get_bucket(&uid.to_string()).map_err(|err| match err {
                StoreError::NotFound { .. } => DbError::VolumeNotFound { uid },
                other => other.into(),
            })?;
            schema::decode_record(&bucket.get(path)?)
        })
    }

    fn read<T>(&self, f: impl FnOnce(&dyn Transaction) -> DbResult<T>) -> DbResult<T> {
        let tx = self.store.begin(false)?;
        let result = f(tx.as_ref());
        tx.rollback()?;
        result
    }
}

fn stats_bucket<'t>(tx: &'t dyn Transaction) -> DbResult<Box<dyn Bucket + 't>> {
    tx.get_bucket(schema::BUCKET_STATS).map_err(missing_schema)
}

fn volumes_bucket<'t>(tx: &'t dyn Transaction) -> DbResult<Box<dyn Bucket + 't>> {
    tx.get_bucket(schema::BUCKET_VOLUMES).map_err(missing_schema)
}

fn missing_schema(err: StoreError) -> DbError {
    match err {
        StoreError::NotFound { .. } => DbError::NotInitialized,
        other => other.into(),
    }
}

fn increment(bucket: &dyn Bucket, key: &str, delta: u64) -> DbResult<()> {
    let current = bucket.get_u64(key)?;
    bucket.put_u64(key, current.saturating_add(delta))?;
    Ok(())
}

fn decrement(bucket: &dyn Bucket, key: &str, delta: u64) -> DbResult<()> {
    let current = bucket.get_u64(key)?;
    bucket.put_u64(key, current.saturating_sub(delta))?;
    Ok(())
}
