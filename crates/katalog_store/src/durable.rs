//! Durable store backend over [`redb`].
//!
//! The embedded engine already provides snapshot isolation, writer
//! serialization, and atomic commit, so this adapter delegates instead of
//! staging: buckets map to redb tables named by their composite path
//! (`parent/child`), transactions wrap the engine's native read and write
//! transactions. Table handles are opened per operation and dropped before
//! the call returns, which keeps the wrapper free of borrow entanglement
//! with the engine.

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::{join_path, validate_name, Bucket, Store, Transaction, PATH_SEPARATOR};
use parking_lot::Mutex;
use redb::{ReadableTable, TableDefinition, TableHandle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

fn table_def(path: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(path)
}

/// A durable store backed by a single redb database file.
///
/// Implements the same transactional contract as [`crate::MemoryStore`];
/// see the crate docs.
pub struct RedbStore {
    db: redb::Database,
    path: PathBuf,
    open_txns: AtomicUsize,
}

impl RedbStore {
    /// Opens or creates a store at `path` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OpenFailed`] if the engine cannot create or
    /// acquire the file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens or creates a store at `path`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] if `config.error_if_exists` is set and
    ///   the file is present
    /// - [`StoreError::NotFound`] if `config.create_if_missing` is unset and
    ///   the file is absent
    /// - [`StoreError::OpenFailed`] if the engine cannot create or acquire
    ///   the file
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> StoreResult<Self> {
        let path = path.as_ref();
        let exists = path.exists();
        if exists && config.error_if_exists {
            return Err(StoreError::already_exists(path.display().to_string()));
        }
        if !exists && !config.create_if_missing {
            return Err(StoreError::not_found(path.display().to_string()));
        }
        let db = redb::Database::create(path)
            .map_err(|err| StoreError::open_failed(path.display().to_string(), err.to_string()))?;
        tracing::debug!(path = %path.display(), created = !exists, "durable store opened");
        Ok(Self {
            db,
            path: path.to_owned(),
            open_txns: AtomicUsize::new(0),
        })
    }

    /// The database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for RedbStore {
    fn begin<'s>(&'s self, writable: bool) -> StoreResult<Box<dyn Transaction + 's>> {
        // begin_write blocks while another writer is active; the engine is
        // the admission gate here.
        let inner = if writable {
            Inner::Write(self.db.begin_write()?)
        } else {
            Inner::Read(self.db.begin_read()?)
        };
        self.open_txns.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(writable, "durable transaction started");
        Ok(Box::new(RedbTransaction {
            store: self,
            inner: Mutex::new(Some(inner)),
            writable,
        }))
    }

    fn close(&self) -> StoreResult<()> {
        let open = self.open_txns.load(Ordering::SeqCst);
        if open > 0 {
            return Err(StoreError::ResourceLeak { open });
        }
        Ok(())
    }
}

enum Inner {
    Read(redb::ReadTransaction),
    Write(redb::WriteTransaction),
}

/// A transaction delegating to the engine's native transaction.
struct RedbTransaction<'s> {
    store: &'s RedbStore,
    /// `None` once terminated; commit and rollback consume the engine
    /// transaction, which is what makes them idempotent here.
    inner: Mutex<Option<Inner>>,
    writable: bool,
}

impl<'s> RedbTransaction<'s> {
    fn with_write<R>(
        &self,
        f: impl FnOnce(&redb::WriteTransaction) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let guard = self.inner.lock();
        match guard.as_ref() {
            Some(Inner::Write(tx)) => f(tx),
            Some(Inner::Read(_)) => Err(StoreError::ReadOnly),
            None => Err(StoreError::TransactionDone),
        }
    }

    /// Whether a table for `path` exists in the write transaction's view.
    ///
    /// `open_table` on a write transaction creates missing tables, so
    /// existence has to be answered through the table list instead.
    fn write_table_exists(tx: &redb::WriteTransaction, path: &str) -> StoreResult<bool> {
        let mut tables = tx.list_tables()?;
        Ok(tables.any(|handle| handle.name() == path))
    }

    fn bucket_exists(&self, path: &str) -> StoreResult<bool> {
        let guard = self.inner.lock();
        match guard.as_ref() {
            Some(Inner::Write(tx)) => Self::write_table_exists(tx, path),
            Some(Inner::Read(tx)) => match tx.open_table(table_def(path)) {
                Ok(_) => Ok(true),
                Err(redb::TableError::TableDoesNotExist(_)) => Ok(false),
                Err(err) => Err(err.into()),
            },
            None => Err(StoreError::TransactionDone),
        }
    }

    fn create_bucket_at(&self, path: &str) -> StoreResult<()> {
        self.with_write(|tx| {
            if Self::write_table_exists(tx, path)? {
                return Err(StoreError::already_exists(path));
            }
            // Opening the table creates it; the handle is dropped right away.
            tx.open_table(table_def(path))?;
            Ok(())
        })
    }

    fn get_bucket_at<'t>(&'t self, path: String) -> StoreResult<Box<dyn Bucket + 't>> {
        if !self.bucket_exists(&path)? {
            return Err(StoreError::not_found(path));
        }
        Ok(Box::new(RedbBucket { txn: self, path }))
    }

    fn delete_bucket_at(&self, path: &str) -> StoreResult<()> {
        self.with_write(|tx| {
            let prefix = format!("{path}{PATH_SEPARATOR}");
            let doomed: Vec<String> = tx
                .list_tables()?
                .map(|handle| handle.name().to_owned())
                .filter(|name| name == path || name.starts_with(&prefix))
                .collect();
            for name in doomed {
                tx.delete_table(table_def(&name))?;
            }
            Ok(())
        })
    }

    fn get_key(&self, path: &str, key: &str) -> StoreResult<Vec<u8>> {
        let guard = self.inner.lock();
        match guard.as_ref() {
            Some(Inner::Read(tx)) => {
                let table = match tx.open_table(table_def(path)) {
                    Ok(table) => table,
                    Err(redb::TableError::TableDoesNotExist(_)) => {
                        return Err(StoreError::not_found(path));
                    }
                    Err(err) => return Err(err.into()),
                };
                // The bytes are copied out before the table handle drops.
                let value = table.get(key)?.map(|guard| guard.value().to_vec());
                value.ok_or_else(|| StoreError::not_found(key))
            }
            Some(Inner::Write(tx)) => {
                if !Self::write_table_exists(tx, path)? {
                    return Err(StoreError::not_found(path));
                }
                let table = tx.open_table(table_def(path))?;
                let value = table.get(key)?.map(|guard| guard.value().to_vec());
                value.ok_or_else(|| StoreError::not_found(key))
            }
            None => Err(StoreError::TransactionDone),
        }
    }

    fn put_key(&self, path: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        self.with_write(|tx| {
            if !Self::write_table_exists(tx, path)? {
                return Err(StoreError::not_found(path));
            }
            let mut table = tx.open_table(table_def(path))?;
            table.insert(key, value)?;
            Ok(())
        })
    }

    fn delete_key(&self, path: &str, key: &str) -> StoreResult<()> {
        self.with_write(|tx| {
            if !Self::write_table_exists(tx, path)? {
                return Err(StoreError::not_found(path));
            }
            let mut table = tx.open_table(table_def(path))?;
            table.remove(key)?;
            Ok(())
        })
    }

    /// Consumes the engine transaction exactly once. Repeat calls no-op.
    fn terminate(&self, commit: bool) -> StoreResult<()> {
        let taken = self.inner.lock().take();
        let Some(inner) = taken else {
            return Ok(());
        };
        let result = match inner {
            Inner::Write(tx) => {
                if commit {
                    tx.commit().map_err(StoreError::from)
                } else {
                    tx.abort().map_err(StoreError::from)
                }
            }
            // Dropping a read transaction releases its snapshot.
            Inner::Read(_) => Ok(()),
        };
        self.store.open_txns.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(committed = commit && self.writable, "durable transaction finished");
        result
    }
}

impl<'s> Transaction for RedbTransaction<'s> {
    fn is_writable(&self) -> bool {
        self.writable
    }

    fn create_bucket<'t>(&'t self, name: &str) -> StoreResult<Box<dyn Bucket + 't>> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        validate_name(name)?;
        self.create_bucket_at(name)?;
        Ok(Box::new(RedbBucket {
            txn: self,
            path: name.to_owned(),
        }))
    }

    fn get_bucket<'t>(&'t self, name: &str) -> StoreResult<Box<dyn Bucket + 't>> {
        validate_name(name)?;
        self.get_bucket_at(name.to_owned())
    }

    fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        validate_name(name)?;
        self.delete_bucket_at(name)
    }

    fn commit(&self) -> StoreResult<()> {
        self.terminate(true)
    }

    fn rollback(&self) -> StoreResult<()> {
        self.terminate(false)
    }
}

impl<'s> Drop for RedbTransaction<'s> {
    fn drop(&mut self) {
        // Rollback semantics on unwind or forgotten handles. An abort error
        // here has no caller to reach.
        let _ = self.terminate(false);
    }
}

/// Handle to one table path within a [`RedbTransaction`].
struct RedbBucket<'t> {
    txn: &'t RedbTransaction<'t>,
    path: String,
}

impl<'t> Bucket for RedbBucket<'t> {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        validate_name(key)?;
        self.txn.get_key(&self.path, key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_name(key)?;
        self.txn.put_key(&self.path, key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        validate_name(key)?;
        self.txn.delete_key(&self.path, key)
    }

    fn create_bucket<'b>(&'b self, name: &str) -> StoreResult<Box<dyn Bucket + 'b>> {
        if !self.txn.writable {
            return Err(StoreError::ReadOnly);
        }
        validate_name(name)?;
        let path = join_path(&self.path, name);
        self.txn.create_bucket_at(&path)?;
        Ok(Box::new(RedbBucket {
            txn: self.txn,
            path,
        }))
    }

    fn get_bucket<'b>(&'b self, name: &str) -> StoreResult<Box<dyn Bucket + 'b>> {
        validate_name(name)?;
        self.txn.get_bucket_at(join_path(&self.path, name))
    }

    fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        if !self.txn.writable {
            return Err(StoreError::ReadOnly);
        }
        validate_name(name)?;
        self.txn.delete_bucket_at(&join_path(&self.path, name))
    }
}
