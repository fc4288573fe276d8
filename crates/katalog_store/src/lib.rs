//! # Katalog Store
//!
//! Transactional bucket key-value store backing the Katalog file catalogue.
//!
//! The store provides atomic, isolated, nested-namespace key-value operations
//! over two interchangeable backends:
//!
//! - [`MemoryStore`] - Volatile engine that implements snapshot isolation and
//!   staged writes explicitly. Nothing survives the process.
//! - [`RedbStore`] - Durable engine layered on [`redb`], which already
//!   provides ACID transactions. The adapter delegates, it does not re-stage.
//!
//! Both backends satisfy the same contract: a single writable transaction at
//! a time (admission blocks at [`Store::begin`]), any number of concurrent
//! readers against the last committed snapshot, and all-or-nothing commit.
//!
//! ## Example
//!
//! ```rust
//! use katalog_store::{MemoryStore, Store, StoreExt, StoreResult};
//!
//! let store = MemoryStore::new();
//! store.update(|tx| -> StoreResult<()> {
//!     let bucket = tx.create_bucket("volumes")?;
//!     bucket.put_u64("count", 0)?;
//!     Ok(())
//! })?;
//! store.view(|tx| -> StoreResult<()> {
//!     let bucket = tx.get_bucket("volumes")?;
//!     assert_eq!(bucket.get_u64("count")?, 0);
//!     Ok(())
//! })?;
//! store.close()?;
//! # Ok::<(), katalog_store::StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod config;
mod durable;
mod error;
mod memory;

pub use config::Config;
pub use durable::RedbStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Separator for composite bucket paths (`parent/child`).
pub const PATH_SEPARATOR: char = '/';

/// A transactional bucket key-value store.
///
/// Callers hold the abstract type (`Box<dyn Store>`); the concrete backend is
/// chosen at open time. See the crate docs for the transactional contract.
pub trait Store: Send + Sync {
    /// Begins a transaction bound to a snapshot taken at call time.
    ///
    /// With `writable = true` this blocks until no other writable transaction
    /// is active; there is one global writer slot. Read-only transactions are
    /// admitted immediately and observe the last committed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start a transaction.
    fn begin<'s>(&'s self, writable: bool) -> StoreResult<Box<dyn Transaction + 's>>;

    /// Verifies the store can be released.
    ///
    /// Resources are freed when the store is dropped; `close` exists to catch
    /// leaks early. Calling it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ResourceLeak`] if any transaction is still open.
    /// That is a programming error, not a recoverable condition.
    fn close(&self) -> StoreResult<()>;
}

/// Convenience wrappers over [`Store::begin`].
///
/// The error type is generic so that layers above the store can use their
/// own error enums inside the closure, as long as they convert from
/// [`StoreError`].
pub trait StoreExt: Store {
    /// Runs `f` inside a writable transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls back if it returns `Err`. If `f`
    /// panics, the transaction is rolled back on unwind (the handle's `Drop`
    /// terminates it), so the writer slot is always released.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or any begin/commit error.
    fn update<E, F>(&self, f: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnOnce(&dyn Transaction) -> Result<(), E>,
    {
        let tx = self.begin(true)?;
        match f(tx.as_ref()) {
            Ok(()) => tx.commit().map_err(E::from),
            Err(err) => {
                tx.rollback()?;
                Err(err)
            }
        }
    }

    /// Runs `f` inside a read-only transaction.
    ///
    /// The snapshot is released when `f` returns, on success, error, and
    /// unwind alike.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or any begin error.
    fn view<E, F>(&self, f: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnOnce(&dyn Transaction) -> Result<(), E>,
    {
        let tx = self.begin(false)?;
        match f(tx.as_ref()) {
            Ok(()) => tx.commit().map_err(E::from),
            Err(err) => {
                tx.rollback()?;
                Err(err)
            }
        }
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// One atomic operation sequence against a store snapshot.
///
/// A transaction is `Active` until [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback) moves it to a terminal state. Both
/// transitions are idempotent; a second call is a no-op. Dropping an active
/// transaction rolls it back.
///
/// Mutations staged through a transaction are invisible to every other
/// transaction until commit.
pub trait Transaction {
    /// Whether this transaction may stage mutations.
    ///
    /// Fixed at [`Store::begin`] time.
    fn is_writable(&self) -> bool;

    /// Stages a new empty bucket.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ReadOnly`] on a read-only transaction
    /// - [`StoreError::EmptyName`] if `name` is blank
    /// - [`StoreError::AlreadyExists`] if the name exists in the snapshot or
    ///   the write overlay
    fn create_bucket<'t>(&'t self, name: &str) -> StoreResult<Box<dyn Bucket + 't>>;

    /// Looks up a bucket.
    ///
    /// Resolution precedence: staged deletion, then staged creation, then the
    /// snapshot.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyName`] if `name` is blank
    /// - [`StoreError::NotFound`] if the bucket is absent under the rules above
    fn get_bucket<'t>(&'t self, name: &str) -> StoreResult<Box<dyn Bucket + 't>>;

    /// Marks a bucket (and its nested children) deleted.
    ///
    /// Discards any staged creation for the name. Deleting an absent bucket
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ReadOnly`] on a read-only transaction
    /// - [`StoreError::EmptyName`] if `name` is blank
    fn delete_bucket(&self, name: &str) -> StoreResult<()>;

    /// Applies all staged mutations atomically.
    ///
    /// Bucket deletions are applied before bucket writes. For a read-only
    /// transaction this just releases the snapshot. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the durable engine fails to commit; the
    /// engine rolls back at its own layer, nothing is half-applied.
    fn commit(&self) -> StoreResult<()>;

    /// Discards all staged mutations.
    ///
    /// Always safe to call, idempotent, and a no-op after commit. Guarantees
    /// the writer slot and snapshot are released on every exit path.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the durable engine fails to abort.
    fn rollback(&self) -> StoreResult<()>;
}

/// A named namespace of key-value entries, scoped to one transaction's view.
///
/// Buckets nest: a child of bucket `root` named `child` is addressed by the
/// composite path `root/child`. Nested operations delegate to the owning
/// transaction under the same permission and precedence rules.
pub trait Bucket {
    /// Reads a key.
    ///
    /// Precedence: staged deletion, then staged write, then the snapshot
    /// value.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyName`] if `key` is blank
    /// - [`StoreError::NotFound`] if the key (or the bucket) is absent
    fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Stages a write, clearing any staged deletion for the key.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ReadOnly`] on a read-only transaction
    /// - [`StoreError::EmptyName`] if `key` is blank
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Stages a key deletion, clearing any staged write for the key.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ReadOnly`] on a read-only transaction
    /// - [`StoreError::EmptyName`] if `key` is blank
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Stages a new nested bucket under this one.
    ///
    /// # Errors
    ///
    /// As [`Transaction::create_bucket`].
    fn create_bucket<'b>(&'b self, name: &str) -> StoreResult<Box<dyn Bucket + 'b>>;

    /// Looks up a nested bucket under this one.
    ///
    /// # Errors
    ///
    /// As [`Transaction::get_bucket`].
    fn get_bucket<'b>(&'b self, name: &str) -> StoreResult<Box<dyn Bucket + 'b>>;

    /// Deletes a nested bucket under this one.
    ///
    /// # Errors
    ///
    /// As [`Transaction::delete_bucket`].
    fn delete_bucket(&self, name: &str) -> StoreResult<()>;

    /// Reads a key holding an 8-byte little-endian unsigned integer.
    ///
    /// # Errors
    ///
    /// As [`Bucket::get`], plus [`StoreError::Decode`] if the stored value is
    /// not exactly 8 bytes.
    fn get_u64(&self, key: &str) -> StoreResult<u64> {
        codec::decode_u64(&self.get(key)?)
    }

    /// Writes a key as an 8-byte little-endian unsigned integer.
    ///
    /// # Errors
    ///
    /// As [`Bucket::put`].
    fn put_u64(&self, key: &str, value: u64) -> StoreResult<()> {
        self.put(key, &codec::encode_u64(value))
    }
}

/// Rejects blank bucket and key names before any mutation.
pub(crate) fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(())
}

/// Joins a parent path and a child segment into a composite path.
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    let mut path = String::with_capacity(parent.len() + child.len() + 1);
    path.push_str(parent);
    path.push(PATH_SEPARATOR);
    path.push_str(child);
    path
}
