//! In-memory store backend.
//!
//! Reproduces the transactional contract of the durable backend without
//! relying on it: snapshot isolation through structural sharing, staged
//! writes in a per-transaction overlay, all-or-nothing commit, and a single
//! global writer slot.
//!
//! Committed state is a map of bucket path to `Arc`'d key map. A transaction
//! snapshot is a clone of that map taken at begin - cheap, since only the
//! `Arc`s are cloned - so readers observe exactly the state committed before
//! they began, whatever writers do afterwards.

use crate::error::{StoreError, StoreResult};
use crate::{join_path, validate_name, Bucket, Store, Transaction, PATH_SEPARATOR};
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Keys of one committed bucket, ordered.
type KeyMap = BTreeMap<String, Vec<u8>>;

/// Committed state: bucket path to shared key map.
type CommittedBuckets = HashMap<String, Arc<KeyMap>>;

/// The single global writer slot.
///
/// `acquire` blocks the calling thread until the slot is free. This is a
/// mutual-exclusion admission gate, not a lock per bucket or key; readers
/// never touch it.
#[derive(Default)]
struct WriterGate {
    held: Mutex<bool>,
    freed: Condvar,
}

impl WriterGate {
    fn acquire(&self) {
        let mut held = self.held.lock();
        while *held {
            self.freed.wait(&mut held);
        }
        *held = true;
    }

    fn release(&self) {
        let mut held = self.held.lock();
        *held = false;
        self.freed.notify_one();
    }
}

/// A volatile store. Nothing survives the process.
///
/// Implements the same transactional contract as [`crate::RedbStore`]; see
/// the crate docs. Useful for tests and for catalogue runs that never need
/// to persist.
#[derive(Default)]
pub struct MemoryStore {
    committed: Mutex<CommittedBuckets>,
    writer: WriterGate,
    open_txns: AtomicUsize,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn begin<'s>(&'s self, writable: bool) -> StoreResult<Box<dyn Transaction + 's>> {
        if writable {
            self.writer.acquire();
        }
        // Snapshot after admission, so a writer sees the previous writer's
        // commit.
        let snapshot = self.committed.lock().clone();
        self.open_txns.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(writable, "memory transaction started");
        Ok(Box::new(MemoryTransaction {
            store: self,
            snapshot,
            overlay: Mutex::new(Overlay::default()),
            writable,
            terminal: Mutex::new(false),
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

/// Staged keys of one bucket inside a transaction's write overlay.
#[derive(Default)]
struct StagedKeys {
    writes: BTreeMap<String, Vec<u8>>,
    deletes: HashSet<String>,
}

/// One bucket in the write overlay: either freshly created or a dirtied copy
/// of a snapshot bucket. The mutex serializes concurrent key operations from
/// threads sharing one transaction handle.
#[derive(Default)]
struct OverlayBucket {
    staged: Mutex<StagedKeys>,
}

/// The write overlay of a transaction.
#[derive(Default)]
struct Overlay {
    /// Created or dirtied buckets by path.
    buckets: HashMap<String, Arc<OverlayBucket>>,
    /// Bucket paths marked deleted.
    deleted: HashSet<String>,
}

/// A transaction over a [`MemoryStore`].
///
/// Owns its write overlay exclusively; the store retains ownership of
/// committed data. Dropping an active transaction rolls it back.
struct MemoryTransaction<'s> {
    store: &'s MemoryStore,
    snapshot: CommittedBuckets,
    overlay: Mutex<Overlay>,
    writable: bool,
    terminal: Mutex<bool>,
}

impl<'s> MemoryTransaction<'s> {
    fn ensure_active(&self) -> StoreResult<()> {
        if *self.terminal.lock() {
            return Err(StoreError::TransactionDone);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Moves the transaction to its terminal state exactly once, applying the
    /// overlay when `apply` is set. Repeat calls are no-ops.
    fn terminate(&self, apply: bool) {
        {
            let mut terminal = self.terminal.lock();
            if *terminal {
                return;
            }
            *terminal = true;
        }
        if apply && self.writable {
            self.apply_overlay();
        }
        if self.writable {
            self.store.writer.release();
        }
        self.store.open_txns.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(applied = apply && self.writable, "memory transaction finished");
    }

    /// Merges the overlay into the committed state: deletions first, then
    /// bucket writes. Plain map merges - there is no partial-failure path.
    fn apply_overlay(&self) {
        let overlay = self.overlay.lock();
        let mut committed = self.store.committed.lock();
        for path in &overlay.deleted {
            committed.remove(path);
        }
        for (path, bucket) in &overlay.buckets {
            let staged = bucket.staged.lock();
            let mut keys = committed
                .get(path)
                .map(|shared| KeyMap::clone(shared))
                .unwrap_or_default();
            for (key, value) in &staged.writes {
                keys.insert(key.clone(), value.clone());
            }
            for key in &staged.deletes {
                keys.remove(key);
            }
            committed.insert(path.clone(), Arc::new(keys));
        }
    }

    /// Whether a bucket is visible at `path` under overlay precedence:
    /// staged deletion, then staged creation, then the snapshot.
    fn bucket_visible(&self, path: &str) -> bool {
        let overlay = self.overlay.lock();
        if overlay.deleted.contains(path) {
            return false;
        }
        overlay.buckets.contains_key(path) || self.snapshot.contains_key(path)
    }

    fn create_bucket_at(&self, path: String) -> StoreResult<()> {
        self.ensure_writable()?;
        self.ensure_active()?;
        let mut overlay = self.overlay.lock();
        if overlay.buckets.contains_key(&path) || self.snapshot.contains_key(&path) {
            return Err(StoreError::already_exists(path));
        }
        overlay.deleted.remove(&path);
        overlay.buckets.insert(path, Arc::new(OverlayBucket::default()));
        Ok(())
    }

    fn get_bucket_at<'t>(&'t self, path: String) -> StoreResult<Box<dyn Bucket + 't>> {
        self.ensure_active()?;
        if !self.bucket_visible(&path) {
            return Err(StoreError::not_found(path));
        }
        Ok(Box::new(MemoryBucket { txn: self, path }))
    }

    fn delete_bucket_at(&self, path: &str) -> StoreResult<()> {
        self.ensure_writable()?;
        self.ensure_active()?;
        let prefix = format!("{path}{PATH_SEPARATOR}");
        let mut overlay = self.overlay.lock();
        overlay
            .buckets
            .retain(|name, _| name != path && !name.starts_with(&prefix));
        overlay.deleted.insert(path.to_owned());
        for name in self.snapshot.keys() {
            if name.starts_with(&prefix) {
                overlay.deleted.insert(name.clone());
            }
        }
        Ok(())
    }

    /// Returns the overlay bucket for `path`, creating it lazily when a write
    /// first dirties a snapshot bucket.
    fn overlay_bucket(&self, path: &str) -> StoreResult<Arc<OverlayBucket>> {
        let mut overlay = self.overlay.lock();
        if overlay.deleted.contains(path) {
            return Err(StoreError::not_found(path));
        }
        if let Some(bucket) = overlay.buckets.get(path) {
            return Ok(Arc::clone(bucket));
        }
        if !self.snapshot.contains_key(path) {
            return Err(StoreError::not_found(path));
        }
        let bucket = Arc::new(OverlayBucket::default());
        overlay.buckets.insert(path.to_owned(), Arc::clone(&bucket));
        Ok(bucket)
    }

    fn get_key(&self, path: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.ensure_active()?;
        let staged_bucket = {
            let overlay = self.overlay.lock();
            if overlay.deleted.contains(path) {
                return Err(StoreError::not_found(path));
            }
            overlay.buckets.get(path).cloned()
        };
        if let Some(bucket) = staged_bucket {
            let staged = bucket.staged.lock();
            if staged.deletes.contains(key) {
                return Err(StoreError::not_found(key));
            }
            if let Some(value) = staged.writes.get(key) {
                return Ok(value.clone());
            }
        }
        self.snapshot
            .get(path)
            .and_then(|keys| keys.get(key))
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    fn put_key(&self, path: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        self.ensure_writable()?;
        self.ensure_active()?;
        let bucket = self.overlay_bucket(path)?;
        let mut staged = bucket.staged.lock();
        staged.deletes.remove(key);
        staged.writes.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete_key(&self, path: &str, key: &str) -> StoreResult<()> {
        self.ensure_writable()?;
        self.ensure_active()?;
        let bucket = self.overlay_bucket(path)?;
        let mut staged = bucket.staged.lock();
        staged.writes.remove(key);
        staged.deletes.insert(key.to_owned());
        Ok(())
    }
}

impl<'s> Transaction for MemoryTransaction<'s> {
    fn is_writable(&self) -> bool {
        self.writable
    }

    fn create_bucket<'t>(&'t self, name: &str) -> StoreResult<Box<dyn Bucket + 't>> {
        self.ensure_writable()?;
        validate_name(name)?;
        self.create_bucket_at(name.to_owned())?;
        Ok(Box::new(MemoryBucket {
            txn: self,
            path: name.to_owned(),
        }))
    }

    fn get_bucket<'t>(&'t self, name: &str) -> StoreResult<Box<dyn Bucket + 't>> {
        validate_name(name)?;
        self.get_bucket_at(name.to_owned())
    }

    fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        self.ensure_writable()?;
        validate_name(name)?;
        self.delete_bucket_at(name)
    }

    fn commit(&self) -> StoreResult<()> {
        self.terminate(true);
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        self.terminate(false);
        Ok(())
    }
}

impl<'s> Drop for MemoryTransaction<'s> {
    fn drop(&mut self) {
        // Rollback semantics on unwind or forgotten handles.
        self.terminate(false);
    }
}

/// Handle to one bucket path within a [`MemoryTransaction`]'s view.
struct MemoryBucket<'t> {
    txn: &'t MemoryTransaction<'t>,
    path: String,
}

impl<'t> Bucket for MemoryBucket<'t> {
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
        self.txn.ensure_writable()?;
        validate_name(name)?;
        let path = join_path(&self.path, name);
        self.txn.create_bucket_at(path.clone())?;
        Ok(Box::new(MemoryBucket {
            txn: self.txn,
            path,
        }))
    }

    fn get_bucket<'b>(&'b self, name: &str) -> StoreResult<Box<dyn Bucket + 'b>> {
        validate_name(name)?;
        self.txn.get_bucket_at(join_path(&self.path, name))
    }

    fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        self.txn.ensure_writable()?;
        validate_name(name)?;
        self.txn.delete_bucket_at(&join_path(&self.path, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreExt;
    use std::time::Duration;

    #[test]
    fn put_is_visible_within_transaction_before_commit() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        let bucket = tx.create_bucket("vol").unwrap();
        bucket.put("key", b"value").unwrap();
        assert_eq!(bucket.get("key").unwrap(), b"value");
        tx.rollback().unwrap();
    }

    #[test]
    fn staged_delete_hides_committed_key() {
        let store = MemoryStore::new();
        store
            .update(|tx| -> StoreResult<()> {
                let bucket = tx.create_bucket("vol")?;
                bucket.put("key", b"value")
            })
            .unwrap();

        let tx = store.begin(true).unwrap();
        let bucket = tx.get_bucket("vol").unwrap();
        bucket.delete("key").unwrap();
        assert!(matches!(
            bucket.get("key"),
            Err(StoreError::NotFound { .. })
        ));
        tx.rollback().unwrap();

        // The delete was never committed.
        store
            .view(|tx| -> StoreResult<()> {
                let bucket = tx.get_bucket("vol")?;
                assert_eq!(bucket.get("key")?, b"value");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn put_clears_staged_delete() {
        let store = MemoryStore::new();
        store
            .update(|tx| -> StoreResult<()> {
                let bucket = tx.create_bucket("vol")?;
                bucket.put("key", b"old")
            })
            .unwrap();

        store
            .update(|tx| -> StoreResult<()> {
                let bucket = tx.get_bucket("vol")?;
                bucket.delete("key")?;
                bucket.put("key", b"new")?;
                assert_eq!(bucket.get("key")?, b"new");
                Ok(())
            })
            .unwrap();

        store
            .view(|tx| -> StoreResult<()> {
                assert_eq!(tx.get_bucket("vol")?.get("key")?, b"new");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn rolled_back_writes_are_invisible() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        tx.create_bucket("vol").unwrap().put("key", b"value").unwrap();
        tx.rollback().unwrap();

        let tx = store.begin(false).unwrap();
        assert!(matches!(
            tx.get_bucket("vol"),
            Err(StoreError::NotFound { .. })
        ));
        tx.rollback().unwrap();
    }

    #[test]
    fn committed_writes_are_visible_to_new_readers() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        tx.create_bucket("vol").unwrap().put("key", b"value").unwrap();
        tx.commit().unwrap();

        let tx = store.begin(false).unwrap();
        assert_eq!(tx.get_bucket("vol").unwrap().get("key").unwrap(), b"value");
        tx.commit().unwrap();
    }

    #[test]
    fn staged_writes_are_invisible_to_concurrent_readers() {
        let store = MemoryStore::new();
        store.update(|tx| tx.create_bucket("vol").map(|_| ())).unwrap();

        let writer = store.begin(true).unwrap();
        writer.get_bucket("vol").unwrap().put("key", b"new").unwrap();

        // A reader admitted while the writer is active sees the snapshot.
        let reader = store.begin(false).unwrap();
        assert!(matches!(
            reader.get_bucket("vol").unwrap().get("key"),
            Err(StoreError::NotFound { .. })
        ));
        reader.rollback().unwrap();
        writer.commit().unwrap();
    }

    #[test]
    fn reader_snapshot_is_stable_across_writer_commit() {
        let store = MemoryStore::new();
        store
            .update(|tx| tx.create_bucket("vol")?.put("key", b"old"))
            .unwrap();

        let reader = store.begin(false).unwrap();
        store
            .update(|tx| tx.get_bucket("vol")?.put("key", b"new"))
            .unwrap();

        // The reader began before the second commit.
        assert_eq!(reader.get_bucket("vol").unwrap().get("key").unwrap(), b"old");
        reader.rollback().unwrap();
    }

    #[test]
    fn create_existing_bucket_fails() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        tx.create_bucket("vol").unwrap();
        assert!(matches!(
            tx.create_bucket("vol"),
            Err(StoreError::AlreadyExists { .. })
        ));
        tx.rollback().unwrap();
    }

    #[test]
    fn create_bucket_existing_in_snapshot_fails() {
        let store = MemoryStore::new();
        store.update(|tx| tx.create_bucket("vol").map(|_| ())).unwrap();

        let tx = store.begin(true).unwrap();
        assert!(matches!(
            tx.create_bucket("vol"),
            Err(StoreError::AlreadyExists { .. })
        ));
        // Even a staged delete does not free the name within this transaction.
        tx.delete_bucket("vol").unwrap();
        assert!(matches!(
            tx.create_bucket("vol"),
            Err(StoreError::AlreadyExists { .. })
        ));
        tx.rollback().unwrap();
    }

    #[test]
    fn empty_names_are_rejected() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        assert!(matches!(tx.create_bucket(""), Err(StoreError::EmptyName)));
        assert!(matches!(tx.get_bucket(""), Err(StoreError::EmptyName)));
        assert!(matches!(tx.delete_bucket(""), Err(StoreError::EmptyName)));
        let bucket = tx.create_bucket("vol").unwrap();
        assert!(matches!(bucket.get(""), Err(StoreError::EmptyName)));
        assert!(matches!(bucket.put("", b"x"), Err(StoreError::EmptyName)));
        assert!(matches!(bucket.delete(""), Err(StoreError::EmptyName)));
        assert!(matches!(bucket.create_bucket(""), Err(StoreError::EmptyName)));
        tx.rollback().unwrap();
    }

    #[test]
    fn read_only_transaction_rejects_mutation() {
        let store = MemoryStore::new();
        store.update(|tx| tx.create_bucket("vol").map(|_| ())).unwrap();

        let tx = store.begin(false).unwrap();
        assert!(matches!(tx.create_bucket("x"), Err(StoreError::ReadOnly)));
        assert!(matches!(tx.delete_bucket("vol"), Err(StoreError::ReadOnly)));
        let bucket = tx.get_bucket("vol").unwrap();
        assert!(matches!(bucket.put("k", b"v"), Err(StoreError::ReadOnly)));
        assert!(matches!(bucket.delete("k"), Err(StoreError::ReadOnly)));
        tx.rollback().unwrap();
    }

    #[test]
    fn deleted_bucket_resolves_not_found() {
        let store = MemoryStore::new();
        store
            .update(|tx| tx.create_bucket("vol")?.put("key", b"value"))
            .unwrap();

        let tx = store.begin(true).unwrap();
        let bucket = tx.get_bucket("vol").unwrap();
        tx.delete_bucket("vol").unwrap();
        assert!(matches!(
            tx.get_bucket("vol"),
            Err(StoreError::NotFound { .. })
        ));
        // A stale handle fails loudly instead of resurrecting the bucket.
        assert!(matches!(bucket.get("key"), Err(StoreError::NotFound { .. })));
        assert!(matches!(
            bucket.put("key", b"x"),
            Err(StoreError::NotFound { .. })
        ));
        tx.commit().unwrap();

        store
            .view(|tx| -> StoreResult<()> {
                assert!(matches!(
                    tx.get_bucket("vol"),
                    Err(StoreError::NotFound { .. })
                ));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn delete_bucket_discards_staged_creation() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        tx.create_bucket("vol").unwrap();
        tx.delete_bucket("vol").unwrap();
        tx.commit().unwrap();

        store
            .view(|tx| -> StoreResult<()> {
                assert!(matches!(
                    tx.get_bucket("vol"),
                    Err(StoreError::NotFound { .. })
                ));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn delete_bucket_removes_nested_children() {
        let store = MemoryStore::new();
        store
            .update(|tx| -> StoreResult<()> {
                let parent = tx.create_bucket("parent")?;
                let child = parent.create_bucket("child")?;
                child.put("key", b"value")
            })
            .unwrap();

        store.update(|tx| tx.delete_bucket("parent")).unwrap();

        store
            .view(|tx| -> StoreResult<()> {
                assert!(matches!(
                    tx.get_bucket("parent"),
                    Err(StoreError::NotFound { .. })
                ));
                assert!(matches!(
                    tx.get_bucket("parent/child"),
                    Err(StoreError::NotFound { .. })
                ));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn nested_buckets_resolve_by_composite_path() {
        let store = MemoryStore::new();
        store
            .update(|tx| -> StoreResult<()> {
                let parent = tx.create_bucket("parent")?;
                let child = parent.create_bucket("child")?;
                child.put("key", b"value")
            })
            .unwrap();

        store
            .view(|tx| -> StoreResult<()> {
                let parent = tx.get_bucket("parent")?;
                let child = parent.get_bucket("child")?;
                assert_eq!(child.get("key")?, b"value");
                // Same bucket through the flat composite path.
                assert_eq!(tx.get_bucket("parent/child")?.get("key")?, b"value");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn commit_and_rollback_are_idempotent() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        tx.create_bucket("vol").unwrap();
        tx.commit().unwrap();
        tx.commit().unwrap();
        // Rollback after commit is the mandated no-op on the exit path.
        tx.rollback().unwrap();

        store
            .view(|tx| tx.get_bucket("vol").map(|_| ()))
            .unwrap();
    }

    #[test]
    fn operations_after_terminal_state_fail_loudly() {
        let store = MemoryStore::new();
        let tx = store.begin(true).unwrap();
        tx.commit().unwrap();
        assert!(matches!(
            tx.create_bucket("vol"),
            Err(StoreError::TransactionDone)
        ));
        assert!(matches!(
            tx.get_bucket("vol"),
            Err(StoreError::TransactionDone)
        ));
    }

    #[test]
    fn update_rolls_back_on_error() {
        let store = MemoryStore::new();
        let result = store.update(|tx| -> StoreResult<()> {
            tx.create_bucket("vol")?;
            Err(StoreError::decode("boom"))
        });
        assert!(result.is_err());

        store
            .view(|tx| -> StoreResult<()> {
                assert!(matches!(
                    tx.get_bucket("vol"),
                    Err(StoreError::NotFound { .. })
                ));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn dropped_transaction_rolls_back_and_releases_writer() {
        let store = MemoryStore::new();
        {
            let tx = store.begin(true).unwrap();
            tx.create_bucket("vol").unwrap();
            // No commit; the handle is dropped here.
        }
        // The writer slot was released: a new writer is admitted.
        store
            .update(|tx| -> StoreResult<()> {
                assert!(matches!(
                    tx.get_bucket("vol"),
                    Err(StoreError::NotFound { .. })
                ));
                Ok(())
            })
            .unwrap();
        store.close().unwrap();
    }

    #[test]
    fn close_with_open_transaction_is_a_resource_leak() {
        let store = MemoryStore::new();
        let tx = store.begin(false).unwrap();
        assert!(matches!(
            store.close(),
            Err(StoreError::ResourceLeak { open: 1 })
        ));
        tx.rollback().unwrap();
        store.close().unwrap();
        // Closing twice is a no-op.
        store.close().unwrap();
    }

    #[test]
    fn second_writer_blocks_until_first_terminates() {
        let store = MemoryStore::new();
        let first = store.begin(true).unwrap();

        std::thread::scope(|scope| {
            let handle = scope.spawn(|| {
                let second = store.begin(true).unwrap();
                second.create_bucket("from-second").unwrap();
                second.commit().unwrap();
            });

            // Give the second writer time to reach the admission gate.
            std::thread::sleep(Duration::from_millis(50));
            assert!(!handle.is_finished(), "second writer was admitted early");

            first.create_bucket("from-first").unwrap();
            first.commit().unwrap();
            handle.join().unwrap();
        });

        store
            .view(|tx| -> StoreResult<()> {
                tx.get_bucket("from-first")?;
                tx.get_bucket("from-second")?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn readers_are_not_blocked_by_an_active_writer() {
        let store = MemoryStore::new();
        store
            .update(|tx| tx.create_bucket("vol")?.put("key", b"value"))
            .unwrap();

        let writer = store.begin(true).unwrap();
        writer.get_bucket("vol").unwrap().put("key", b"dirty").unwrap();

        store
            .view(|tx| -> StoreResult<()> {
                assert_eq!(tx.get_bucket("vol")?.get("key")?, b"value");
                Ok(())
            })
            .unwrap();
        writer.rollback().unwrap();
    }

    #[test]
    fn u64_helpers_round_trip_through_bucket() {
        let store = MemoryStore::new();
        store
            .update(|tx| -> StoreResult<()> {
                let bucket = tx.create_bucket("stats")?;
                bucket.put_u64("count", 42)?;
                assert_eq!(bucket.get_u64("count")?, 42);
                Ok(())
            })
            .unwrap();

        store
            .view(|tx| -> StoreResult<()> {
                let bucket = tx.get_bucket("stats")?;
                assert_eq!(bucket.get_u64("count")?, 42);
                bucket.put("bad", b"xyz").err().unwrap();
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn wrong_length_u64_fails_to_decode() {
        let store = MemoryStore::new();
        store
            .update(|tx| -> StoreResult<()> {
                let bucket = tx.create_bucket("stats")?;
                bucket.put("count", b"xyz")?;
                assert!(matches!(
                    bucket.get_u64("count"),
                    Err(StoreError::Decode { .. })
                ));
                Ok(())
            })
            .unwrap();
    }
}
