//! Store fixtures with automatic cleanup.
//!
//! The store contract holds for both backends, so most tests should run
//! against both. [`with_each_store`] is the one-liner for that.

use katalog_store::{MemoryStore, RedbStore, Store};
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store under test.
    pub store: Box<dyn Store>,
    /// Backend label for assertion messages.
    pub backend: &'static str,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an in-memory test store.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            backend: "memory",
            _temp_dir: None,
        }
    }

    /// Creates a durable test store in a temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or database cannot be created.
    #[must_use]
    pub fn durable() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store =
            RedbStore::open(temp_dir.path().join("test.db")).expect("failed to open test store");
        Self {
            store: Box::new(store),
            backend: "durable",
            _temp_dir: Some(temp_dir),
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

/// Runs `test` once against each backend.
pub fn with_each_store(test: impl Fn(&dyn Store)) {
    for fixture in [TestStore::memory(), TestStore::durable()] {
        test(fixture.store.as_ref());
        fixture
            .store
            .close()
            .unwrap_or_else(|err| panic!("{} backend leaked: {err}", fixture.backend));
    }
}
