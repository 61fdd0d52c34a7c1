//! Test fixtures and log helpers.
//!
//! Provides convenience constructors for logs over the available stores.

use crate::faults::FaultyStore;
use s3wal_core::{ObjectWal, WalConfig};
use s3wal_store::{FsObjectStore, InMemoryObjectStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Bucket used by every fixture.
pub const TEST_BUCKET: &str = "test-bucket";

/// Prefix used by every fixture.
pub const TEST_PREFIX: &str = "wal";

/// A log over an in-memory store, with the store kept for inspection.
pub struct MemoryFixture {
    /// The log under test.
    pub wal: ObjectWal,
    /// The backing store.
    pub store: Arc<InMemoryObjectStore>,
}

impl MemoryFixture {
    /// Creates a fixture with default page and batch sizes.
    pub fn new() -> Self {
        Self::with_store(InMemoryObjectStore::new())
    }

    /// Creates a fixture over a preconfigured store.
    pub fn with_store(store: InMemoryObjectStore) -> Self {
        let store = Arc::new(store);
        let wal = ObjectWal::open(store.clone(), WalConfig::new(TEST_BUCKET, TEST_PREFIX))
            .expect("Failed to open in-memory log");
        Self { wal, store }
    }

    /// Opens a second log instance over the same store, as a restarted
    /// process would.
    pub fn reopen(&self) -> ObjectWal {
        ObjectWal::open(self.store.clone(), WalConfig::new(TEST_BUCKET, TEST_PREFIX))
            .expect("Failed to reopen in-memory log")
    }
}

impl Default for MemoryFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A log over a fault-injecting wrapper around an in-memory store.
pub struct FaultyFixture {
    /// The log under test.
    pub wal: ObjectWal,
    /// Fault controls.
    pub faults: Arc<FaultyStore>,
    /// The store beneath the faults.
    pub store: Arc<InMemoryObjectStore>,
}

impl FaultyFixture {
    /// Creates a fixture with no faults armed.
    pub fn new() -> Self {
        Self::with_store(InMemoryObjectStore::new(), WalConfig::new(TEST_BUCKET, TEST_PREFIX))
    }

    /// Creates a fixture over a preconfigured store and log config.
    pub fn with_store(store: InMemoryObjectStore, config: WalConfig) -> Self {
        let store = Arc::new(store);
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let wal = ObjectWal::open(faults.clone(), config).expect("Failed to open faulty log");
        Self { wal, faults, store }
    }
}

impl Default for FaultyFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A log over a filesystem store in a temporary directory.
pub struct FsFixture {
    /// The log under test.
    pub wal: ObjectWal,
    /// The backing store.
    pub store: Arc<FsObjectStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    pub dir: TempDir,
}

impl FsFixture {
    /// Creates a fixture in a fresh temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(FsObjectStore::open(dir.path()).expect("Failed to open fs store"));
        let wal = ObjectWal::open(store.clone(), WalConfig::new(TEST_BUCKET, TEST_PREFIX))
            .expect("Failed to open fs log");
        Self { wal, store, dir }
    }

    /// Opens a new store and log over the same directory.
    pub fn reopen(&self) -> ObjectWal {
        let store = FsObjectStore::open(self.dir.path()).expect("Failed to reopen fs store");
        ObjectWal::open(Arc::new(store), WalConfig::new(TEST_BUCKET, TEST_PREFIX))
            .expect("Failed to reopen fs log")
    }
}

impl Default for FsFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends `Record #1` .. `Record #n` and returns the offsets.
pub fn append_numbered(wal: &ObjectWal, n: u64) -> Vec<u64> {
    (1..=n)
        .map(|i| {
            wal.append(format!("Record #{i}").as_bytes())
                .expect("Failed to append numbered record")
        })
        .collect()
}
