//! Fault injection for object stores.
//!
//! [`FaultyStore`] wraps another store and fails selected calls so tests
//! can drive every error path of the log:
//!
//! 1. **Transport outages** - the next N puts, gets, lists or delete calls
//!    fail with `StoreError::Unavailable`
//! 2. **Per-key delete failures** - chosen keys survive an otherwise
//!    successful delete batch and are reported as `DeleteFailure`s
//! 3. **Call accounting** - counts list and delete calls to check
//!    pagination and batching

use parking_lot::Mutex;
use s3wal_store::{DeleteFailure, ListPage, ObjectStore, StoreError, StoreResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An object store wrapper that can simulate failures.
pub struct FaultyStore {
    inner: Arc<dyn ObjectStore>,
    fail_puts: AtomicUsize,
    fail_gets: AtomicUsize,
    fail_lists: AtomicUsize,
    fail_deletes: AtomicUsize,
    stuck_keys: Mutex<HashSet<String>>,
    list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

/// Decrements `counter` if positive; returns true if a failure is due.
fn take_fault(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl FaultyStore {
    /// Creates a wrapper with no faults armed.
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            fail_puts: AtomicUsize::new(0),
            fail_gets: AtomicUsize::new(0),
            fail_lists: AtomicUsize::new(0),
            fail_deletes: AtomicUsize::new(0),
            stuck_keys: Mutex::new(HashSet::new()),
            list_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Fails the next `n` puts.
    pub fn fail_puts(&self, n: usize) {
        self.fail_puts.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` gets.
    pub fn fail_gets(&self, n: usize) {
        self.fail_gets.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` list calls.
    pub fn fail_lists(&self, n: usize) {
        self.fail_lists.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` delete calls as a whole.
    pub fn fail_deletes(&self, n: usize) {
        self.fail_deletes.store(n, Ordering::SeqCst);
    }

    /// Makes `key` survive delete batches, reported as a per-key failure.
    pub fn stick_key(&self, key: impl Into<String>) {
        self.stuck_keys.lock().insert(key.into());
    }

    /// Number of list calls seen so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of delete calls seen so far.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Disarms every fault and clears the counters.
    pub fn reset(&self) {
        for counter in [
            &self.fail_puts,
            &self.fail_gets,
            &self.fail_lists,
            &self.fail_deletes,
            &self.list_calls,
            &self.delete_calls,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.stuck_keys.lock().clear();
    }
}

impl ObjectStore for FaultyStore {
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> StoreResult<()> {
        if take_fault(&self.fail_puts) {
            return Err(StoreError::unavailable("simulated put failure"));
        }
        self.inner.put(bucket, key, body)
    }

    fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        if take_fault(&self.fail_gets) {
            return Err(StoreError::unavailable("simulated get failure"));
        }
        self.inner.get(bucket, key)
    }

    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if take_fault(&self.fail_lists) {
            return Err(StoreError::unavailable("simulated list failure"));
        }
        self.inner.list_page(bucket, prefix, continuation)
    }

    fn delete_batch(&self, bucket: &str, keys: &[String]) -> StoreResult<Vec<DeleteFailure>> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if take_fault(&self.fail_deletes) {
            return Err(StoreError::unavailable("simulated delete failure"));
        }

        let stuck = self.stuck_keys.lock().clone();
        let (kept, deletable): (Vec<String>, Vec<String>) =
            keys.iter().cloned().partition(|key| stuck.contains(key));

        let mut failures = self.inner.delete_batch(bucket, &deletable)?;
        failures.extend(
            kept.into_iter()
                .map(|key| DeleteFailure::new(key, "simulated access denied")),
        );
        Ok(failures)
    }

    fn max_delete_batch(&self) -> usize {
        self.inner.max_delete_batch()
    }
}
