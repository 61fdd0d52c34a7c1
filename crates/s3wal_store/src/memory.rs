//! In-memory object store for testing.

use crate::error::{StoreError, StoreResult};
use crate::store::{
    paginate, DeleteFailure, ListPage, ObjectStore, DEFAULT_MAX_DELETE_BATCH, DEFAULT_PAGE_SIZE,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

type Bucket = BTreeMap<String, Vec<u8>>;

/// An in-memory object store.
///
/// This store keeps every bucket as an ordered map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral logs that don't need persistence
///
/// Listing is paginated with a configurable page size so tests can force
/// multi-page scans with only a handful of objects.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use s3wal_store::{InMemoryObjectStore, ObjectStore};
///
/// let store = InMemoryObjectStore::new().with_page_size(2);
/// for key in ["a/1", "a/2", "a/3"] {
///     store.put("b", key, b"x").unwrap();
/// }
/// let page = store.list_page("b", "a/", None).unwrap();
/// assert_eq!(page.keys.len(), 2);
/// assert!(page.next.is_some());
/// ```
#[derive(Debug)]
pub struct InMemoryObjectStore {
    buckets: RwLock<HashMap<String, Bucket>>,
    page_size: usize,
    max_delete_batch: usize,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            max_delete_batch: DEFAULT_MAX_DELETE_BATCH,
        }
    }
}

impl InMemoryObjectStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of keys returned per listing page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the ceiling on keys per delete call.
    #[must_use]
    pub fn with_max_delete_batch(mut self, limit: usize) -> Self {
        self.max_delete_batch = limit;
        self
    }

    /// Returns all keys in a bucket, in order.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns a copy of one object, if present.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// Returns the number of objects in a bucket.
    #[must_use]
    pub fn len(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, Bucket::len)
    }

    /// Returns true if the bucket holds no objects.
    #[must_use]
    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::invalid_key(key, "key is empty"));
        }
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.object(bucket, key)
            .ok_or_else(|| StoreError::not_found(bucket, key))
    }

    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        let buckets = self.buckets.read();
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ListPage::default());
        };

        let matching: Vec<String> = objects
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        Ok(paginate(matching, continuation, self.page_size))
    }

    fn delete_batch(&self, bucket: &str, keys: &[String]) -> StoreResult<Vec<DeleteFailure>> {
        if keys.len() > self.max_delete_batch {
            return Err(StoreError::BatchTooLarge {
                len: keys.len(),
                limit: self.max_delete_batch,
            });
        }

        let mut buckets = self.buckets.write();
        if let Some(objects) = buckets.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(Vec::new())
    }

    fn max_delete_batch(&self) -> usize {
        self.max_delete_batch
    }
}
