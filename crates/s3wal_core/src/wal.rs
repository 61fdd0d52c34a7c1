//! The object-store log engine.

use crate::config::WalConfig;
use crate::error::{WalError, WalResult};
use crate::key::{encode_key, list_prefix};
use crate::listing::{collect_offsets, KeyPages};
use crate::record::{encode_frame, FrameError, Record};
use parking_lot::Mutex;
use s3wal_store::{DeleteFailure, ObjectStore, StoreError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An append-only log whose records are individual objects.
///
/// One `ObjectWal` owns one prefix. Its only mutable state is the cached
/// length: the highest offset it knows of, `0` when empty or unknown. The
/// cached length is advisory until [`ObjectWal::recover`] has run.
///
/// # Locking
///
/// The cached length sits behind a mutex that stays held across the
/// store call in `append`, `last_record` and `recover`, so offset
/// assignment is serialized within a process at the cost of one network
/// round trip per lock hold. `truncate` lists and deletes without the
/// lock and takes it only for the final update. `read` never locks.
///
/// # Single Writer
///
/// Appends are plain overwrites with no conditional write. Two processes
/// appending to one prefix will compute the same offset and the later
/// write silently replaces the earlier one. Callers must ensure at most
/// one writer per prefix.
pub struct ObjectWal {
    store: Arc<dyn ObjectStore>,
    config: WalConfig,
    length: Mutex<u64>,
}

impl ObjectWal {
    /// Creates a log over `store`. Does not touch the store.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::InvalidConfig`] if the configuration is unusable.
    pub fn open(store: Arc<dyn ObjectStore>, config: WalConfig) -> WalResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            length: Mutex::new(0),
        })
    }

    /// Bucket holding the log.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Normalized key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Highest offset this instance knows of.
    #[must_use]
    pub fn cached_length(&self) -> u64 {
        *self.length.lock()
    }

    /// Object key for an offset.
    #[must_use]
    pub fn key_for(&self, offset: u64) -> String {
        encode_key(&self.config.prefix, offset)
    }

    /// Appends a record and returns its offset.
    ///
    /// The offset is `cached_length + 1`. On failure the cached length is
    /// unchanged and the next attempt reuses the same offset.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::StoreWriteFailed`] if the put fails, or
    /// [`WalError::OffsetExhausted`] at `u64::MAX`.
    pub fn append(&self, data: &[u8]) -> WalResult<u64> {
        let mut length = self.length.lock();
        let next = length.checked_add(1).ok_or(WalError::OffsetExhausted)?;
        let key = self.key_for(next);
        let frame = encode_frame(next, data);

        self.store
            .put(&self.config.bucket, &key, &frame)
            .map_err(|source| WalError::StoreWriteFailed {
                key: key.clone(),
                offset: next,
                source,
            })?;

        *length = next;
        debug!(offset = next, bytes = data.len(), "appended record");
        Ok(next)
    }

    /// Reads and validates the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::NotFound`] if no object exists (always for
    /// offset 0), an integrity error if the object fails validation, or
    /// [`WalError::StoreReadFailed`] for transport failures.
    pub fn read(&self, offset: u64) -> WalResult<Record> {
        let key = self.key_for(offset);
        if offset == 0 {
            return Err(WalError::NotFound { key, offset });
        }

        let frame = match self.store.get(&self.config.bucket, &key) {
            Ok(frame) => frame,
            Err(e) if e.is_not_found() => return Err(WalError::NotFound { key, offset }),
            Err(source) => return Err(WalError::StoreReadFailed { key, source }),
        };

        Record::decode(offset, &frame).map_err(|e| {
            warn!(key = %key, error = %e, "record failed validation");
            integrity_error(key, offset, e)
        })
    }

    /// Returns the record with the highest offset.
    ///
    /// Lists the whole prefix, takes the greatest valid key, updates the
    /// cached length to its offset and reads it. This is the most
    /// expensive operation: one list call per page of keys.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::EmptyLog`] if the prefix holds no valid keys,
    /// [`WalError::StoreListFailed`] if listing fails, or any error of
    /// [`ObjectWal::read`].
    pub fn last_record(&self) -> WalResult<Record> {
        let mut length = self.length.lock();
        let last = self.scan()?.into_iter().map(|(_, offset)| offset).max();

        let Some(offset) = last else {
            *length = 0;
            return Err(WalError::EmptyLog {
                prefix: self.config.prefix.clone(),
            });
        };

        *length = offset;
        self.read(offset)
    }

    /// Rebuilds the cached length from the store and returns it.
    ///
    /// Keys that are not record keys of this log are skipped. Returns `0`
    /// for an empty prefix. Call this before trusting the cached length in
    /// a new process, and after any failed or cancelled operation.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::StoreListFailed`] if listing fails.
    pub fn recover(&self) -> WalResult<u64> {
        let mut length = self.length.lock();
        let max = self
            .scan()?
            .into_iter()
            .map(|(_, offset)| offset)
            .max()
            .unwrap_or(0);

        *length = max;
        info!(prefix = %self.config.prefix, last_offset = max, "recovered log length");
        Ok(max)
    }

    /// Deletes every record with offset greater than `after_offset`.
    ///
    /// `after_offset = 0` clears the log. Keys that are not record keys of
    /// this log are kept.
    ///
    /// # Errors
    ///
    /// - [`WalError::StoreListFailed`] if listing fails
    /// - [`WalError::StoreDeleteFailed`] if a delete call fails; the
    ///   cached length is not updated
    /// - [`WalError::PartialDeleteFailure`] if the store reports per-key
    ///   failures; the cached length is not updated and callers must
    ///   recover before continuing
    pub fn truncate(&self, after_offset: u64) -> WalResult<()> {
        let doomed: Vec<String> = self
            .scan()?
            .into_iter()
            .filter(|&(_, offset)| offset > after_offset)
            .map(|(key, _)| key)
            .collect();

        let batch_size = self
            .config
            .delete_batch_limit
            .min(self.store.max_delete_batch())
            .max(1);

        let mut failures: Vec<DeleteFailure> = Vec::new();
        for batch in doomed.chunks(batch_size) {
            let batch_failures = self
                .store
                .delete_batch(&self.config.bucket, batch)
                .map_err(|source| delete_error(batch, source))?;
            failures.extend(batch_failures);
        }

        if !failures.is_empty() {
            warn!(
                prefix = %self.config.prefix,
                failed = failures.len(),
                "truncate left undeleted keys"
            );
            return Err(WalError::PartialDeleteFailure { failures });
        }

        *self.length.lock() = after_offset;
        info!(
            prefix = %self.config.prefix,
            after_offset,
            deleted = doomed.len(),
            "truncated log"
        );
        Ok(())
    }

    /// Lists the prefix and returns every record key of this log with its
    /// offset.
    fn scan(&self) -> WalResult<Vec<(String, u64)>> {
        let prefix = list_prefix(&self.config.prefix);
        let pages = KeyPages::new(self.store.as_ref(), &self.config.bucket, &prefix);
        collect_offsets(pages, &self.config.prefix)
            .map_err(|source| WalError::StoreListFailed { prefix, source })
    }
}

fn integrity_error(key: String, offset: u64, error: FrameError) -> WalError {
    match error {
        FrameError::Truncated { len } => WalError::Truncated { key, len },
        FrameError::OffsetMismatch { expected, actual } => WalError::OffsetMismatch {
            key,
            expected,
            actual,
        },
        FrameError::ChecksumMismatch => WalError::ChecksumMismatch { key, offset },
    }
}

fn delete_error(batch: &[String], source: StoreError) -> WalError {
    WalError::StoreDeleteFailed {
        first_key: batch.first().cloned().unwrap_or_default(),
        count: batch.len(),
        source,
    }
}

impl std::fmt::Debug for ObjectWal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectWal")
            .field("bucket", &self.config.bucket)
            .field("prefix", &self.config.prefix)
            .field("cached_length", &self.cached_length())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3wal_store::InMemoryObjectStore;

    fn create_wal() -> (Arc<InMemoryObjectStore>, ObjectWal) {
        let store = Arc::new(InMemoryObjectStore::new());
        let wal = ObjectWal::open(store.clone(), WalConfig::new("bucket", "wal")).unwrap();
        (store, wal)
    }

    #[test]
    fn open_rejects_bad_config() {
        let store = Arc::new(InMemoryObjectStore::new());
        let result = ObjectWal::open(store, WalConfig::new("bucket", "/"));
        assert!(matches!(result, Err(WalError::InvalidConfig { .. })));
    }

    #[test]
    fn append_assigns_consecutive_offsets() {
        let (store, wal) = create_wal();
        assert_eq!(wal.append(b"a").unwrap(), 1);
        assert_eq!(wal.append(b"b").unwrap(), 2);
        assert_eq!(wal.cached_length(), 2);
        assert_eq!(
            store.keys("bucket"),
            vec!["wal/00000000000000000001", "wal/00000000000000000002"]
        );
    }

    #[test]
    fn append_then_read() {
        let (_store, wal) = create_wal();
        let offset = wal.append(b"hello").unwrap();
        let record = wal.read(offset).unwrap();
        assert_eq!(record, Record::new(1, b"hello".to_vec()));
    }

    #[test]
    fn read_zero_is_not_found() {
        let (_store, wal) = create_wal();
        assert!(matches!(
            wal.read(0),
            Err(WalError::NotFound { offset: 0, .. })
        ));
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_store, wal) = create_wal();
        let err = wal.read(9).unwrap_err();
        assert!(err.is_absence());
        assert!(err.to_string().contains("wal/00000000000000000009"));
    }

    #[test]
    fn read_detects_swapped_objects() {
        let (store, wal) = create_wal();
        wal.append(b"one").unwrap();
        wal.append(b"two").unwrap();
        let first = store.object("bucket", &wal.key_for(1)).unwrap();
        store.put("bucket", &wal.key_for(2), &first).unwrap();

        assert!(matches!(
            wal.read(2),
            Err(WalError::OffsetMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn read_detects_short_object() {
        let (store, wal) = create_wal();
        store.put("bucket", &wal.key_for(1), &[0u8; 12]).unwrap();
        assert!(matches!(
            wal.read(1),
            Err(WalError::Truncated { len: 12, .. })
        ));
    }

    #[test]
    fn last_record_on_empty_log() {
        let (_store, wal) = create_wal();
        assert!(matches!(
            wal.last_record(),
            Err(WalError::EmptyLog { .. })
        ));
        assert_eq!(wal.cached_length(), 0);
    }

    #[test]
    fn last_record_updates_cached_length() {
        let (store, wal) = create_wal();
        wal.append(b"a").unwrap();
        wal.append(b"b").unwrap();

        let fresh = ObjectWal::open(store, WalConfig::new("bucket", "wal")).unwrap();
        assert_eq!(fresh.cached_length(), 0);
        let last = fresh.last_record().unwrap();
        assert_eq!(last, Record::new(2, b"b".to_vec()));
        assert_eq!(fresh.cached_length(), 2);
    }

    #[test]
    fn recover_ignores_stray_keys() {
        let (store, wal) = create_wal();
        wal.append(b"a").unwrap();
        store.put("bucket", "wal/zz-manifest", b"{}").unwrap();
        assert_eq!(wal.recover().unwrap(), 1);
    }

    #[test]
    fn foreign_numeric_key_does_not_move_length() {
        let (store, wal) = create_wal();
        wal.append(b"a").unwrap();
        store.put("bucket", "wal/9", b"foreign").unwrap();

        assert_eq!(wal.recover().unwrap(), 1);
        assert_eq!(wal.last_record().unwrap(), Record::new(1, b"a".to_vec()));
        wal.truncate(0).unwrap();
        assert_eq!(store.keys("bucket"), vec!["wal/9"]);
    }

    #[test]
    fn recover_does_not_see_sibling_prefixes() {
        let (store, wal) = create_wal();
        wal.append(b"a").unwrap();
        store
            .put("bucket", "wal2/00000000000000000099", b"x")
            .unwrap();
        assert_eq!(wal.recover().unwrap(), 1);
    }

    #[test]
    fn truncate_keeps_prefix_of_log() {
        let (_store, wal) = create_wal();
        for i in 1..=5 {
            wal.append(format!("r{i}").as_bytes()).unwrap();
        }
        wal.truncate(3).unwrap();
        assert_eq!(wal.cached_length(), 3);
        assert!(wal.read(3).is_ok());
        assert!(wal.read(4).unwrap_err().is_absence());
        assert_eq!(wal.append(b"next").unwrap(), 4);
    }

    #[test]
    fn truncate_zero_clears_log() {
        let (store, wal) = create_wal();
        wal.append(b"a").unwrap();
        wal.append(b"b").unwrap();
        wal.truncate(0).unwrap();
        assert!(store.is_empty("bucket"));
        assert_eq!(wal.recover().unwrap(), 0);
    }

    #[test]
    fn truncate_respects_store_batch_ceiling() {
        let store = Arc::new(InMemoryObjectStore::new().with_max_delete_batch(2));
        let wal = ObjectWal::open(store.clone(), WalConfig::new("bucket", "wal")).unwrap();
        for _ in 0..7 {
            wal.append(b"x").unwrap();
        }
        wal.truncate(1).unwrap();
        assert_eq!(store.len("bucket"), 1);
    }

    #[test]
    fn append_at_max_offset_is_exhausted() {
        let (store, wal) = create_wal();
        store
            .put("bucket", &wal.key_for(u64::MAX), &encode_frame(u64::MAX, b""))
            .unwrap();
        assert_eq!(wal.recover().unwrap(), u64::MAX);
        assert!(matches!(wal.append(b"x"), Err(WalError::OffsetExhausted)));
    }

    #[test]
    fn debug_shows_prefix() {
        let (_store, wal) = create_wal();
        let debug = format!("{wal:?}");
        assert!(debug.contains("prefix: \"wal\""));
    }
}
