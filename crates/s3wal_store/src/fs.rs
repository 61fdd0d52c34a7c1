//! Filesystem object store for persistent storage.

use crate::error::{StoreError, StoreResult};
use crate::store::{
    paginate, DeleteFailure, ListPage, ObjectStore, DEFAULT_MAX_DELETE_BATCH, DEFAULT_PAGE_SIZE,
};
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A filesystem-backed object store.
///
/// Each object is one file at `<root>/<bucket>/<key>`, where `/` in the
/// key maps to a directory boundary. Objects survive process restarts.
///
/// # Durability
///
/// - `put` writes a hidden staging file, syncs it, then renames it over
///   the target, so readers see either the old or the new object
/// - `delete_batch` removes files one by one and reports per-key failures
///
/// # Key Rules
///
/// Keys must split on `/` into non-empty components that are not `.` or
/// `..` and do not start with `.` (that namespace holds staging files).
///
/// # Example
///
/// ```no_run
/// use s3wal_store::{FsObjectStore, ObjectStore};
/// use std::path::Path;
///
/// let store = FsObjectStore::open(Path::new("/var/lib/s3wal")).unwrap();
/// store.put("bucket", "wal/00000000000000000001", b"persistent data").unwrap();
/// ```
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    page_size: usize,
    max_delete_batch: usize,
    // Serializes rename/remove against directory walks.
    tree: RwLock<()>,
}

impl FsObjectStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            page_size: DEFAULT_PAGE_SIZE,
            max_delete_batch: DEFAULT_MAX_DELETE_BATCH,
            tree: RwLock::new(()),
        })
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

    fn bucket_dir(&self, bucket: &str) -> StoreResult<PathBuf> {
        validate_component(bucket, bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        let mut path = self.bucket_dir(bucket)?;
        if key.is_empty() {
            return Err(StoreError::invalid_key(key, "key is empty"));
        }
        for component in key.split('/') {
            validate_component(key, component)?;
            path.push(component);
        }
        Ok(path)
    }
}

fn validate_component(key: &str, component: &str) -> StoreResult<()> {
    if component.is_empty() {
        return Err(StoreError::invalid_key(key, "empty path component"));
    }
    if component.starts_with('.') {
        return Err(StoreError::invalid_key(
            key,
            format!("component {component:?} starts with '.'"),
        ));
    }
    if component.contains('\\') || component.contains('\0') {
        return Err(StoreError::invalid_key(
            key,
            format!("component {component:?} contains a reserved character"),
        ));
    }
    Ok(())
}

/// Recursively collects object keys below `dir`, skipping staging files.
fn walk(dir: &Path, key_prefix: &str, out: &mut Vec<String>) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let key = if key_prefix.is_empty() {
            name
        } else {
            format!("{key_prefix}/{name}")
        };
        if entry.file_type()?.is_dir() {
            walk(&entry.path(), &key, out)?;
        } else {
            out.push(key);
        }
    }
    Ok(())
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> StoreResult<()> {
        let path = self.object_path(bucket, key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::invalid_key(key, "key has no parent directory"))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::invalid_key(key, "key has no file name"))?;

        let _guard = self.tree.read();
        fs::create_dir_all(parent)?;

        let staging = parent.join(format!(".{file_name}.{}", uuid::Uuid::new_v4()));
        let result = (|| -> io::Result<()> {
            let mut file = File::create(&staging)?;
            file.write_all(body)?;
            file.sync_all()?;
            fs::rename(&staging, &path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path) {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::not_found(bucket, key))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        // Every match lives below the directory named by the prefix up to
        // its last separator.
        let key_dir = prefix.rsplit_once('/').map_or("", |(dir, _)| dir);
        let mut start = self.bucket_dir(bucket)?;
        if !key_dir.is_empty() {
            for component in key_dir.split('/') {
                if validate_component(key_dir, component).is_err() {
                    return Ok(ListPage::default());
                }
                start.push(component);
            }
        }

        let mut keys = Vec::new();
        {
            let _guard = self.tree.write();
            if start.is_dir() {
                walk(&start, key_dir, &mut keys)?;
            }
        }
        keys.retain(|key| key.starts_with(prefix));
        keys.sort_unstable();

        Ok(paginate(keys, continuation, self.page_size))
    }

    fn delete_batch(&self, bucket: &str, keys: &[String]) -> StoreResult<Vec<DeleteFailure>> {
        if keys.len() > self.max_delete_batch {
            return Err(StoreError::BatchTooLarge {
                len: keys.len(),
                limit: self.max_delete_batch,
            });
        }
        self.bucket_dir(bucket)?;

        let _guard = self.tree.read();
        let mut failures = Vec::new();
        for key in keys {
            let path = match self.object_path(bucket, key) {
                Ok(path) => path,
                Err(e) => {
                    failures.push(DeleteFailure::new(key.as_str(), e.to_string()));
                    continue;
                }
            };
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => failures.push(DeleteFailure::new(key.as_str(), e.to_string())),
            }
        }
        Ok(failures)
    }

    fn max_delete_batch(&self) -> usize {
        self.max_delete_batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, FsObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn fs_put_then_get() {
        let (_dir, store) = open_store();
        store.put("b", "wal/001", b"hello").unwrap();
        assert_eq!(store.get("b", "wal/001").unwrap(), b"hello");
    }

    #[test]
    fn fs_put_overwrites() {
        let (_dir, store) = open_store();
        store.put("b", "wal/001", b"first").unwrap();
        store.put("b", "wal/001", b"second").unwrap();
        assert_eq!(store.get("b", "wal/001").unwrap(), b"second");
    }

    #[test]
    fn fs_get_missing_is_not_found() {
        let (_dir, store) = open_store();
        assert!(store.get("b", "wal/404").unwrap_err().is_not_found());
    }

    #[test]
    fn fs_objects_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FsObjectStore::open(dir.path()).unwrap();
            store.put("b", "wal/001", b"persisted").unwrap();
        }
        let store = FsObjectStore::open(dir.path()).unwrap();
        assert_eq!(store.get("b", "wal/001").unwrap(), b"persisted");
    }

    #[test]
    fn fs_rejects_traversal_keys() {
        let (_dir, store) = open_store();
        for key in ["", "../x", "a//b", "a/./b", "/lead", "a/.hidden"] {
            let result = store.put("b", key, b"x");
            assert!(
                matches!(result, Err(StoreError::InvalidKey { .. })),
                "key {key:?} should be rejected"
            );
        }
        assert!(store.put("..", "k", b"x").is_err());
    }

    #[test]
    fn fs_list_is_sorted_and_paginated() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap().with_page_size(2);
        for key in ["wal/003", "wal/001", "wal/002", "other/001"] {
            store.put("b", key, b"x").unwrap();
        }

        let first = store.list_page("b", "wal/", None).unwrap();
        assert_eq!(first.keys, vec!["wal/001", "wal/002"]);
        let second = store.list_page("b", "wal/", first.next.as_deref()).unwrap();
        assert_eq!(second.keys, vec!["wal/003"]);
        assert!(second.is_last());
    }

    #[test]
    fn fs_list_walks_only_prefix_directory() {
        let (_dir, store) = open_store();
        for key in ["logs/a/001", "logs/a/002", "logs/a/deep/003", "logs/ab/001", "other/001"] {
            store.put("b", key, b"x").unwrap();
        }

        let nested = store.list_page("b", "logs/a/", None).unwrap();
        assert_eq!(nested.keys, vec!["logs/a/001", "logs/a/002", "logs/a/deep/003"]);

        let partial = store.list_page("b", "logs/a", None).unwrap();
        assert_eq!(
            partial.keys,
            vec!["logs/a/001", "logs/a/002", "logs/a/deep/003", "logs/ab/001"]
        );

        let component = store.list_page("b", "logs/a/00", None).unwrap();
        assert_eq!(component.keys, vec!["logs/a/001", "logs/a/002"]);

        let everything = store.list_page("b", "", None).unwrap();
        assert_eq!(everything.keys.len(), 5);
    }

    #[test]
    fn fs_list_prefix_that_no_key_can_match() {
        let (_dir, store) = open_store();
        store.put("b", "wal/001", b"x").unwrap();

        for prefix in ["wal/001/", "../wal/", "wal//", "missing/dir/"] {
            let page = store.list_page("b", prefix, None).unwrap();
            assert!(page.keys.is_empty(), "prefix {prefix:?} should match nothing");
            assert!(page.is_last());
        }
    }

    #[test]
    fn fs_list_skips_staging_files() {
        let (dir, store) = open_store();
        store.put("b", "wal/001", b"x").unwrap();
        fs::write(dir.path().join("b/wal/.001.partial"), b"junk").unwrap();

        let page = store.list_page("b", "wal/", None).unwrap();
        assert_eq!(page.keys, vec!["wal/001"]);
    }

    #[test]
    fn fs_list_missing_bucket_is_empty() {
        let (_dir, store) = open_store();
        let page = store.list_page("empty", "wal/", None).unwrap();
        assert!(page.keys.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn fs_delete_batch_removes_and_ignores_missing() {
        let (_dir, store) = open_store();
        store.put("b", "wal/001", b"x").unwrap();
        store.put("b", "wal/002", b"x").unwrap();

        let failures = store
            .delete_batch("b", &["wal/001".to_string(), "wal/404".to_string()])
            .unwrap();
        assert!(failures.is_empty());

        let page = store.list_page("b", "wal/", None).unwrap();
        assert_eq!(page.keys, vec!["wal/002"]);
    }

    #[test]
    fn fs_delete_batch_reports_invalid_keys_per_key() {
        let (_dir, store) = open_store();
        let failures = store.delete_batch("b", &["../escape".to_string()]).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "../escape");
    }

    #[test]
    fn fs_delete_batch_over_limit_fails() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::open(dir.path())
            .unwrap()
            .with_max_delete_batch(1);
        let keys = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            store.delete_batch("b", &keys),
            Err(StoreError::BatchTooLarge { len: 2, limit: 1 })
        ));
    }
}
