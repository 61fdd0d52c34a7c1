//! Object store trait definition.

use crate::error::StoreResult;

/// Default number of keys returned per listing page (the S3 page size).
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default ceiling on keys per delete call (the S3 `DeleteObjects` limit).
pub const DEFAULT_MAX_DELETE_BATCH: usize = 1000;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in this page, in lexicographic order.
    pub keys: Vec<String>,
    /// Token for the following page, or `None` once the listing is exhausted.
    pub next: Option<String>,
}

impl ListPage {
    /// Returns true if no further pages follow this one.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// A key that a delete batch failed to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// The key that was not deleted.
    pub key: String,
    /// The reason reported by the store.
    pub reason: String,
}

impl DeleteFailure {
    /// Creates a new delete failure.
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for DeleteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

/// A durable key/value blob store.
///
/// Object stores are **opaque**. They provide whole-object put and get,
/// lexicographically ordered listing by prefix, and batched delete. The
/// log owns all interpretation of keys and object bodies.
///
/// # Invariants
///
/// - `put` creates or silently overwrites; there is no conditional write
/// - `get` returns exactly the bytes of the last successful `put`
/// - `list_page` returns keys in byte-wise lexicographic order and pages
///   chain through `ListPage::next` until it is `None`
/// - `delete_batch` treats absent keys as deleted
///
/// # Implementors
///
/// - [`super::InMemoryObjectStore`] - For testing
/// - [`super::FsObjectStore`] - For persistent storage on a local filesystem
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is rejected or the write fails.
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> StoreResult<()>;

    /// Fetches the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::NotFound`] if no object exists, or a
    /// transport error if the read fails.
    fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Lists one page of keys beginning with `prefix`.
    ///
    /// `continuation` is the `next` token of the previous page, or `None`
    /// for the first page. Keys are strictly after the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing request fails.
    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage>;

    /// Deletes a batch of keys.
    ///
    /// Per-key failures are reported in the returned vector; an `Err`
    /// means the call as a whole failed and nothing can be assumed about
    /// which keys were removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::BatchTooLarge`] if `keys` exceeds
    /// [`Self::max_delete_batch`], or a transport error.
    fn delete_batch(&self, bucket: &str, keys: &[String]) -> StoreResult<Vec<DeleteFailure>>;

    /// Maximum number of keys accepted by one `delete_batch` call.
    fn max_delete_batch(&self) -> usize {
        DEFAULT_MAX_DELETE_BATCH
    }
}

/// Picks the page of `sorted` keys that follows `continuation`.
///
/// Shared start-after pagination for stores that can produce a sorted key
/// list up front.
pub(crate) fn paginate(
    sorted: Vec<String>,
    continuation: Option<&str>,
    page_size: usize,
) -> ListPage {
    let start = match continuation {
        Some(token) => sorted.partition_point(|key| key.as_str() <= token),
        None => 0,
    };
    let end = start.saturating_add(page_size.max(1)).min(sorted.len());
    let keys = sorted[start..end].to_vec();
    let next = if end < sorted.len() {
        keys.last().cloned()
    } else {
        None
    };
    ListPage { keys, next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p/{i:03}")).collect()
    }

    #[test]
    fn paginate_single_page() {
        let page = paginate(keys(3), None, 10);
        assert_eq!(page.keys.len(), 3);
        assert!(page.is_last());
    }

    #[test]
    fn paginate_chains_tokens() {
        let all = keys(5);
        let first = paginate(all.clone(), None, 2);
        assert_eq!(first.keys, vec!["p/000", "p/001"]);
        assert_eq!(first.next.as_deref(), Some("p/001"));

        let second = paginate(all.clone(), first.next.as_deref(), 2);
        assert_eq!(second.keys, vec!["p/002", "p/003"]);

        let third = paginate(all, second.next.as_deref(), 2);
        assert_eq!(third.keys, vec!["p/004"]);
        assert!(third.is_last());
    }

    #[test]
    fn paginate_exact_multiple_ends_without_empty_page() {
        let all = keys(4);
        let first = paginate(all.clone(), None, 2);
        let second = paginate(all, first.next.as_deref(), 2);
        assert_eq!(second.keys.len(), 2);
        assert!(second.is_last());
    }

    #[test]
    fn paginate_empty() {
        let page = paginate(Vec::new(), None, 10);
        assert!(page.keys.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn delete_failure_display() {
        let failure = DeleteFailure::new("wal/1", "access denied");
        assert_eq!(failure.to_string(), "wal/1: access denied");
    }

    proptest! {
        #[test]
        fn paginate_chain_visits_every_key_once(count in 0usize..60, page_size in 0usize..9) {
            let all = keys(count);
            let mut seen = Vec::new();
            let mut token: Option<String> = None;
            let mut pages = 0usize;
            loop {
                let page = paginate(all.clone(), token.as_deref(), page_size);
                pages += 1;
                prop_assert!(page.keys.len() <= page_size.max(1));
                seen.extend(page.keys);
                match page.next {
                    Some(next) => token = Some(next),
                    None => break,
                }
            }
            prop_assert_eq!(&seen, &all);
            prop_assert_eq!(pages, count.div_ceil(page_size.max(1)).max(1));
        }
    }
}
