//! Paginated prefix listing.
//!
//! Object stores return listings in bounded pages. [`KeyPages`] turns the
//! page-token protocol into a lazy, finite iterator. Every caller that
//! derives "last" or "max" from a listing must drain it completely.

use crate::key::scan_offset;
use s3wal_store::{ObjectStore, StoreResult};

/// A lazy iterator over the pages of a prefix listing.
///
/// Yields one `Vec<String>` per page. Iteration ends after the page whose
/// continuation token is `None`, or after the first error.
pub struct KeyPages<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    prefix: &'a str,
    token: Option<String>,
    finished: bool,
}

impl<'a> KeyPages<'a> {
    /// Starts a listing of `prefix` from the first page.
    pub fn new(store: &'a dyn ObjectStore, bucket: &'a str, prefix: &'a str) -> Self {
        Self {
            store,
            bucket,
            prefix,
            token: None,
            finished: false,
        }
    }

    /// Resumes a listing from a continuation token.
    pub fn resume(
        store: &'a dyn ObjectStore,
        bucket: &'a str,
        prefix: &'a str,
        token: String,
    ) -> Self {
        Self {
            token: Some(token),
            ..Self::new(store, bucket, prefix)
        }
    }

    /// Token that would fetch the next page, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl Iterator for KeyPages<'_> {
    type Item = StoreResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self
            .store
            .list_page(self.bucket, self.prefix, self.token.as_deref())
        {
            Ok(page) => {
                self.finished = page.next.is_none();
                self.token = page.next;
                Some(Ok(page.keys))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Drains a listing and returns every record key of the log at `prefix`,
/// with its offset, in list order.
///
/// Keys that are not canonical record keys of that log are skipped.
///
/// # Errors
///
/// Returns the first store error; no partial result is produced.
pub fn collect_offsets(pages: KeyPages<'_>, prefix: &str) -> StoreResult<Vec<(String, u64)>> {
    let mut out = Vec::new();
    for page in pages {
        for key in page? {
            if let Some(offset) = scan_offset(prefix, &key) {
                out.push((key, offset));
            }
        }
    }
    Ok(out)
}
