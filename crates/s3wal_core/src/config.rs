//! Log configuration.

use crate::error::{WalError, WalResult};
use crate::key::normalize_prefix;

/// Default ceiling on keys per delete request (the S3 `DeleteObjects` limit).
pub const DEFAULT_DELETE_BATCH_LIMIT: usize = 1000;

/// Configuration for opening a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalConfig {
    /// Bucket holding the log's objects.
    pub bucket: String,

    /// Key namespace; stored without leading or trailing separators.
    pub prefix: String,

    /// Maximum keys per delete request issued by truncate.
    ///
    /// The effective size is also capped by the store's own ceiling.
    pub delete_batch_limit: usize,
}

impl WalConfig {
    /// Creates a configuration with default limits.
    ///
    /// The prefix is normalized by trimming `/` from both ends.
    pub fn new(bucket: impl Into<String>, prefix: &str) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: normalize_prefix(prefix).to_string(),
            delete_batch_limit: DEFAULT_DELETE_BATCH_LIMIT,
        }
    }

    /// Sets the delete batch ceiling.
    #[must_use]
    pub const fn delete_batch_limit(mut self, limit: usize) -> Self {
        self.delete_batch_limit = limit;
        self
    }

    /// Checks that the configuration can address objects.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::InvalidConfig`] for an empty bucket, an empty
    /// normalized prefix, or a zero batch limit.
    pub fn validate(&self) -> WalResult<()> {
        if self.bucket.is_empty() {
            return Err(WalError::invalid_config("bucket must not be empty"));
        }
        if normalize_prefix(&self.prefix).is_empty() {
            return Err(WalError::invalid_config("prefix must not be empty"));
        }
        if self.delete_batch_limit == 0 {
            return Err(WalError::invalid_config(
                "delete batch limit must be at least 1",
            ));
        }
        Ok(())
    }
}
