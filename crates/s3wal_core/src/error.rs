//! Error types for the log engine.

use s3wal_store::{DeleteFailure, StoreError};
use thiserror::Error;

/// Result type for log operations.
pub type WalResult<T> = Result<T, WalError>;

/// Errors that can occur in log operations.
///
/// Variants fall into four groups that callers must be able to tell apart:
/// integrity failures (`Truncated`, `OffsetMismatch`, `ChecksumMismatch`),
/// absence (`NotFound`, `EmptyLog`), transport failures (`Store*Failed`),
/// and the truncate-specific `PartialDeleteFailure`.
#[derive(Debug, Error)]
pub enum WalError {
    /// An object key does not end in a decimal offset.
    #[error("malformed key {key:?}: {reason}")]
    MalformedKey {
        /// The offending key.
        key: String,
        /// Why it could not be decoded.
        reason: String,
    },

    /// A stored object is too short to hold a framed record.
    #[error("truncated record at {key}: {len} bytes is shorter than the 40-byte minimum")]
    Truncated {
        /// Key of the object.
        key: String,
        /// Actual object length.
        len: usize,
    },

    /// The offset embedded in an object disagrees with its key.
    #[error("offset mismatch at {key}: expected {expected}, found {actual}")]
    OffsetMismatch {
        /// Key of the object.
        key: String,
        /// Offset implied by the key.
        expected: u64,
        /// Offset embedded in the object.
        actual: u64,
    },

    /// The trailing SHA-256 does not match the record contents.
    #[error("checksum mismatch for offset {offset} at {key}")]
    ChecksumMismatch {
        /// Key of the object.
        key: String,
        /// Offset of the record.
        offset: u64,
    },

    /// No record exists at the requested offset.
    #[error("no record at offset {offset} ({key})")]
    NotFound {
        /// Key that was looked up.
        key: String,
        /// Requested offset.
        offset: u64,
    },

    /// The log holds no records.
    #[error("log under prefix {prefix:?} is empty")]
    EmptyLog {
        /// Prefix that was listed.
        prefix: String,
    },

    /// Writing a record failed.
    #[error("failed to write offset {offset} to {key}: {source}")]
    StoreWriteFailed {
        /// Target key.
        key: String,
        /// Offset that was being appended.
        offset: u64,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Reading a record failed for a reason other than absence.
    #[error("failed to read {key}: {source}")]
    StoreReadFailed {
        /// Key that was read.
        key: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Listing the prefix failed.
    #[error("failed to list prefix {prefix:?}: {source}")]
    StoreListFailed {
        /// Prefix that was listed.
        prefix: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// A delete batch failed as a whole.
    #[error("failed to delete batch of {count} keys starting at {first_key}: {source}")]
    StoreDeleteFailed {
        /// First key of the failed batch.
        first_key: String,
        /// Number of keys in the batch.
        count: usize,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Some keys survived an otherwise successful truncate.
    ///
    /// The cached length is stale; run recover before continuing.
    #[error("{} keys could not be deleted: {}", .failures.len(), join_failures(.failures))]
    PartialDeleteFailure {
        /// Every key that was not deleted, with the store's reason.
        failures: Vec<DeleteFailure>,
    },

    /// The log already holds `u64::MAX` records.
    #[error("offset space exhausted")]
    OffsetExhausted,

    /// The log configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

fn join_failures(failures: &[DeleteFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl WalError {
    /// Creates a malformed key error.
    pub fn malformed_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for corrupted or mismatched record data.
    #[must_use]
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::OffsetMismatch { .. } | Self::ChecksumMismatch { .. }
        )
    }

    /// Returns true when the requested record or log simply does not exist.
    #[must_use]
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::EmptyLog { .. })
    }

    /// Returns true when the object store itself failed.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreWriteFailed { .. }
                | Self::StoreReadFailed { .. }
                | Self::StoreListFailed { .. }
                | Self::StoreDeleteFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_disjoint() {
        let errors = [
            WalError::Truncated {
                key: "k".into(),
                len: 3,
            },
            WalError::NotFound {
                key: "k".into(),
                offset: 1,
            },
            WalError::StoreListFailed {
                prefix: "p".into(),
                source: StoreError::unavailable("down"),
            },
        ];
        let flags: Vec<_> = errors
            .iter()
            .map(|e| {
                (
                    e.is_integrity_failure(),
                    e.is_absence(),
                    e.is_transport_failure(),
                )
            })
            .collect();
        assert_eq!(
            flags,
            vec![(true, false, false), (false, true, false), (false, false, true)]
        );
    }

    #[test]
    fn partial_delete_lists_every_key() {
        let err = WalError::PartialDeleteFailure {
            failures: vec![
                DeleteFailure::new("wal/4", "denied"),
                DeleteFailure::new("wal/5", "locked"),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("2 keys could not be deleted"));
        assert!(message.contains("wal/4: denied"));
        assert!(message.contains("wal/5: locked"));
    }

    #[test]
    fn messages_name_the_key() {
        let err = WalError::OffsetMismatch {
            key: "wal/00000000000000000003".into(),
            expected: 3,
            actual: 9,
        };
        let message = err.to_string();
        assert!(message.contains("wal/00000000000000000003"));
        assert!(message.contains("expected 3"));
    }
}
