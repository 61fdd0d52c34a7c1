//! Record framing and integrity checks.
//!
//! ## Frame Format
//!
//! ```text
//! | offset (8, big-endian) | data (N) | sha256(offset ‖ data) (32) |
//! ```
//!
//! The embedded offset catches key/object mix-ups, the checksum catches
//! partial writes and storage corruption. Both are checked on every read.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Size of the embedded offset.
pub const OFFSET_SIZE: usize = 8;

/// Size of the trailing SHA-256 checksum.
pub const CHECKSUM_SIZE: usize = 32;

/// Size of a frame carrying empty data.
pub const MIN_FRAME_SIZE: usize = OFFSET_SIZE + CHECKSUM_SIZE;

/// A log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based position in the log.
    pub offset: u64,
    /// Opaque payload.
    pub data: Vec<u8>,
}

/// Why a frame failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame shorter than [`MIN_FRAME_SIZE`].
    #[error("frame of {len} bytes is too short")]
    Truncated {
        /// Actual frame length.
        len: usize,
    },

    /// Embedded offset differs from the expected one.
    #[error("expected offset {expected}, found {actual}")]
    OffsetMismatch {
        /// Offset the caller asked for.
        expected: u64,
        /// Offset found in the frame.
        actual: u64,
    },

    /// Trailing checksum does not match.
    #[error("checksum mismatch")]
    ChecksumMismatch,
}

impl Record {
    /// Creates a new record.
    pub fn new(offset: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            data: data.into(),
        }
    }

    /// Parses and validates a stored frame.
    ///
    /// Checks run in order: length, embedded offset against
    /// `expected_offset`, then the checksum.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] describing the first failed check.
    pub fn decode(expected_offset: u64, frame: &[u8]) -> Result<Self, FrameError> {
        if frame.len() < MIN_FRAME_SIZE {
            return Err(FrameError::Truncated { len: frame.len() });
        }

        let mut offset_bytes = [0u8; OFFSET_SIZE];
        offset_bytes.copy_from_slice(&frame[..OFFSET_SIZE]);
        let actual = u64::from_be_bytes(offset_bytes);
        if actual != expected_offset {
            return Err(FrameError::OffsetMismatch {
                expected: expected_offset,
                actual,
            });
        }

        let body_end = frame.len() - CHECKSUM_SIZE;
        let data = &frame[OFFSET_SIZE..body_end];
        if compute_checksum(actual, data).as_slice() != &frame[body_end..] {
            return Err(FrameError::ChecksumMismatch);
        }

        Ok(Self {
            offset: actual,
            data: data.to_vec(),
        })
    }
}

/// Builds the stored frame for `data` at `offset`.
#[must_use]
pub fn encode_frame(offset: u64, data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(MIN_FRAME_SIZE + data.len());
    frame.extend_from_slice(&offset.to_be_bytes());
    frame.extend_from_slice(data);
    frame.extend_from_slice(&compute_checksum(offset, data));
    frame
}

/// Computes SHA-256 over `offset ‖ data`.
#[must_use]
pub fn compute_checksum(offset: u64, data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(offset.to_be_bytes());
    hasher.update(data);
    hasher.finalize().into()
}
