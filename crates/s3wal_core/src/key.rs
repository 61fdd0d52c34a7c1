//! Offset to object key mapping.
//!
//! Keys have the form `<prefix>/<offset>` with the offset written as a
//! 20-digit zero-padded decimal. Twenty digits hold every `u64`, so the
//! store's lexicographic key order equals numeric offset order.
//!
//! Decoding has two entry points with different failure semantics:
//! [`decode_key`] is strict and reports [`WalError::MalformedKey`], while
//! [`scan_offset`] is used during listings and skips every key that is not
//! the canonical key of a record in the log being scanned. Foreign objects,
//! unpadded offsets and keys of nested logs (`<prefix>/<sub>/<offset>`)
//! all share the listing prefix and are skipped.

use crate::error::{WalError, WalResult};

/// Width of the zero-padded offset component.
pub const OFFSET_WIDTH: usize = 20;

/// Key separator.
pub const SEPARATOR: char = '/';

/// Trims leading and trailing separators from a prefix.
#[must_use]
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches(SEPARATOR)
}

/// Returns the listing prefix (`<prefix>/`) for a log namespace.
#[must_use]
pub fn list_prefix(prefix: &str) -> String {
    format!("{prefix}{SEPARATOR}")
}

/// Builds the object key for an offset.
#[must_use]
pub fn encode_key(prefix: &str, offset: u64) -> String {
    format!("{prefix}{SEPARATOR}{offset:0width$}", width = OFFSET_WIDTH)
}

/// Extracts the offset from an object key.
///
/// Takes the component after the last separator and parses it as an
/// unsigned decimal. Only ASCII digits are accepted.
///
/// # Errors
///
/// Returns [`WalError::MalformedKey`] if the key has no separator, ends
/// with one, or its final component is not a decimal `u64`.
pub fn decode_key(key: &str) -> WalResult<u64> {
    let Some(idx) = key.rfind(SEPARATOR) else {
        return Err(WalError::malformed_key(key, "no separator"));
    };
    let digits = &key[idx + 1..];
    if digits.is_empty() {
        return Err(WalError::malformed_key(key, "empty offset component"));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalError::malformed_key(key, "offset is not a decimal number"));
    }
    digits
        .parse::<u64>()
        .map_err(|e| WalError::malformed_key(key, e.to_string()))
}

/// Lenient decode used while scanning the listing of `prefix`.
///
/// Returns the offset only if `key` is exactly `encode_key(prefix, offset)`.
/// Anything else yields `None`.
#[must_use]
pub fn scan_offset(prefix: &str, key: &str) -> Option<u64> {
    let canonical = decode_key(key).and_then(|offset| {
        if encode_key(prefix, offset) == key {
            Ok(offset)
        } else {
            Err(WalError::malformed_key(key, "not a record key of this log"))
        }
    });
    match canonical {
        Ok(offset) => Some(offset),
        Err(e) => {
            tracing::debug!(key = %key, error = %e, "skipping key during scan");
            None
        }
    }
}
