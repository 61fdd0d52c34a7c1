//! # s3wal Core
//!
//! A write-ahead log stored as one object per record in an object store.
//!
//! This crate provides:
//! - Offset to key mapping that keeps lexicographic and numeric order equal
//! - Record framing with an embedded offset and SHA-256 checksum
//! - Length recovery from a paginated listing
//! - The [`ObjectWal`] engine: append, read, last record, recover, truncate
//!
//! ## Object Layout
//!
//! ```text
//! key:  <prefix>/<offset as 20-digit zero-padded decimal>
//! body: | offset (8, BE) | data (N) | sha256(offset ‖ data) (32) |
//! ```
//!
//! ## Example
//!
//! ```rust
//! use s3wal_core::{ObjectWal, WalConfig};
//! use s3wal_store::InMemoryObjectStore;
//! use std::sync::Arc;
//!
//! let wal = ObjectWal::open(
//!     Arc::new(InMemoryObjectStore::new()),
//!     WalConfig::new("bucket", "orders"),
//! )
//! .unwrap();
//! wal.recover().unwrap();
//!
//! let offset = wal.append(b"Record #1").unwrap();
//! assert_eq!(wal.read(offset).unwrap().data, b"Record #1");
//! ```
//!
//! ## Invariants
//!
//! - Offsets start at 1 and are contiguous under a single writer
//! - Records are never modified in place; truncate deletes whole objects
//! - Every read checks the embedded offset and the checksum
//! - Integrity, absence and transport failures are distinct error kinds

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod key;
pub mod listing;
pub mod record;
mod wal;

pub use config::{WalConfig, DEFAULT_DELETE_BATCH_LIMIT};
pub use error::{WalError, WalResult};
pub use record::{FrameError, Record};
pub use wal::ObjectWal;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
