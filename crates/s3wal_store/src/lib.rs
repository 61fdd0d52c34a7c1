//! # s3wal Store
//!
//! Object store trait and implementations for s3wal.
//!
//! This crate provides the lowest-level storage abstraction for the log.
//! Object stores are **opaque key/value blob stores** - they do not
//! interpret the objects they hold.
//!
//! ## Design Principles
//!
//! - Stores offer put, get, paginated list-by-prefix and batched delete
//! - No transactions and no conditional writes
//! - Listing is lexicographic by key and may be paginated
//! - No knowledge of record framing, offsets or key layout
//! - Must be `Send + Sync` so one store can be shared across threads
//!
//! ## Available Stores
//!
//! - [`InMemoryObjectStore`] - For testing and ephemeral logs
//! - [`FsObjectStore`] - One file per object under a root directory
//!
//! ## Example
//!
//! ```rust
//! use s3wal_store::{InMemoryObjectStore, ObjectStore};
//!
//! let store = InMemoryObjectStore::new();
//! store.put("bucket", "wal/0001", b"hello world").unwrap();
//! let body = store.get("bucket", "wal/0001").unwrap();
//! assert_eq!(&body, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod fs;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use store::{DeleteFailure, ListPage, ObjectStore, DEFAULT_MAX_DELETE_BATCH, DEFAULT_PAGE_SIZE};
