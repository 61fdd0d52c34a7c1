//! # s3wal Testkit
//!
//! Test utilities for s3wal.
//!
//! This crate provides:
//! - [`FaultyStore`], an object store wrapper that injects failures
//! - Fixtures for logs over in-memory and filesystem stores
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use s3wal_testkit::prelude::*;
//!
//! #[test]
//! fn survives_outage() {
//!     let fixture = FaultyFixture::new();
//!     fixture.faults.fail_puts(1);
//!     assert!(fixture.wal.append(b"x").is_err());
//!     assert_eq!(fixture.wal.append(b"x").unwrap(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
