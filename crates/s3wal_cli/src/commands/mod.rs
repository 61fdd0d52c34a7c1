//! CLI command implementations.

pub mod demo;
pub mod records;
pub mod recover;
pub mod truncate;
pub mod verify;

use s3wal_core::{ObjectWal, Record, WalConfig, WalError};
use s3wal_store::{FsObjectStore, StoreError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Log operation failed.
    #[error(transparent)]
    Wal(#[from] WalError),

    /// Opening the store failed.
    #[error("cannot open store: {0}")]
    Store(#[from] StoreError),

    /// JSON output failed.
    #[error("cannot encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// Verification found missing or corrupt records.
    #[error("verification failed: {missing} missing, {corrupt} corrupt")]
    VerificationFailed {
        /// Offsets with no object.
        missing: usize,
        /// Offsets whose object failed validation.
        corrupt: usize,
    },
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    Text,
    /// One JSON document.
    Json,
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory of the filesystem store.
    pub root: PathBuf,
    /// Bucket holding the log.
    pub bucket: String,
    /// Key prefix of the log.
    pub prefix: String,
    /// Maximum keys per delete request.
    pub delete_batch_limit: usize,
    /// Output format.
    pub format: OutputFormat,
}

impl Settings {
    /// Opens the log described by these settings.
    ///
    /// Does not recover; callers that depend on the length must call
    /// `recover` themselves.
    pub fn open_wal(&self) -> CliResult<ObjectWal> {
        let store = FsObjectStore::open(&self.root)?;
        let config = WalConfig::new(self.bucket.clone(), &self.prefix)
            .delete_batch_limit(self.delete_batch_limit);
        Ok(ObjectWal::open(Arc::new(store), config)?)
    }
}

/// Serializable view of a record.
#[derive(Debug, Serialize)]
pub struct RecordView {
    /// Record offset.
    pub offset: u64,
    /// Record contents, decoded as lossy UTF-8.
    pub data: String,
    /// Payload size in bytes.
    pub bytes: usize,
}

impl From<&Record> for RecordView {
    fn from(record: &Record) -> Self {
        Self {
            offset: record.offset,
            data: String::from_utf8_lossy(&record.data).into_owned(),
            bytes: record.data.len(),
        }
    }
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
