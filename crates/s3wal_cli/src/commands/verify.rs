//! Verify command implementation.

use super::{print_json, CliError, CliResult, OutputFormat, Settings};
use s3wal_core::{ObjectWal, WalError};
use serde::Serialize;
use tracing::info;

/// Verification result.
#[derive(Debug, Default, Serialize)]
pub struct VerifyResult {
    /// Highest offset found by recover.
    pub last_offset: u64,
    /// Number of records checked.
    pub records_checked: u64,
    /// Number of valid records.
    pub valid_records: u64,
    /// Offsets with no object.
    pub missing: Vec<u64>,
    /// Offsets whose object failed validation, with the reason.
    pub corrupt: Vec<CorruptRecord>,
}

/// A record that failed validation.
#[derive(Debug, Serialize)]
pub struct CorruptRecord {
    /// Offset of the record.
    pub offset: u64,
    /// Validation error.
    pub error: String,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.corrupt.is_empty()
    }
}

/// Runs the verify command.
pub fn run(settings: &Settings) -> CliResult<()> {
    let wal = settings.open_wal()?;
    let result = verify_wal(&wal)?;

    match settings.format {
        OutputFormat::Text => print_result(&wal, &result),
        OutputFormat::Json => print_json(&result)?,
    }

    if result.is_ok() {
        Ok(())
    } else {
        Err(CliError::VerificationFailed {
            missing: result.missing.len(),
            corrupt: result.corrupt.len(),
        })
    }
}

/// Reads every offset up to the recovered length.
///
/// Missing and corrupt records are collected; a store failure aborts.
pub fn verify_wal(wal: &ObjectWal) -> CliResult<VerifyResult> {
    let mut result = VerifyResult {
        last_offset: wal.recover()?,
        ..VerifyResult::default()
    };

    for offset in 1..=result.last_offset {
        result.records_checked += 1;
        match wal.read(offset) {
            Ok(_) => result.valid_records += 1,
            Err(WalError::NotFound { .. }) => result.missing.push(offset),
            Err(e) if e.is_integrity_failure() => result.corrupt.push(CorruptRecord {
                offset,
                error: e.to_string(),
            }),
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        checked = result.records_checked,
        missing = result.missing.len(),
        corrupt = result.corrupt.len(),
        "verification finished"
    );
    Ok(result)
}

fn print_result(wal: &ObjectWal, result: &VerifyResult) {
    println!("Verifying {}/{}", wal.bucket(), wal.prefix());
    println!("  Last offset:     {}", result.last_offset);
    println!("  Records checked: {}", result.records_checked);
    println!("  Valid records:   {}", result.valid_records);
    for offset in &result.missing {
        println!("  missing: offset {offset}");
    }
    for corrupt in &result.corrupt {
        println!("  corrupt: offset {} ({})", corrupt.offset, corrupt.error);
    }
    println!();
    if result.is_ok() {
        println!("✓ Log verification passed");
    } else {
        println!("✗ Log verification failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use s3wal_store::{FsObjectStore, ObjectStore};
    use tempfile::TempDir;

    #[test]
    fn verify_clean_log() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);
        let wal = settings.open_wal().unwrap();
        for i in 1..=3 {
            wal.append(format!("r{i}").as_bytes()).unwrap();
        }

        let result = verify_wal(&wal).unwrap();
        assert!(result.is_ok());
        assert_eq!(result.valid_records, 3);
        assert!(run(&settings).is_ok());
    }

    #[test]
    fn verify_ignores_foreign_keys() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);
        let wal = settings.open_wal().unwrap();
        wal.append(b"r1").unwrap();

        let store = FsObjectStore::open(dir.path()).unwrap();
        store.put("bucket", "log/999999999", b"foreign").unwrap();

        let result = verify_wal(&wal).unwrap();
        assert_eq!(result.last_offset, 1);
        assert_eq!(result.records_checked, 1);
        assert!(result.is_ok());
    }

    #[test]
    fn verify_reports_gaps_and_corruption() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);
        let wal = settings.open_wal().unwrap();
        for i in 1..=4 {
            wal.append(format!("r{i}").as_bytes()).unwrap();
        }

        let store = FsObjectStore::open(dir.path()).unwrap();
        store.delete_batch("bucket", &[wal.key_for(2)]).unwrap();
        store.put("bucket", &wal.key_for(3), b"not a frame").unwrap();

        let result = verify_wal(&wal).unwrap();
        assert_eq!(result.missing, vec![2]);
        assert_eq!(result.corrupt.len(), 1);
        assert_eq!(result.corrupt[0].offset, 3);
        assert_eq!(result.valid_records, 2);

        assert!(matches!(
            run(&settings),
            Err(CliError::VerificationFailed {
                missing: 1,
                corrupt: 1
            })
        ));
    }
}
