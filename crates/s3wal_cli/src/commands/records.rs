//! Append, read and last-record commands.

use super::{print_json, CliResult, OutputFormat, RecordView, Settings};
use s3wal_core::Record;

/// Runs the append command.
pub fn append(settings: &Settings, data: &[u8]) -> CliResult<()> {
    let wal = settings.open_wal()?;
    wal.recover()?;
    let offset = wal.append(data)?;

    match settings.format {
        OutputFormat::Text => println!(
            "Appended record at offset: {offset}, data: {}",
            String::from_utf8_lossy(data)
        ),
        OutputFormat::Json => print_json(&RecordView::from(&Record::new(offset, data)))?,
    }
    Ok(())
}

/// Runs the read command.
pub fn read(settings: &Settings, offset: u64) -> CliResult<()> {
    let wal = settings.open_wal()?;
    let record = wal.read(offset)?;
    print_record(settings.format, "Offset", &record)
}

/// Runs the last command.
///
/// `last_record` lists the prefix and refreshes the cached length itself.
pub fn last(settings: &Settings) -> CliResult<()> {
    let wal = settings.open_wal()?;
    let record = wal.last_record()?;
    print_record(settings.format, "Last record: offset", &record)
}

fn print_record(format: OutputFormat, label: &str, record: &Record) -> CliResult<()> {
    let view = RecordView::from(record);
    match format {
        OutputFormat::Text => println!("{label}={}, data={}", view.offset, view.data),
        OutputFormat::Json => print_json(&view)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::commands::CliError;
    use s3wal_core::WalError;
    use tempfile::TempDir;

    #[test]
    fn append_persists_across_invocations() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);

        append(&settings, b"first").unwrap();
        append(&settings, b"second").unwrap();

        let wal = settings.open_wal().unwrap();
        assert_eq!(wal.recover().unwrap(), 2);
        assert_eq!(wal.read(2).unwrap().data, b"second");
    }

    #[test]
    fn read_missing_offset_fails() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);
        assert!(matches!(
            read(&settings, 1),
            Err(CliError::Wal(WalError::NotFound { .. }))
        ));
    }

    #[test]
    fn last_shows_highest_record_of_fresh_log() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);
        append(&settings, b"first").unwrap();
        append(&settings, b"second").unwrap();

        assert!(last(&settings).is_ok());

        let wal = settings.open_wal().unwrap();
        assert_eq!(wal.cached_length(), 0);
        assert_eq!(wal.last_record().unwrap().data, b"second");
        assert_eq!(wal.cached_length(), 2);
    }

    #[test]
    fn last_on_empty_log_fails() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);
        assert!(matches!(
            last(&settings),
            Err(CliError::Wal(WalError::EmptyLog { .. }))
        ));
    }
}
