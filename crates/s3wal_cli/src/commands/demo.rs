//! Demo command: a short tour of every log operation.

use super::{CliResult, Settings};

/// Number of records the demo appends.
const DEMO_RECORDS: u64 = 5;

/// Offset the demo reads back.
const DEMO_READ_OFFSET: u64 = 3;

/// Offset the demo truncates after.
const DEMO_TRUNCATE_AFTER: u64 = 2;

/// Runs the demo command.
pub fn run(settings: &Settings) -> CliResult<()> {
    let wal = settings.open_wal()?;

    let last_offset = wal.recover()?;
    println!("Last offset: {last_offset}");

    for i in 1..=DEMO_RECORDS {
        let data = format!("Record #{i}");
        let offset = wal.append(data.as_bytes())?;
        println!("Appended record at offset: {offset}, data: {data}");
    }

    // Offsets are relative to whatever the log held before the demo.
    let read_offset = last_offset + DEMO_READ_OFFSET;
    let record = wal.read(read_offset)?;
    println!(
        "Read record at offset {}: {}",
        record.offset,
        String::from_utf8_lossy(&record.data)
    );

    let last = wal.last_record()?;
    println!(
        "Last record: offset={}, data={}",
        last.offset,
        String::from_utf8_lossy(&last.data)
    );

    let truncate_after = last_offset + DEMO_TRUNCATE_AFTER;
    println!("Truncating WAL after offset {truncate_after}...");
    wal.truncate(truncate_after)?;

    let last_offset = wal.recover()?;
    println!("Last offset after truncate: {last_offset}");
    Ok(())
}
