//! Recover command implementation.

use super::{print_json, CliResult, OutputFormat, Settings};
use serde_json::json;

/// Runs the recover command.
pub fn run(settings: &Settings) -> CliResult<()> {
    let wal = settings.open_wal()?;
    let last_offset = wal.recover()?;

    match settings.format {
        OutputFormat::Text => println!("Last offset: {last_offset}"),
        OutputFormat::Json => print_json(&json!({
            "bucket": wal.bucket(),
            "prefix": wal.prefix(),
            "last_offset": last_offset,
        }))?,
    }
    Ok(())
}
