//! Truncate command implementation.

use super::{print_json, CliResult, OutputFormat, Settings};
use serde_json::json;

/// Runs the truncate command.
pub fn run(settings: &Settings, after_offset: u64) -> CliResult<()> {
    let wal = settings.open_wal()?;
    wal.truncate(after_offset)?;

    match settings.format {
        OutputFormat::Text => println!("Truncated WAL after offset {after_offset}"),
        OutputFormat::Json => print_json(&json!({ "truncated_after": after_offset }))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use tempfile::TempDir;

    #[test]
    fn truncate_removes_tail() {
        let dir = TempDir::new().unwrap();
        let settings = testing::settings(&dir);
        let wal = settings.open_wal().unwrap();
        for i in 1..=5 {
            wal.append(format!("r{i}").as_bytes()).unwrap();
        }

        run(&settings, 2).unwrap();

        let reopened = settings.open_wal().unwrap();
        assert_eq!(reopened.recover().unwrap(), 2);
    }
}
