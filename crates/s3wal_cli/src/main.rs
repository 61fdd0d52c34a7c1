//! s3wal CLI
//!
//! Command-line tools for an object-store write-ahead log.
//!
//! # Commands
//!
//! - `append` - Append one record
//! - `read` - Read the record at an offset
//! - `last` - Show the record with the highest offset
//! - `truncate` - Delete every record after an offset
//! - `recover` - Rebuild and print the log length
//! - `verify` - Read every record and report missing or corrupt ones
//! - `demo` - Run a short append/read/truncate walkthrough

mod commands;

use clap::{Parser, Subcommand};
use commands::{OutputFormat, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Write-ahead log stored as one object per record.
#[derive(Parser)]
#[command(name = "s3wal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory of the object store
    #[arg(global = true, long, env = "S3WAL_ROOT", default_value = ".s3wal")]
    root: PathBuf,

    /// Bucket holding the log
    #[arg(global = true, long, env = "S3WAL_BUCKET", default_value = "wal")]
    bucket: String,

    /// Key prefix of the log
    #[arg(global = true, long, env = "S3WAL_PREFIX", default_value = "log")]
    prefix: String,

    /// Maximum keys per delete request
    #[arg(global = true, long, default_value_t = s3wal_core::DEFAULT_DELETE_BATCH_LIMIT)]
    delete_batch_limit: usize,

    /// Output format (text, json)
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a record
    Append {
        /// Record contents
        data: String,
    },

    /// Read the record at an offset
    Read {
        /// Offset to read (1-based)
        offset: u64,
    },

    /// Show the last record
    Last,

    /// Delete every record after an offset (0 clears the log)
    Truncate {
        /// Last offset to keep
        offset: u64,
    },

    /// Rebuild the log length from the store
    Recover,

    /// Read every record and report missing or corrupt ones
    Verify,

    /// Append five records, read, truncate and recover
    Demo,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings {
        root: cli.root,
        bucket: cli.bucket,
        prefix: cli.prefix,
        delete_batch_limit: cli.delete_batch_limit,
        format: cli.format,
    };

    match cli.command {
        Commands::Append { data } => commands::records::append(&settings, data.as_bytes())?,
        Commands::Read { offset } => commands::records::read(&settings, offset)?,
        Commands::Last => commands::records::last(&settings)?,
        Commands::Truncate { offset } => commands::truncate::run(&settings, offset)?,
        Commands::Recover => commands::recover::run(&settings)?,
        Commands::Verify => commands::verify::run(&settings)?,
        Commands::Demo => commands::demo::run(&settings)?,
        Commands::Version => {
            println!("s3wal CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("s3wal Core v{}", s3wal_core::VERSION);
        }
    }

    Ok(())
}
