use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::schema::RecordKind;

#[derive(Debug, Parser)]
#[command(author, version, about = "Normalize and store scraped KBO statistics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the destination tables in a database
    Init(InitArgs),
    /// Normalize a collected batch and upsert it into a database
    Ingest(IngestArgs),
    /// Normalize a collected batch and write it out without a database
    Normalize(NormalizeArgs),
    /// Report stored row counts per record kind for a season
    Count(CountArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Destination SQLite database file
    #[arg(short, long)]
    pub database: PathBuf,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Input CSV batch produced by the collector ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Record kind the batch holds
    #[arg(short = 'k', long = "kind", value_enum)]
    pub kind: RecordKind,
    /// Destination SQLite database file
    #[arg(short, long)]
    pub database: PathBuf,
    /// Season year to stamp onto every row (overwrites a 'year' column)
    #[arg(long)]
    pub year: Option<i64>,
    /// Team name to stamp onto every row (overwrites a 'team' column)
    #[arg(long)]
    pub team: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Append a timestamped outcome line to this file
    #[arg(long)]
    pub journal: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Input CSV batch produced by the collector ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Record kind the batch holds
    #[arg(short = 'k', long = "kind", value_enum)]
    pub kind: RecordKind,
    /// Output file for the normalized rows (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Season year to stamp onto every row (overwrites a 'year' column)
    #[arg(long)]
    pub year: Option<i64>,
    /// Team name to stamp onto every row (overwrites a 'team' column)
    #[arg(long)]
    pub team: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Render the normalized rows as an aligned table to stdout
    #[arg(long, conflicts_with = "json")]
    pub table: bool,
    /// Emit one JSON object per row instead of CSV
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CountArgs {
    /// SQLite database file to inspect
    #[arg(short, long)]
    pub database: PathBuf,
    /// Season year to count rows for
    #[arg(long)]
    pub year: i64,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
