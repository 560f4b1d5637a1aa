//! The `ingest` command: read one collected batch, stamp the collector's
//! season/team context onto it, normalize, and upsert into the destination
//! store. One transaction per batch; a failure leaves the store untouched.

use std::{fs::OpenOptions, io::Write, path::Path};

use anyhow::{Context, Result};
use chrono::Local;
use log::info;

use crate::{
    batch::Batch,
    cli::IngestArgs,
    io_utils, normalize,
    store::{Store, StoreConfig},
};

pub fn execute(args: &IngestArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let mut batch = Batch::from_csv_path(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading batch from {:?}", args.input))?;
    if let Some(team) = &args.team {
        batch.tag("team", team);
    }
    if let Some(year) = args.year {
        batch.tag("year", &year.to_string());
    }
    info!(
        "Read {} row(s) across {} column(s) from {:?}",
        batch.row_count(),
        batch.columns().len(),
        args.input
    );

    let normalized = normalize::normalize_batch(args.kind, &batch)?;
    if normalized.duplicates_dropped > 0 {
        info!(
            "Dropped {} duplicate row(s) sharing a natural key",
            normalized.duplicates_dropped
        );
    }

    let mut store = Store::open(&StoreConfig::file(&args.database))
        .with_context(|| format!("Opening database {:?}", args.database))?;
    store
        .create_tables()
        .context("Preparing destination tables")?;
    let written = store.upsert(&normalized)?;
    info!("Upserted {written} row(s) into {}", args.kind);

    if let Some(journal) = &args.journal {
        let outcome = format!("upserted {written} row(s) into {}", args.kind);
        append_journal(journal, &outcome)
            .with_context(|| format!("Appending to journal {journal:?}"))?;
    }
    Ok(())
}

/// Appends a timestamped outcome line to the run journal.
fn append_journal(path: &Path, outcome: &str) -> Result<()> {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "[{timestamp}] {outcome}")?;
    Ok(())
}
