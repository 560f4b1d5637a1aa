//! The mapper → deduplicator → normalizer pipeline, and the `normalize`
//! command that runs a batch through it without touching a database.
//!
//! Pipeline order matches the ingest data flow: resolve source columns
//! against the record kind's schema, project each row down to the resolved
//! fields, drop rows sharing a natural key (last occurrence wins), then
//! convert every remaining cell to its typed value. Rows whose non-key cells
//! all fail conversion are kept; only column resolution can reject a batch.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{
    batch::Batch,
    cli::NormalizeArgs,
    data::{self, Value},
    error::IngestError,
    io_utils,
    schema::{self, RecordKind, ResolvedColumn},
    table,
};

/// A batch after column resolution, deduplication, and typed conversion,
/// ready for the store.
#[derive(Debug)]
pub struct NormalizedBatch {
    pub kind: RecordKind,
    pub columns: Vec<ResolvedColumn>,
    pub rows: Vec<Vec<Option<Value>>>,
    pub duplicates_dropped: usize,
}

impl NormalizedBatch {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.spec.field).collect()
    }
}

pub fn normalize_batch(kind: RecordKind, batch: &Batch) -> Result<NormalizedBatch, IngestError> {
    let columns = schema::resolve_columns(kind, batch.columns())?;

    let mut projected: Vec<Vec<String>> = batch
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column.index).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    let before = projected.len();
    if let Some(key_positions) = key_positions(kind, &columns) {
        projected = keep_last_by_key(projected, &key_positions);
    }
    let duplicates_dropped = before - projected.len();

    let rows = projected
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(column, cell)| data::normalize_cell(cell, column.spec.datatype))
                .collect()
        })
        .collect();

    Ok(NormalizedBatch {
        kind,
        columns,
        rows,
        duplicates_dropped,
    })
}

/// Positions of the natural-key fields within the resolved columns, or
/// `None` when part of the key is missing from the batch. In that case
/// deduplication is skipped and the store's key constraint has the last
/// word.
fn key_positions(kind: RecordKind, columns: &[ResolvedColumn]) -> Option<Vec<usize>> {
    kind.key_fields()
        .map(|spec| {
            columns
                .iter()
                .position(|column| column.spec.field == spec.field)
        })
        .collect()
}

/// Keeps the last occurrence of each natural key, preserving batch order
/// among survivors. A collection run that re-reads a page produces
/// duplicates; the later read is taken as the authoritative one. Keys
/// compare on trimmed raw text, matching what text normalization will store.
fn keep_last_by_key(rows: Vec<Vec<String>>, key_positions: &[usize]) -> Vec<Vec<String>> {
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows.into_iter().rev() {
        let key: Vec<String> = key_positions
            .iter()
            .map(|&position| row[position].trim().to_string())
            .collect();
        if seen.insert(key) {
            kept.push(row);
        }
    }
    kept.reverse();
    kept
}

pub fn execute(args: &NormalizeArgs) -> Result<()> {
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

    let normalized = normalize_batch(args.kind, &batch)?;
    info!(
        "Resolved {} of {} column(s) for {}: {}",
        normalized.columns.len(),
        batch.columns().len(),
        args.kind,
        normalized.field_names().join(", ")
    );
    if normalized.duplicates_dropped > 0 {
        info!(
            "Dropped {} duplicate row(s) sharing a natural key",
            normalized.duplicates_dropped
        );
    }

    if args.table {
        render_preview(&normalized);
    } else if args.json {
        write_json(&normalized, args.output.as_deref())?;
    } else {
        write_csv(&normalized, args.output.as_deref(), args.delimiter, delimiter)?;
    }
    Ok(())
}

fn display_cell(value: &Option<Value>) -> String {
    value.as_ref().map(Value::as_display).unwrap_or_default()
}

fn render_preview(normalized: &NormalizedBatch) {
    let headers: Vec<String> = normalized
        .field_names()
        .iter()
        .map(|field| field.to_string())
        .collect();
    let rows: Vec<Vec<String>> = normalized
        .rows
        .iter()
        .map(|row| row.iter().map(display_cell).collect())
        .collect();
    table::print_table(&headers, &rows);
}

fn write_csv(
    normalized: &NormalizedBatch,
    output: Option<&Path>,
    provided_delimiter: Option<u8>,
    input_delimiter: u8,
) -> Result<()> {
    let delimiter = io_utils::resolve_output_delimiter(output, provided_delimiter, input_delimiter);
    let mut writer = io_utils::open_csv_writer(output, delimiter)?;
    writer.write_record(normalized.field_names())?;
    for row in &normalized.rows {
        writer.write_record(row.iter().map(|value| display_cell(value)))?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

fn write_json(normalized: &NormalizedBatch, output: Option<&Path>) -> Result<()> {
    let mut writer = io_utils::open_output_writer(output)?;
    for row in &normalized.rows {
        let object: serde_json::Map<String, serde_json::Value> = normalized
            .columns
            .iter()
            .zip(row)
            .map(|(column, value)| {
                Ok((
                    column.spec.field.to_string(),
                    serde_json::to_value(value).context("Serializing normalized value")?,
                ))
            })
            .collect::<Result<_>>()?;
        serde_json::to_writer(&mut writer, &serde_json::Value::Object(object))?;
        writer.write_all(b"\n")?;
    }
    writer.flush().context("Flushing JSON output")?;
    Ok(())
}
