//! Raw batch handling: one collection run's rows for a single record kind,
//! read from CSV and still untyped. The collector's season/team context is
//! stamped on as constant columns before normalization.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::io_utils;

#[derive(Debug, Clone, Default)]
pub struct Batch {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Batch {
    /// Builds a batch from a header row and raw rows. Rows are padded or
    /// truncated so every row has exactly one cell per column.
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        for row in &mut rows {
            row.resize(columns.len(), String::new());
        }
        Self { columns, rows }
    }

    /// Reads a batch from a CSV file (or stdin via `-`), decoding cells with
    /// the given encoding. KBO exports are frequently CP949/EUC-KR, so the
    /// reader works on byte records and decodes explicitly.
    pub fn from_csv_path(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let columns = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading header row from {path:?}"))?;
        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record.with_context(|| format!("Reading CSV record from {path:?}"))?;
            rows.push(io_utils::decode_record(&record, encoding)?);
        }
        Ok(Batch::new(columns, rows))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stamps a constant-valued column onto every row, overwriting an
    /// existing column of the same name. Used for the collector's `team` and
    /// `year` context.
    pub fn tag(&mut self, name: &str, value: &str) {
        if let Some(index) = self.columns.iter().position(|column| column == name) {
            for row in &mut self.rows {
                row[index] = value.to_string();
            }
        } else {
            self.columns.push(name.to_string());
            for row in &mut self.rows {
                row.push(value.to_string());
            }
        }
    }
}
