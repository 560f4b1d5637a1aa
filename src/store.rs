//! SQLite-backed destination store.
//!
//! Owns table creation, the transactional batch upsert, and the per-year
//! count queries. Each record kind persists to its own table with the
//! natural key as primary key; re-upserting a key overwrites every non-key
//! column the batch supplies. DDL and upsert statements are generated from
//! the canonical schemas, so the store and the mapper can never disagree
//! about column names.

use std::path::PathBuf;

use itertools::Itertools;
use log::debug;
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

use crate::{
    data::Value,
    error::IngestError,
    normalize::NormalizedBatch,
    schema::{RecordKind, ResolvedColumn},
};

/// Where the destination database lives. Passed explicitly to
/// [`Store::open`]; nothing is read from the process environment.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    File(PathBuf),
    InMemory,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StoreConfig::File(path.into())
    }

    pub fn in_memory() -> Self {
        StoreConfig::InMemory
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(config: &StoreConfig) -> rusqlite::Result<Self> {
        let conn = match config {
            StoreConfig::File(path) => Connection::open(path)?,
            StoreConfig::InMemory => Connection::open_in_memory()?,
        };
        Ok(Store { conn })
    }

    /// Creates the destination tables if absent. Safe to call on every run.
    pub fn create_tables(&self) -> rusqlite::Result<()> {
        for kind in RecordKind::ALL {
            self.conn.execute(&create_table_sql(kind), [])?;
        }
        Ok(())
    }

    /// Writes one normalized batch in a single transaction: new natural keys
    /// insert, existing ones overwrite their non-key columns. Returns the
    /// row count written; an empty batch writes nothing and returns 0.
    pub fn upsert(&mut self, batch: &NormalizedBatch) -> Result<usize, IngestError> {
        if batch.rows.is_empty() {
            return Ok(0);
        }
        let sql = upsert_sql(batch.kind, &batch.columns);
        debug!("{sql}");
        self.upsert_rows(&sql, &batch.rows)
            .map_err(|source| IngestError::Persistence {
                kind: batch.kind,
                source,
            })
    }

    fn upsert_rows(&mut self, sql: &str, rows: &[Vec<Option<Value>>]) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(sql)?;
            for row in rows {
                stmt.execute(params_from_iter(row.iter().map(to_sql_value)))?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn count_for_year(&self, kind: RecordKind, year: i64) -> rusqlite::Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE year = ?1",
            kind.table_name()
        );
        self.conn
            .query_row(&sql, [year], |row| row.get::<_, i64>(0))
            .map(|count| count as usize)
    }
}

fn to_sql_value(value: &Option<Value>) -> SqlValue {
    match value {
        None => SqlValue::Null,
        Some(Value::Text(text)) => SqlValue::Text(text.clone()),
        Some(Value::Integer(integer)) => SqlValue::Integer(*integer),
        Some(Value::Real(real)) => SqlValue::Real(*real),
    }
}

fn create_table_sql(kind: RecordKind) -> String {
    let mut definitions: Vec<String> = kind
        .fields()
        .iter()
        .map(|spec| {
            if spec.key {
                format!("{} {} NOT NULL", spec.field, spec.datatype.sql_type())
            } else {
                format!("{} {}", spec.field, spec.datatype.sql_type())
            }
        })
        .collect();
    definitions.push(format!(
        "PRIMARY KEY ({})",
        kind.key_fields().map(|spec| spec.field).join(", ")
    ));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        kind.table_name(),
        definitions.join(",\n    ")
    )
}

/// Builds the insert-or-overwrite statement over the batch's resolved
/// columns. The conflict target is always the kind's natural key; when only
/// key columns resolved there is nothing to overwrite and the conflict
/// action degrades to a no-op.
fn upsert_sql(kind: RecordKind, columns: &[ResolvedColumn]) -> String {
    let insert_columns = columns.iter().map(|column| column.spec.field).join(", ");
    let placeholders = (1..=columns.len()).map(|n| format!("?{n}")).join(", ");
    let conflict_target = kind.key_fields().map(|spec| spec.field).join(", ");
    let assignments = columns
        .iter()
        .filter(|column| !column.spec.key)
        .map(|column| format!("{field} = excluded.{field}", field = column.spec.field))
        .join(", ");
    let action = if assignments.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {assignments}")
    };
    format!(
        "INSERT INTO {table} ({insert_columns}) VALUES ({placeholders}) \
         ON CONFLICT ({conflict_target}) {action}",
        table = kind.table_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolve_columns;

    fn headers(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    #[test]
    fn create_table_sql_declares_the_natural_key() {
        let sql = create_table_sql(RecordKind::TeamRankings);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS team_rankings"));
        assert!(sql.contains("team TEXT NOT NULL"));
        assert!(sql.contains("year INTEGER NOT NULL"));
        assert!(sql.contains("PRIMARY KEY (team, year)"));
    }

    #[test]
    fn upsert_sql_overwrites_only_non_key_columns() {
        let columns = resolve_columns(
            RecordKind::Hitters,
            &headers(&["선수명", "팀명", "year", "AVG", "HR"]),
        )
        .unwrap();
        let sql = upsert_sql(RecordKind::Hitters, &columns);
        assert_eq!(
            sql,
            "INSERT INTO hitters (player_name, team, year, avg, hr) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (player_name, team, year) \
             DO UPDATE SET avg = excluded.avg, hr = excluded.hr"
        );
    }

    #[test]
    fn upsert_sql_degrades_to_do_nothing_without_stat_columns() {
        let columns =
            resolve_columns(RecordKind::Hitters, &headers(&["선수명", "팀명", "year"])).unwrap();
        let sql = upsert_sql(RecordKind::Hitters, &columns);
        assert!(sql.ends_with("ON CONFLICT (player_name, team, year) DO NOTHING"));
    }

    fn hitter_batch(rows: &[&[&str]]) -> crate::normalize::NormalizedBatch {
        let batch = crate::batch::Batch::new(
            headers(&["선수명", "팀명", "year", "AVG", "HR"]),
            rows.iter().map(|row| headers(row)).collect(),
        );
        crate::normalize::normalize_batch(RecordKind::Hitters, &batch).unwrap()
    }

    #[test]
    fn upsert_inserts_then_overwrites_non_key_columns() {
        let mut store = Store::open(&StoreConfig::in_memory()).unwrap();
        store.create_tables().unwrap();

        let first = hitter_batch(&[&["김도영", "KIA", "2024", "0.347", "10"]]);
        assert_eq!(store.upsert(&first).unwrap(), 1);

        let second = hitter_batch(&[&["김도영", "KIA", "2024", "0.351", "12"]]);
        assert_eq!(store.upsert(&second).unwrap(), 1);

        let (count, hr, avg): (i64, i64, f64) = store
            .conn
            .query_row(
                "SELECT COUNT(*), hr, avg FROM hitters
                 WHERE player_name = '김도영' AND team = 'KIA' AND year = 2024",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(hr, 12);
        assert_eq!(avg, 0.351);
    }

    #[test]
    fn empty_batch_upserts_zero_rows() {
        let mut store = Store::open(&StoreConfig::in_memory()).unwrap();
        store.create_tables().unwrap();
        let empty = hitter_batch(&[]);
        assert_eq!(store.upsert(&empty).unwrap(), 0);
    }

    #[test]
    fn malformed_cells_store_null_without_rejecting_the_row() {
        let mut store = Store::open(&StoreConfig::in_memory()).unwrap();
        store.create_tables().unwrap();
        let batch = hitter_batch(&[&["김도영", "KIA", "2024", "abc", "-"]]);
        assert_eq!(store.upsert(&batch).unwrap(), 1);

        let (hr, avg): (Option<i64>, Option<f64>) = store
            .conn
            .query_row(
                "SELECT hr, avg FROM hitters WHERE player_name = '김도영'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(hr, None);
        assert_eq!(avg, None);
    }

    #[test]
    fn a_failing_row_rolls_back_the_whole_batch() {
        let mut store = Store::open(&StoreConfig::in_memory()).unwrap();
        store.create_tables().unwrap();
        // Second row's year fails to parse, so its key column lands NULL and
        // violates the NOT NULL key constraint.
        let batch = hitter_batch(&[
            &["김도영", "KIA", "2024", "0.347", "10"],
            &["문보경", "LG", "abc", "0.301", "18"],
        ]);
        let err = store.upsert(&batch).unwrap_err();
        assert!(matches!(err, IngestError::Persistence { .. }));
        assert_eq!(store.count_for_year(RecordKind::Hitters, 2024).unwrap(), 0);
    }

    #[test]
    fn count_for_year_only_counts_the_requested_season() {
        let mut store = Store::open(&StoreConfig::in_memory()).unwrap();
        store.create_tables().unwrap();
        let batch = hitter_batch(&[
            &["김도영", "KIA", "2024", "0.347", "10"],
            &["김도영", "KIA", "2025", "0.322", "7"],
        ]);
        assert_eq!(store.upsert(&batch).unwrap(), 2);
        assert_eq!(store.count_for_year(RecordKind::Hitters, 2024).unwrap(), 1);
        assert_eq!(store.count_for_year(RecordKind::Hitters, 2025).unwrap(), 1);
        assert_eq!(store.count_for_year(RecordKind::Pitchers, 2024).unwrap(), 0);
    }

    #[test]
    fn create_tables_is_idempotent() {
        let store = Store::open(&StoreConfig::in_memory()).unwrap();
        store.create_tables().unwrap();
        store.create_tables().unwrap();
        let count: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('hitters', 'pitchers', 'team_rankings')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
