//! Canonical record schemas and source-column resolution.
//!
//! This module owns the three record kinds the crate stores (hitter season
//! lines, pitcher season lines, team ranking snapshots), their canonical
//! field lists, and the mapper that resolves a batch's source column labels
//! against those lists.
//!
//! Scraped KBO tables name the same column inconsistently across pages
//! (팀 vs 팀명 for the team, 순위 vs the reader's 순위.1 suffix for the
//! rank), so every field declares an ordered alias list. Resolution walks
//! fields in schema order and aliases in declaration order; the first label
//! present in the batch wins. The outcome is deterministic regardless of the
//! input's column order, and each canonical field resolves at most once.

use std::fmt;

use clap::ValueEnum;

use crate::error::IngestError;

/// Target type a canonical field normalizes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Real,
    /// Real stored from fractional-innings notation ("12 1/3").
    Innings,
}

impl FieldType {
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Integer => "INTEGER",
            FieldType::Real | FieldType::Innings => "REAL",
        }
    }
}

/// One canonical field: destination column name, the ordered source labels
/// it accepts, its target type, and whether it is part of the natural key.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
    pub datatype: FieldType,
    pub key: bool,
}

const fn key(field: &'static str, aliases: &'static [&'static str], datatype: FieldType) -> FieldSpec {
    FieldSpec {
        field,
        aliases,
        datatype,
        key: true,
    }
}

const fn stat(field: &'static str, aliases: &'static [&'static str], datatype: FieldType) -> FieldSpec {
    FieldSpec {
        field,
        aliases,
        datatype,
        key: false,
    }
}

const HITTER_FIELDS: &[FieldSpec] = &[
    key("player_name", &["선수명"], FieldType::Text),
    key("team", &["팀명"], FieldType::Text),
    key("year", &["year"], FieldType::Integer),
    stat("avg", &["AVG"], FieldType::Real),
    stat("g", &["G"], FieldType::Integer),
    stat("pa", &["PA"], FieldType::Integer),
    stat("ab", &["AB"], FieldType::Integer),
    stat("r", &["R"], FieldType::Integer),
    stat("h", &["H"], FieldType::Integer),
    stat("doubles", &["2B"], FieldType::Integer),
    stat("triples", &["3B"], FieldType::Integer),
    stat("hr", &["HR"], FieldType::Integer),
    stat("tb", &["TB"], FieldType::Integer),
    stat("rbi", &["RBI"], FieldType::Integer),
    stat("sac", &["SAC"], FieldType::Integer),
    stat("sf", &["SF"], FieldType::Integer),
];

const PITCHER_FIELDS: &[FieldSpec] = &[
    key("player_name", &["선수명"], FieldType::Text),
    key("team", &["팀명"], FieldType::Text),
    key("year", &["year"], FieldType::Integer),
    stat("era", &["ERA"], FieldType::Real),
    stat("ip", &["IP"], FieldType::Innings),
    stat("w", &["W"], FieldType::Integer),
    stat("l", &["L"], FieldType::Integer),
    stat("sv", &["SV"], FieldType::Integer),
    stat("so", &["SO"], FieldType::Integer),
    stat("bb", &["BB"], FieldType::Integer),
    stat("h", &["H"], FieldType::Integer),
    stat("hr", &["HR"], FieldType::Integer),
];

const TEAM_RANKING_FIELDS: &[FieldSpec] = &[
    key("team", &["팀", "팀명"], FieldType::Text),
    key("year", &["year"], FieldType::Integer),
    stat("games", &["경기", "G"], FieldType::Integer),
    stat("rank", &["순위", "순위.1"], FieldType::Integer),
    stat("wins", &["승"], FieldType::Integer),
    stat("losses", &["패"], FieldType::Integer),
    stat("draws", &["무"], FieldType::Integer),
    stat("pct", &["승률"], FieldType::Real),
    stat("gb", &["게임차", "GB"], FieldType::Real),
    stat("streak", &["연속"], FieldType::Text),
    stat("last10", &["최근10경기"], FieldType::Text),
    stat("home_record", &["홈"], FieldType::Text),
    stat("away_record", &["방문"], FieldType::Text),
];

/// The record kinds a batch can hold, each persisted to its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum RecordKind {
    Hitters,
    Pitchers,
    TeamRankings,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Hitters,
        RecordKind::Pitchers,
        RecordKind::TeamRankings,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            RecordKind::Hitters => "hitters",
            RecordKind::Pitchers => "pitchers",
            RecordKind::TeamRankings => "team_rankings",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            RecordKind::Hitters => HITTER_FIELDS,
            RecordKind::Pitchers => PITCHER_FIELDS,
            RecordKind::TeamRankings => TEAM_RANKING_FIELDS,
        }
    }

    pub fn key_fields(self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields().iter().filter(|spec| spec.key)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A canonical field found in the batch: which source label won and where
/// that column sits in the batch's header row.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub spec: FieldSpec,
    pub source: String,
    pub index: usize,
}

/// Resolves a batch's header row against a record kind's schema, keeping
/// schema order. Fails with [`IngestError::SchemaMismatch`] when nothing
/// resolves; a partially matching batch is projected down to the fields it
/// does carry.
pub fn resolve_columns(
    kind: RecordKind,
    headers: &[String],
) -> Result<Vec<ResolvedColumn>, IngestError> {
    let mut resolved = Vec::new();
    for spec in kind.fields() {
        let hit = spec.aliases.iter().find_map(|alias| {
            headers
                .iter()
                .position(|header| header.trim() == *alias)
                .map(|index| (*alias, index))
        });
        if let Some((alias, index)) = hit {
            resolved.push(ResolvedColumn {
                spec: *spec,
                source: alias.to_string(),
                index,
            });
        }
    }
    if resolved.is_empty() {
        return Err(IngestError::SchemaMismatch { kind });
    }
    Ok(resolved)
}
