use std::fmt;

use serde::Serialize;

use crate::schema::FieldType;

/// A typed cell value. Raw table text carries no inherent type; the record
/// kind's schema imposes one of these shapes during normalization. Absent
/// values are `None` at the call sites, not a variant here.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => {
                if f.fract() == 0.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Trims a raw cell and maps the source's absent-value placeholders to `None`.
pub fn clean_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    match trimmed {
        "" | "-" | "—" | "–" => None,
        _ => Some(trimmed),
    }
}

/// Converts one raw cell into a typed value, or `None` when the cell is a
/// placeholder or fails to parse. Total: a malformed cell never aborts the
/// batch it belongs to.
pub fn normalize_cell(raw: &str, datatype: FieldType) -> Option<Value> {
    let cell = clean_cell(raw)?;
    match datatype {
        FieldType::Text => Some(Value::Text(cell.to_string())),
        FieldType::Integer => parse_integer(cell).map(Value::Integer),
        FieldType::Real => parse_real(cell).map(Value::Real),
        FieldType::Innings => parse_innings(cell).map(Value::Real),
    }
}

/// Integer cells arrive with thousands separators and occasionally a decimal
/// tail ("1,234", "12.0"); parse as a float and truncate.
fn parse_integer(cell: &str) -> Option<i64> {
    let parsed = parse_plain_float(cell)?;
    parsed.is_finite().then_some(parsed.trunc() as i64)
}

fn parse_real(cell: &str) -> Option<f64> {
    let stripped = cell.replace(',', "");
    let stripped = stripped.strip_suffix('%').unwrap_or(&stripped);
    stripped.trim_end().parse().ok()
}

fn parse_plain_float(cell: &str) -> Option<f64> {
    cell.replace(',', "").parse().ok()
}

/// Innings pitched use fractional notation: "12 1/3" is twelve and a third
/// innings, a bare "2/3" is two thirds, and anything without a slash is a
/// plain float. Malformed forms (including a zero denominator) yield `None`.
fn parse_innings(cell: &str) -> Option<f64> {
    if !cell.contains('/') {
        return parse_plain_float(cell);
    }
    let parts: Vec<&str> = cell.split_whitespace().collect();
    let (whole, fraction) = match parts.as_slice() {
        [fraction] => (0.0, *fraction),
        [whole, fraction] => (parse_plain_float(whole)?, *fraction),
        _ => return None,
    };
    let (numerator, denominator) = fraction.split_once('/')?;
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(whole + numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_cell_maps_placeholders_to_none() {
        assert_eq!(clean_cell(""), None);
        assert_eq!(clean_cell("   "), None);
        assert_eq!(clean_cell("-"), None);
        assert_eq!(clean_cell("—"), None);
        assert_eq!(clean_cell("–"), None);
        assert_eq!(clean_cell(" 이정후 "), Some("이정후"));
    }

    #[test]
    fn integer_cells_strip_thousands_separators() {
        assert_eq!(
            normalize_cell("1,234", FieldType::Integer),
            Some(Value::Integer(1234))
        );
        assert_eq!(
            normalize_cell("12.0", FieldType::Integer),
            Some(Value::Integer(12))
        );
        assert_eq!(normalize_cell("abc", FieldType::Integer), None);
    }

    #[test]
    fn real_cells_strip_commas_and_trailing_percent() {
        assert_eq!(
            normalize_cell("0.345", FieldType::Real),
            Some(Value::Real(0.345))
        );
        assert_eq!(
            normalize_cell("95.2%", FieldType::Real),
            Some(Value::Real(95.2))
        );
        assert_eq!(
            normalize_cell("1,234.5", FieldType::Real),
            Some(Value::Real(1234.5))
        );
        assert_eq!(normalize_cell("n/a%", FieldType::Real), None);
    }

    #[test]
    fn innings_combine_whole_and_fraction() {
        assert_eq!(
            normalize_cell("12 1/3", FieldType::Innings),
            Some(Value::Real(12.0 + 1.0 / 3.0))
        );
        assert_eq!(
            normalize_cell("0 2/3", FieldType::Innings),
            Some(Value::Real(2.0 / 3.0))
        );
        assert_eq!(
            normalize_cell("2/3", FieldType::Innings),
            Some(Value::Real(2.0 / 3.0))
        );
        assert_eq!(
            normalize_cell("101.1", FieldType::Innings),
            Some(Value::Real(101.1))
        );
    }

    #[test]
    fn malformed_innings_degrade_to_none() {
        assert_eq!(normalize_cell("1 2 3/4", FieldType::Innings), None);
        assert_eq!(normalize_cell("12 x/3", FieldType::Innings), None);
        assert_eq!(normalize_cell("1/0", FieldType::Innings), None);
    }

    #[test]
    fn value_display_round_trips_whole_reals() {
        assert_eq!(Value::Real(12.0).as_display(), "12");
        assert_eq!(Value::Real(0.345).as_display(), "0.345");
        assert_eq!(Value::Integer(7).as_display(), "7");
        assert_eq!(Value::Text("두산".to_string()).as_display(), "두산");
    }
}
