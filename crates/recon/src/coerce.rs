//! Named coercions for loosely-typed spreadsheet values.
//!
//! Every path that turns a cell or a payload field into a string or a number
//! goes through here, so the boundary rules live in one place:
//!
//! | Input                 | `to_trimmed_string_or_empty` | `to_number_or_zero` |
//! |-----------------------|------------------------------|---------------------|
//! | empty / `null`        | `""`                         | `0`                 |
//! | `"  x "`              | `"x"`                        | `0`                 |
//! | `" 5 "`               | `"5"`                        | `5`                 |
//! | number `5.0`          | `"5"`                        | `5`                 |
//! | number `2.5`          | `"2.5"`                      | `2.5`               |
//! | `true` / `false`      | `"TRUE"` / `"FALSE"`         | `1` / `0`           |
//! | `"NaN"`, `"inf"`      | unchanged text               | `0`                 |

use serde::{Deserialize, Deserializer, Serializer};

use crate::model::Cell;

/// Render a number the way a spreadsheet shows it: integral values without a
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub fn to_trimmed_string_or_empty(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) if n.is_finite() => format_number(*n),
        Cell::Number(_) => String::new(),
        Cell::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
    }
}

pub fn to_number_or_zero(cell: &Cell) -> f64 {
    match cell {
        Cell::Empty => 0.0,
        Cell::Number(n) if n.is_finite() => *n,
        Cell::Number(_) => 0.0,
        Cell::Bool(true) => 1.0,
        Cell::Bool(false) => 0.0,
        Cell::Text(s) => parse_number_or_zero(s),
    }
}

/// Parse text as a number. Blank, non-numeric and non-finite text is `0`.
pub fn parse_number_or_zero(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// serde adapters for payload fields
// ---------------------------------------------------------------------------

pub(crate) fn de_trimmed_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(to_trimmed_string_or_empty(&Cell::deserialize(d)?))
}

pub(crate) fn de_number_or_zero<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(to_number_or_zero(&Cell::deserialize(d)?))
}

pub(crate) fn de_row_index<'de, D>(d: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let n = to_number_or_zero(&Cell::deserialize(d)?);
    Ok(if n >= 0.0 { n.trunc() as usize } else { 0 })
}

pub(crate) fn ser_number<S>(n: &f64, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if n.fract() == 0.0 && n.abs() < 1e15 {
        s.serialize_i64(*n as i64)
    } else {
        s.serialize_f64(*n)
    }
}
