use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coerce;

// ---------------------------------------------------------------------------
// Raw grid
// ---------------------------------------------------------------------------

/// One loosely-typed spreadsheet cell.
///
/// Deserializes from any JSON scalar (`null`, bool, number, string), which is
/// how grids arrive when they were parsed by a client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Rows of cells, 0-indexed, position addressed. Rows may be ragged.
pub type RawGrid = Vec<Vec<Cell>>;

// ---------------------------------------------------------------------------
// Extractor output
// ---------------------------------------------------------------------------

/// One shipped line item from a stuffing sheet.
///
/// Deserialization is lenient: missing fields default, `null` becomes empty,
/// and numbers/strings are coerced the same way the extractor coerces cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemRecord {
    #[serde(deserialize_with = "coerce::de_trimmed_string")]
    pub material_no: String,
    #[serde(deserialize_with = "coerce::de_trimmed_string")]
    pub model_size: String,
    #[serde(
        deserialize_with = "coerce::de_number_or_zero",
        serialize_with = "coerce::ser_number"
    )]
    pub qty: f64,
    #[serde(deserialize_with = "coerce::de_trimmed_string")]
    pub color_full: String,
    #[serde(deserialize_with = "coerce::de_trimmed_string")]
    pub code_color: String,
    #[serde(rename = "customerPO", deserialize_with = "coerce::de_trimmed_string")]
    pub customer_po: String,
    #[serde(rename = "uliPO", deserialize_with = "coerce::de_trimmed_string")]
    pub uli_po: String,
    #[serde(deserialize_with = "coerce::de_trimmed_string")]
    pub brand: String,
    /// 1-based row number in the source sheet. Never recomputed.
    #[serde(deserialize_with = "coerce::de_row_index")]
    pub row_index: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub invoice_title: String,
    pub brand_to: String,
    pub container: String,
    pub items: Vec<ItemRecord>,
}

// ---------------------------------------------------------------------------
// Reference table
// ---------------------------------------------------------------------------

/// One data row of the reference table, aligned with the header row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceRow {
    pub values: Vec<String>,
}

impl ReferenceRow {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }
}

impl<S: Into<String>> FromIterator<S> for ReferenceRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(Into::into).collect() }
    }
}

/// Header-addressed reference table ("sheet IN").
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    headers: Vec<String>,
    by_name: HashMap<String, usize>,
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    /// Build a table. Headers are trimmed; when two headers share a name the
    /// first one owns it.
    pub fn new(headers: Vec<String>, rows: Vec<ReferenceRow>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let mut by_name = HashMap::with_capacity(headers.len());
        for (idx, h) in headers.iter().enumerate() {
            if !h.is_empty() {
                by_name.entry(h.clone()).or_insert(idx);
            }
        }
        Self { headers, by_name, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> Option<RowView<'_>> {
        self.rows.get(idx).map(|row| RowView { table: self, row })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |row| RowView { table: self, row })
    }

    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

/// A reference row seen through its table's header names.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a ReferenceTable,
    row: &'a ReferenceRow,
}

impl<'a> RowView<'a> {
    /// Value under the header named exactly `name` (case-sensitive).
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.table.column_of(name).and_then(|idx| self.get_at(idx))
    }

    /// Value in column `idx`, if the row is long enough.
    pub fn get_at(&self, idx: usize) -> Option<&'a str> {
        self.row.values.get(idx).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Ok,
    Mismatch,
    Missing,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Mismatch => write!(f, "mismatch"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub row_index: usize,
    pub material_no: String,
    pub status: MatchStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub invoice_found: bool,
    pub summary: String,
    pub items: Vec<MatchResult>,
}
