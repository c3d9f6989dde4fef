use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::fields::AliasTable;

/// Default cap on reference rows fetched per request.
pub const DEFAULT_ROW_LIMIT: usize = 10_000;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    /// Maximum reference rows loaded. Rows past the cap never match.
    pub row_limit: usize,
    pub layout: SheetLayout,
    pub aliases: AliasTable,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            layout: SheetLayout::default(),
            aliases: AliasTable::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stuffing sheet layout
// ---------------------------------------------------------------------------

/// Fixed positions of the stuffing sheet, written in A1 notation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetLayout {
    pub invoice_cell: CellRef,
    pub brand_to_cell: CellRef,
    pub container_cell: CellRef,
    /// 1-based sheet row where line items start.
    pub first_item_row: usize,
    /// Drop fully blank rows before position addressing.
    pub skip_blank_rows: bool,
    pub columns: ItemColumns,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            invoice_cell: CellRef { row: 2, col: 2 },
            brand_to_cell: CellRef { row: 4, col: 2 },
            container_cell: CellRef { row: 7, col: 2 },
            first_item_row: 15,
            skip_blank_rows: false,
            columns: ItemColumns::default(),
        }
    }
}

impl SheetLayout {
    /// 0-based grid index of the first item row.
    pub fn first_item_index(&self) -> usize {
        self.first_item_row.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemColumns {
    pub material_no: ColumnRef,
    pub model_size: ColumnRef,
    pub qty: ColumnRef,
    pub color: ColumnRef,
    pub customer_po: ColumnRef,
    pub uli_po: ColumnRef,
    pub brand: ColumnRef,
}

impl Default for ItemColumns {
    fn default() -> Self {
        Self {
            material_no: ColumnRef(1),
            model_size: ColumnRef(2),
            qty: ColumnRef(4),
            color: ColumnRef(5),
            customer_po: ColumnRef(6),
            uli_po: ColumnRef(7),
            brand: ColumnRef(8),
        }
    }
}

// ---------------------------------------------------------------------------
// A1 references
// ---------------------------------------------------------------------------

/// 0-indexed (row, col) cell position. Serialized as A1 text ("C3").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl TryFrom<String> for CellRef {
    type Error = ReconError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        parse_cell_ref(&raw)
            .map(|(row, col)| CellRef { row, col })
            .ok_or(ReconError::BadReference(raw))
    }
}

impl From<CellRef> for String {
    fn from(r: CellRef) -> Self {
        r.to_string()
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", col_to_letter(self.col), self.row + 1)
    }
}

/// 0-indexed column. Serialized as letters ("B").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef(pub usize);

impl TryFrom<String> for ColumnRef {
    type Error = ReconError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        letters_to_col(raw.trim()).map(ColumnRef).ok_or(ReconError::BadReference(raw))
    }
}

impl From<ColumnRef> for String {
    fn from(c: ColumnRef) -> Self {
        col_to_letter(c.0)
    }
}

/// Convert column index to Excel column letter (0 = A, 25 = Z, 26 = AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut col: usize = 0;
    for ch in letters.chars() {
        let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    Some(col - 1)
}

/// Parse "C3" / "aa10" into 0-indexed (row, col).
pub fn parse_cell_ref(cell_ref: &str) -> Option<(usize, usize)> {
    let cell_ref = cell_ref.trim();
    let split = cell_ref.find(|c: char| c.is_ascii_digit())?;
    let (col_part, row_part) = cell_ref.split_at(split);
    if !row_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let col = letters_to_col(col_part)?;
    let row = row_part.parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col))
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.row_limit == 0 {
            return Err(ReconError::ConfigValidation("row_limit must be at least 1".into()));
        }

        if self.layout.first_item_row == 0 {
            return Err(ReconError::ConfigValidation(
                "layout.first_item_row is 1-based and must be at least 1".into(),
            ));
        }

        self.aliases.validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
