//! Alias-chain field lookup for reference rows.
//!
//! Each logical match field owns an ordered list of candidate keys. A key is
//! either a header name (exact, case-sensitive) or a column position written
//! `#N` (0-based). The first candidate holding a non-blank value wins. Adding
//! an alias is a data change: append a key to the list.

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::RowView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKey {
    Header(String),
    Position(usize),
}

impl FieldKey {
    pub fn header(name: &str) -> Self {
        Self::Header(name.to_string())
    }
}

impl TryFrom<String> for FieldKey {
    type Error = ReconError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.strip_prefix('#') {
            Some(pos) => pos
                .trim()
                .parse::<usize>()
                .map(Self::Position)
                .map_err(|_| ReconError::BadReference(raw.clone())),
            None if raw.trim().is_empty() => {
                Err(ReconError::ConfigValidation("alias key must not be empty".into()))
            }
            None => Ok(Self::Header(raw)),
        }
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.to_string()
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header(name) => write!(f, "{name}"),
            Self::Position(idx) => write!(f, "#{idx}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    UliPo,
    MaterialNo,
    Brand,
    CodeColor,
}

impl std::fmt::Display for LogicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UliPo => write!(f, "uli_po"),
            Self::MaterialNo => write!(f, "material_no"),
            Self::Brand => write!(f, "brand"),
            Self::CodeColor => write!(f, "code_color"),
        }
    }
}

/// Candidate keys per logical field, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub uli_po: Vec<FieldKey>,
    pub material_no: Vec<FieldKey>,
    pub brand: Vec<FieldKey>,
    pub code_color: Vec<FieldKey>,
}

impl Default for AliasTable {
    fn default() -> Self {
        use FieldKey::Position;
        let h = FieldKey::header;
        Self {
            uli_po: vec![h("ULI PO"), h("ULI_PO"), h("ULIPO"), Position(0)],
            material_no: vec![
                h("Material No"),
                h("MaterialNo"),
                h("Material"),
                Position(2),
                h("C"),
            ],
            brand: vec![h("Brand"), h("brand"), Position(3)],
            code_color: vec![
                h("Code Color"),
                h("Color Code"),
                h("code color"),
                h("H"),
                h("CodeColor"),
                h("Color"),
            ],
        }
    }
}

impl AliasTable {
    pub fn keys(&self, field: LogicalField) -> &[FieldKey] {
        match field {
            LogicalField::UliPo => &self.uli_po,
            LogicalField::MaterialNo => &self.material_no,
            LogicalField::Brand => &self.brand,
            LogicalField::CodeColor => &self.code_color,
        }
    }

    /// Resolve `field` on `row`: first candidate with a non-blank value,
    /// trimmed. Missing everywhere resolves to `""`.
    ///
    /// A whitespace-only value is blank and falls through to the next key.
    pub fn lookup<'a>(&self, row: &RowView<'a>, field: LogicalField) -> &'a str {
        self.keys(field)
            .iter()
            .filter_map(|key| match key {
                FieldKey::Header(name) => row.get(name),
                FieldKey::Position(idx) => row.get_at(*idx),
            })
            .map(str::trim)
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for field in [
            LogicalField::UliPo,
            LogicalField::MaterialNo,
            LogicalField::Brand,
            LogicalField::CodeColor,
        ] {
            if self.keys(field).is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "aliases.{field} must list at least one key"
                )));
            }
        }
        Ok(())
    }
}
