use crate::fields::{AliasTable, LogicalField};
use crate::model::{ItemRecord, ReferenceTable, RowView};

/// What an empty item value means for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    /// Empty item value does not constrain the match.
    Optional,
    /// Empty item value can never match.
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    /// Case-insensitive equality.
    Equals,
    /// Case-insensitive substring of the reference value.
    Contains,
}

struct KeyRule {
    field: LogicalField,
    presence: Presence,
    comparison: Comparison,
}

/// All rules must hold for a row to match. Material number is the only
/// required key.
const KEY_RULES: [KeyRule; 4] = [
    KeyRule {
        field: LogicalField::MaterialNo,
        presence: Presence::Required,
        comparison: Comparison::Equals,
    },
    KeyRule {
        field: LogicalField::UliPo,
        presence: Presence::Optional,
        comparison: Comparison::Equals,
    },
    KeyRule {
        field: LogicalField::Brand,
        presence: Presence::Optional,
        comparison: Comparison::Equals,
    },
    KeyRule {
        field: LogicalField::CodeColor,
        presence: Presence::Optional,
        comparison: Comparison::Contains,
    },
];

fn item_value(item: &ItemRecord, field: LogicalField) -> &str {
    match field {
        LogicalField::UliPo => &item.uli_po,
        LogicalField::MaterialNo => &item.material_no,
        LogicalField::Brand => &item.brand,
        LogicalField::CodeColor => &item.code_color,
    }
}

/// Does `row` satisfy every key rule for `item`?
pub fn row_matches(item: &ItemRecord, row: &RowView<'_>, aliases: &AliasTable) -> bool {
    KEY_RULES.iter().all(|rule| {
        let wanted = item_value(item, rule.field).trim();
        if wanted.is_empty() {
            return rule.presence == Presence::Optional;
        }
        let found = aliases.lookup(row, rule.field).to_lowercase();
        let wanted = wanted.to_lowercase();
        match rule.comparison {
            Comparison::Equals => found == wanted,
            Comparison::Contains => found.contains(&wanted),
        }
    })
}

/// First row (table order) matching `item`, with its 0-based data-row index.
pub fn find_match<'a>(
    item: &ItemRecord,
    table: &'a ReferenceTable,
    aliases: &AliasTable,
) -> Option<(usize, RowView<'a>)> {
    if item.material_no.trim().is_empty() {
        return None;
    }
    table.rows().enumerate().find(|(_, row)| row_matches(item, row, aliases))
}
