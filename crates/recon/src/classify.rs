use crate::coerce::{format_number, parse_number_or_zero};
use crate::model::{ItemRecord, MatchResult, MatchStatus, RowView};

pub const MISSING_MESSAGE: &str = "no matching row found in reference sheet";

/// Classify one item given its matched reference row (if any).
///
/// The invoice quantity is the matched row's cell in `invoice_col`, coerced
/// to a number; an absent or non-numeric cell reads as `0`. Quantities are
/// compared exactly, without tolerance.
pub fn classify(
    item: &ItemRecord,
    matched: Option<&RowView<'_>>,
    invoice_col: usize,
) -> MatchResult {
    let Some(row) = matched else {
        return result(item, MatchStatus::Missing, MISSING_MESSAGE.to_string());
    };

    let invoice_qty = row.get_at(invoice_col).map(parse_number_or_zero).unwrap_or(0.0);
    let expected_qty = if item.qty.is_finite() { item.qty } else { 0.0 };

    if invoice_qty == expected_qty {
        result(item, MatchStatus::Ok, format!("qty matches ({})", format_number(invoice_qty)))
    } else {
        result(
            item,
            MatchStatus::Mismatch,
            format!(
                "invoice qty {} but expected {}",
                format_number(invoice_qty),
                format_number(expected_qty)
            ),
        )
    }
}

fn result(item: &ItemRecord, status: MatchStatus, message: String) -> MatchResult {
    MatchResult {
        row_index: item.row_index,
        material_no: item.material_no.clone(),
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReferenceRow, ReferenceTable};

    fn table(qty_cell: Option<&str>) -> ReferenceTable {
        let mut values = vec!["U-1".to_string(), "M-1".to_string()];
        if let Some(q) = qty_cell {
            values.push(q.to_string());
        }
        ReferenceTable::new(
            vec!["ULI PO".into(), "Material No".into(), "INV-1".into()],
            vec![ReferenceRow::new(values)],
        )
    }

    fn item(qty: f64) -> ItemRecord {
        ItemRecord { material_no: "M-1".into(), qty, row_index: 15, ..Default::default() }
    }

    #[test]
    fn equal_quantities_are_ok() {
        let t = table(Some("5"));
        let r = classify(&item(5.0), t.row(0).as_ref(), 2);
        assert_eq!(r.status, MatchStatus::Ok);
        assert!(r.message.contains('5'));
        assert_eq!(r.row_index, 15);
        assert_eq!(r.material_no, "M-1");
    }

    #[test]
    fn unequal_quantities_report_both_values() {
        let t = table(Some("5"));
        let r = classify(&item(7.0), t.row(0).as_ref(), 2);
        assert_eq!(r.status, MatchStatus::Mismatch);
        assert!(r.message.contains('5') && r.message.contains('7'), "{}", r.message);
    }

    #[test]
    fn absent_invoice_cell_reads_as_zero() {
        let t = table(None);
        assert_eq!(classify(&item(0.0), t.row(0).as_ref(), 2).status, MatchStatus::Ok);
        assert_eq!(classify(&item(3.0), t.row(0).as_ref(), 2).status, MatchStatus::Mismatch);
    }

    #[test]
    fn non_numeric_invoice_cell_reads_as_zero() {
        let t = table(Some("TBD"));
        assert_eq!(classify(&item(0.0), t.row(0).as_ref(), 2).status, MatchStatus::Ok);
    }

    #[test]
    fn decimal_quantities_compare_exactly() {
        let t = table(Some("2.5"));
        assert_eq!(classify(&item(2.5), t.row(0).as_ref(), 2).status, MatchStatus::Ok);
        let r = classify(&item(2.0), t.row(0).as_ref(), 2);
        assert_eq!(r.message, "invoice qty 2.5 but expected 2");
    }

    #[test]
    fn no_row_is_missing() {
        let r = classify(&item(5.0), None, 2);
        assert_eq!(r.status, MatchStatus::Missing);
        assert_eq!(r.message, MISSING_MESSAGE);
    }
}
