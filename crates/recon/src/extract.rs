//! Sheet extractor: raw stuffing-sheet grid → typed document.
//!
//! Pure and infallible. Absent cells read as `""` or `0`; a row whose
//! material number is blank is skipped without ending the scan.

use crate::coerce::{to_number_or_zero, to_trimmed_string_or_empty};
use crate::config::{CellRef, ColumnRef, SheetLayout};
use crate::model::{Cell, ItemRecord, ParsedDocument};

/// Extract with the standard stuffing-sheet layout.
pub fn extract(grid: &[Vec<Cell>]) -> ParsedDocument {
    extract_with_layout(grid, &SheetLayout::default())
}

pub fn extract_with_layout(grid: &[Vec<Cell>], layout: &SheetLayout) -> ParsedDocument {
    let rows: Vec<&[Cell]> = grid
        .iter()
        .map(Vec::as_slice)
        .filter(|row| !layout.skip_blank_rows || !is_empty_row(row))
        .collect();

    let header = |at: CellRef| {
        rows.get(at.row).map(|row| text_at(row, ColumnRef(at.col))).unwrap_or_default()
    };

    let cols = &layout.columns;
    let mut items = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in rows.iter().enumerate().skip(layout.first_item_index()) {
        let material_no = text_at(row, cols.material_no);
        if material_no.is_empty() {
            skipped += 1;
            continue;
        }

        let color_full = text_at(row, cols.color);
        items.push(ItemRecord {
            material_no,
            model_size: text_at(row, cols.model_size),
            qty: row.get(cols.qty.0).map(to_number_or_zero).unwrap_or(0.0),
            code_color: code_color(&color_full).to_string(),
            color_full,
            customer_po: text_at(row, cols.customer_po),
            uli_po: text_at(row, cols.uli_po),
            brand: text_at(row, cols.brand),
            row_index: idx + 1,
        });
    }

    log::debug!(
        "extracted {} item(s) from {} row(s), {} blank material row(s) skipped",
        items.len(),
        rows.len(),
        skipped
    );

    ParsedDocument {
        invoice_title: header(layout.invoice_cell),
        brand_to: header(layout.brand_to_cell),
        container: header(layout.container_cell),
        items,
    }
}

/// Leading color code of a color description: the longest prefix made of
/// ASCII letters, digits, `#` and `-`.
///
/// `"Y03#Navy Blue 100665MNVYV1"` → `"Y03#"`, `"藍 Navy"` → `""`.
pub fn code_color(color_full: &str) -> &str {
    let end = color_full
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#' || c == '-'))
        .unwrap_or(color_full.len());
    &color_full[..end]
}

fn text_at(row: &[Cell], col: ColumnRef) -> String {
    row.get(col.0).map(to_trimmed_string_or_empty).unwrap_or_default()
}

fn is_empty_row(row: &[Cell]) -> bool {
    row.iter().all(|c| match c {
        Cell::Empty => true,
        Cell::Text(s) => s.is_empty(),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    /// Item row with material in B, qty in E, color in F, POs in G/H, brand in I.
    fn item_row(material: &str, qty: Cell, color: &str, uli: &str, brand: &str) -> Vec<Cell> {
        vec![
            Cell::Empty,
            t(material),
            t("42"),
            Cell::Empty,
            qty,
            t(color),
            t("CPO-1"),
            t(uli),
            t(brand),
        ]
    }

    fn sheet_with_items(items: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
        let mut grid = vec![Vec::new(); 14];
        grid[2] = vec![t("Invoice"), Cell::Empty, t(" INV-100 ")];
        grid[4] = vec![t("Brand/TO"), Cell::Empty, t("NIKE")];
        grid[7] = vec![t("Container"), Cell::Empty, t("MSCU1234567")];
        grid.extend(items);
        grid
    }

    #[test]
    fn empty_grid_yields_empty_document() {
        let doc = extract(&[]);
        assert_eq!(doc, ParsedDocument::default());
    }

    #[test]
    fn reads_fixed_header_cells() {
        let doc = extract(&sheet_with_items(vec![]));
        assert_eq!(doc.invoice_title, "INV-100");
        assert_eq!(doc.brand_to, "NIKE");
        assert_eq!(doc.container, "MSCU1234567");
        assert!(doc.items.is_empty());
    }

    #[test]
    fn items_from_row_15_keep_sheet_row_numbers() {
        let doc = extract(&sheet_with_items(vec![
            item_row("M-1", Cell::Number(5.0), "Y03#Navy Blue 100665MNVYV1", "U1", "Nike"),
            item_row("M-2", t("7"), "B12 Black", "U2", "Nike"),
        ]));
        assert_eq!(doc.items.len(), 2);
        let first = &doc.items[0];
        assert_eq!(first.material_no, "M-1");
        assert_eq!(first.model_size, "42");
        assert_eq!(first.qty, 5.0);
        assert_eq!(first.color_full, "Y03#Navy Blue 100665MNVYV1");
        assert_eq!(first.code_color, "Y03#");
        assert_eq!(first.customer_po, "CPO-1");
        assert_eq!(first.uli_po, "U1");
        assert_eq!(first.brand, "Nike");
        assert_eq!(first.row_index, 15);
        assert_eq!(doc.items[1].qty, 7.0);
        assert_eq!(doc.items[1].row_index, 16);
    }

    #[test]
    fn blank_material_rows_are_skipped_not_terminal() {
        let doc = extract(&sheet_with_items(vec![
            item_row("M-1", Cell::Number(1.0), "", "", ""),
            Vec::new(),
            item_row("   ", Cell::Number(9.0), "", "", ""),
            item_row("M-4", Cell::Number(4.0), "", "", ""),
        ]));
        let rows: Vec<usize> = doc.items.iter().map(|i| i.row_index).collect();
        assert_eq!(rows, vec![15, 18]);
    }

    #[test]
    fn short_rows_and_bad_qty_coerce() {
        let doc = extract(&sheet_with_items(vec![
            vec![Cell::Empty, t("M-1")],
            item_row("M-2", t("n/a"), "", "", ""),
        ]));
        assert_eq!(doc.items[0].qty, 0.0);
        assert_eq!(doc.items[0].brand, "");
        assert_eq!(doc.items[0].code_color, "");
        assert_eq!(doc.items[1].qty, 0.0);
    }

    #[test]
    fn numeric_material_becomes_text() {
        let mut row = item_row("", Cell::Number(2.0), "", "", "");
        row[1] = Cell::Number(100665.0);
        let doc = extract(&sheet_with_items(vec![row]));
        assert_eq!(doc.items[0].material_no, "100665");
    }

    #[test]
    fn code_color_prefix_rules() {
        assert_eq!(code_color("Y03#Navy Blue 100665MNVYV1"), "Y03#");
        assert_eq!(code_color("藍 Navy"), "");
        assert_eq!(code_color("B-12#啞光藍"), "B-12#");
        assert_eq!(code_color(" leading space"), "");
        assert_eq!(code_color(""), "");
    }

    #[test]
    fn skip_blank_rows_compacts_before_addressing() {
        let grid = vec![
            vec![t("Invoice"), Cell::Empty, t("INV-7")],
            Vec::new(),
            vec![t("x"), t("M-1")],
        ];
        let layout = SheetLayout {
            invoice_cell: CellRef { row: 0, col: 2 },
            first_item_row: 2,
            skip_blank_rows: true,
            ..Default::default()
        };
        let doc = extract_with_layout(&grid, &layout);
        assert_eq!(doc.invoice_title, "INV-7");
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].row_index, 2);

        let absolute = SheetLayout { skip_blank_rows: false, ..layout };
        let doc = extract_with_layout(&grid, &absolute);
        assert_eq!(doc.items[0].row_index, 3);
    }
}
