use std::path::PathBuf;

use stuffcheck_recon::config::ReconConfig;
use stuffcheck_recon::engine::{check_in, reconcile, INVOICE_NOT_FOUND};
use stuffcheck_recon::model::{Cell, MatchStatus, ParsedDocument, RawGrid};
use stuffcheck_recon::source::{load_table, InMemorySource};
use stuffcheck_recon::{extract, ReconciliationReport};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// A CSV export of a stuffing sheet, every non-empty field as text.
fn grid_from_csv(text: &str) -> RawGrid {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    reader
        .records()
        .map(|rec| {
            rec.unwrap()
                .iter()
                .map(|f| if f.is_empty() { Cell::Empty } else { Cell::Text(f.to_string()) })
                .collect()
        })
        .collect()
}

fn stuffing() -> ParsedDocument {
    extract(&grid_from_csv(&read_fixture("stuffing.csv")))
}

fn reference() -> InMemorySource {
    InMemorySource::from_csv(&read_fixture("sheet_in.csv")).unwrap()
}

fn check(title: &str) -> ReconciliationReport {
    let doc = stuffing();
    check_in(&ReconConfig::default(), &mut reference(), title, &doc.items).unwrap()
}

// -------------------------------------------------------------------------
// Extraction
// -------------------------------------------------------------------------

#[test]
fn stuffing_sheet_extracts_headers_and_items() {
    let doc = stuffing();
    assert_eq!(doc.invoice_title, "INV-01");
    assert_eq!(doc.brand_to, "NIKE / ADIDAS");
    assert_eq!(doc.container, "MSCU1234567");

    let materials: Vec<&str> = doc.items.iter().map(|i| i.material_no.as_str()).collect();
    assert_eq!(materials, vec!["M-100", "M-200", "M-999", "M-300"]);

    // Blank row 17 and whitespace-material row 19 are skipped.
    let rows: Vec<usize> = doc.items.iter().map(|i| i.row_index).collect();
    assert_eq!(rows, vec![15, 16, 18, 20]);

    assert_eq!(doc.items[0].code_color, "Y03#");
    assert_eq!(doc.items[0].qty, 5.0);
    assert_eq!(doc.items[0].uli_po, "U-100");
}

// -------------------------------------------------------------------------
// End-to-end reconciliation
// -------------------------------------------------------------------------

#[test]
fn padded_invoice_header_matches_case_insensitively() {
    let report = check("inv-01");
    assert!(report.invoice_found);
    assert_eq!(report.items.len(), 4);
}

#[test]
fn mixed_outcomes_against_sheet_in() {
    let report = check("INV-01");
    assert_eq!(report.summary, "2 ok, 1 mismatch, 1 missing");

    let outcome: Vec<(usize, &str, MatchStatus)> = report
        .items
        .iter()
        .map(|r| (r.row_index, r.material_no.as_str(), r.status))
        .collect();
    assert_eq!(
        outcome,
        vec![
            (15, "M-100", MatchStatus::Ok),
            (16, "M-200", MatchStatus::Mismatch),
            (18, "M-999", MatchStatus::Missing),
            (20, "M-300", MatchStatus::Ok),
        ]
    );

    let mismatch = &report.items[1].message;
    assert!(mismatch.contains('5') && mismatch.contains('7'), "{mismatch}");
}

#[test]
fn color_code_picks_the_right_duplicate_row() {
    // M-300 exists twice; only the "R07 Red" row holds the R07 color code.
    let report = check("INV-02");
    let m300 = report.items.iter().find(|r| r.material_no == "M-300").unwrap();
    // INV-02 is blank on the R07 row, so the invoice quantity reads as 0.
    assert_eq!(m300.status, MatchStatus::Mismatch);
}

#[test]
fn unknown_invoice_reports_not_found_without_items() {
    let report = check("INV-100");
    assert!(!report.invoice_found);
    assert_eq!(report.summary, INVOICE_NOT_FOUND);
    assert!(report.items.is_empty());
}

#[test]
fn report_json_shape() {
    let report = check("INV-01");
    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["invoiceFound"], true);
    assert_eq!(v["items"][0]["rowIndex"], 15);
    assert_eq!(v["items"][0]["materialNo"], "M-100");
    assert_eq!(v["items"][1]["status"], "mismatch");
    assert_eq!(v["items"][2]["status"], "missing");
}

// -------------------------------------------------------------------------
// Alias configuration
// -------------------------------------------------------------------------

#[test]
fn configured_aliases_resolve_renamed_headers() {
    let config = ReconConfig::from_toml(&read_fixture("aliases.toml")).unwrap();
    assert_eq!(config.row_limit, 500);

    let mut src = InMemorySource::from_csv(&read_fixture("renamed_headers.csv")).unwrap();
    let doc = stuffing();
    let first = &doc.items[..1];

    let report = check_in(&config, &mut src, "INV-9", first).unwrap();
    assert_eq!(report.summary, "1 ok, 0 mismatch, 0 missing");
}

#[test]
fn default_aliases_have_no_positional_color_fallback() {
    let mut src = InMemorySource::from_csv(&read_fixture("renamed_headers.csv")).unwrap();
    let table = load_table(&mut src, 100).unwrap();
    let doc = stuffing();

    // Material, ULI PO and brand fall back to positions 2, 0 and 3, but the
    // "Shade" column is invisible to the default color chain.
    let report = reconcile("INV-9", &doc.items[..1], &table);
    assert_eq!(report.items[0].status, MatchStatus::Missing);
}
