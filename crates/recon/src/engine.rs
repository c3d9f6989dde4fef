use crate::classify::classify;
use crate::config::ReconConfig;
use crate::error::SourceError;
use crate::evidence::compute_counts;
use crate::fields::AliasTable;
use crate::matcher::find_match;
use crate::model::{ItemRecord, MatchResult, ReconciliationReport, ReferenceRow, ReferenceTable};
use crate::source::ReferenceSource;

/// Summary of a report whose invoice column does not exist.
pub const INVOICE_NOT_FOUND: &str = "Invoice header not found in sheet";

/// Index of the first header equal to `title`, ignoring case and
/// surrounding whitespace. An empty title never resolves.
pub fn resolve_invoice_column(headers: &[String], title: &str) -> Option<usize> {
    let wanted = title.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    headers.iter().position(|h| h.trim().to_lowercase() == wanted)
}

pub fn not_found_report() -> ReconciliationReport {
    ReconciliationReport {
        invoice_found: false,
        summary: INVOICE_NOT_FOUND.to_string(),
        items: Vec::new(),
    }
}

/// Reconcile with the default alias chains.
pub fn reconcile(
    invoice_title: &str,
    items: &[ItemRecord],
    table: &ReferenceTable,
) -> ReconciliationReport {
    reconcile_with(&AliasTable::default(), invoice_title, items, table)
}

/// Reconcile with the aliases of `config`.
pub fn run(
    config: &ReconConfig,
    invoice_title: &str,
    items: &[ItemRecord],
    table: &ReferenceTable,
) -> ReconciliationReport {
    reconcile_with(&config.aliases, invoice_title, items, table)
}

pub fn reconcile_with(
    aliases: &AliasTable,
    invoice_title: &str,
    items: &[ItemRecord],
    table: &ReferenceTable,
) -> ReconciliationReport {
    let Some(invoice_col) = resolve_invoice_column(table.headers(), invoice_title) else {
        log::debug!(
            "invoice header {:?} not among {} header(s)",
            invoice_title.trim(),
            table.headers().len()
        );
        return not_found_report();
    };
    log::debug!("invoice {:?} resolved to column {}", invoice_title.trim(), invoice_col);

    let results: Vec<MatchResult> = items
        .iter()
        .map(|item| {
            let matched = find_match(item, table, aliases).map(|(_, row)| row);
            classify(item, matched.as_ref(), invoice_col)
        })
        .collect();

    ReconciliationReport {
        invoice_found: true,
        summary: compute_counts(&results).summary_line(),
        items: results,
    }
}

/// Full check-in round trip against a live source.
///
/// The header row is fetched first; when the invoice column is absent the
/// data rows are never requested. Source failures propagate unchanged.
pub fn check_in(
    config: &ReconConfig,
    source: &mut dyn ReferenceSource,
    invoice_title: &str,
    items: &[ItemRecord],
) -> Result<ReconciliationReport, SourceError> {
    let headers = source.header_row()?;
    if resolve_invoice_column(&headers, invoice_title).is_none() {
        log::info!("{}: invoice {:?} not found", source.describe(), invoice_title.trim());
        return Ok(not_found_report());
    }

    let (rows, truncated) = fetch_capped_rows(source, config.row_limit)?;
    if truncated {
        log::warn!(
            "{}: more than {} rows (row_limit); later rows are not matched",
            source.describe(),
            config.row_limit
        );
    } else {
        log::debug!("{}: loaded {} rows", source.describe(), rows.len());
    }

    let table = ReferenceTable::new(headers, rows);
    let report = run(config, invoice_title, items, &table);
    log::info!("{}: {} -> {}", source.describe(), invoice_title.trim(), report.summary);
    Ok(report)
}

/// Fetch at most `limit` rows. The flag is set only when the source had more.
fn fetch_capped_rows(
    source: &mut dyn ReferenceSource,
    limit: usize,
) -> Result<(Vec<ReferenceRow>, bool), SourceError> {
    let mut rows = source.rows(limit.saturating_add(1))?;
    let truncated = rows.len() > limit;
    rows.truncate(limit);
    Ok((rows, truncated))
}
