//! Reference data source seam.
//!
//! The engine asks a source for the header row first and only fetches data
//! rows once the invoice column is known to exist.

use crate::error::SourceError;
use crate::model::{ReferenceRow, ReferenceTable};

pub trait ReferenceSource {
    /// Short description for logs (`"file:stock.xlsx#IN"`, `"memory"`, ...).
    fn describe(&self) -> String;

    /// First row of the reference sheet, untrimmed.
    fn header_row(&mut self) -> Result<Vec<String>, SourceError>;

    /// Data rows after the header, at most `limit` of them, in sheet order.
    fn rows(&mut self, limit: usize) -> Result<Vec<ReferenceRow>, SourceError>;
}

/// Headers plus at most `limit` rows, as one table.
pub fn load_table(
    source: &mut dyn ReferenceSource,
    limit: usize,
) -> Result<ReferenceTable, SourceError> {
    let headers = source.header_row()?;
    let rows = source.rows(limit)?;
    Ok(ReferenceTable::new(headers, rows))
}

/// Source over rows already in memory. Used for CSV fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    headers: Vec<String>,
    rows: Vec<ReferenceRow>,
}

impl InMemorySource {
    pub fn new(headers: Vec<String>, rows: Vec<ReferenceRow>) -> Self {
        Self { headers, rows }
    }

    /// Parse CSV text: the first record is the header row. Records may be
    /// ragged.
    pub fn from_csv(text: &str) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();
        let headers = match records.next() {
            Some(rec) => {
                let rec = rec.map_err(|e| SourceError::Read(e.to_string()))?;
                rec.iter().map(str::to_string).collect()
            }
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for rec in records {
            let rec = rec.map_err(|e| SourceError::Read(e.to_string()))?;
            rows.push(rec.iter().collect::<ReferenceRow>());
        }

        Ok(Self { headers, rows })
    }
}

impl ReferenceSource for InMemorySource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn header_row(&mut self) -> Result<Vec<String>, SourceError> {
        Ok(self.headers.clone())
    }

    fn rows(&mut self, limit: usize) -> Result<Vec<ReferenceRow>, SourceError> {
        Ok(self.rows.iter().take(limit).cloned().collect())
    }
}
