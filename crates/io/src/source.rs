//! File-backed reference sources.
//!
//! A workbook source reads one named sheet; a delimited-text source is a
//! single table and ignores the sheet name. Either is read at most once per
//! source value, so one request sees one consistent snapshot.

use std::path::{Path, PathBuf};

use stuffcheck_recon::coerce::to_trimmed_string_or_empty;
use stuffcheck_recon::model::{RawGrid, ReferenceRow};
use stuffcheck_recon::{ReferenceSource, SourceError};

use crate::xlsx::SheetRead;
use crate::{csv, xlsx, FileKind};

pub struct FileSource {
    path: PathBuf,
    sheet: String,
    table: Option<Vec<Vec<String>>>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self { path: path.into(), sheet: sheet.into(), table: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> Result<&[Vec<String>], SourceError> {
        if self.table.is_none() {
            let table = read_table(&self.path, &self.sheet)?;
            log::debug!("{}: {} row(s) including header", self.describe(), table.len());
            self.table = Some(table);
        }
        Ok(self.table.as_deref().unwrap_or_default())
    }
}

fn read_table(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>, SourceError> {
    match FileKind::of(path) {
        Some(FileKind::Delimited) => {
            let content = csv::read_file_as_utf8(path).map_err(SourceError::Read)?;
            let delimiter = csv::sniff_delimiter(&content);
            csv::records_from_str(&content, delimiter)
                .map(|rows| rows.into_iter().map(trim_all).collect())
                .map_err(|e| SourceError::Read(format!("{}: {}", path.display(), e)))
        }
        Some(FileKind::Workbook) => {
            match xlsx::read_named_sheet(path, sheet).map_err(SourceError::Read)? {
                SheetRead::Found(grid) => Ok(grid_to_strings(&grid)),
                SheetRead::Missing { available } => {
                    log::warn!(
                        "{}: no sheet \"{}\" (sheets: {})",
                        path.display(),
                        sheet,
                        available.join(", ")
                    );
                    Err(SourceError::SheetNotFound(sheet.to_string()))
                }
            }
        }
        None => Err(SourceError::Read(format!("{} is not a spreadsheet file", path.display()))),
    }
}

fn trim_all(row: Vec<String>) -> Vec<String> {
    row.into_iter().map(|v| v.trim().to_string()).collect()
}

fn grid_to_strings(grid: &RawGrid) -> Vec<Vec<String>> {
    grid.iter()
        .map(|row| row.iter().map(to_trimmed_string_or_empty).collect())
        .collect()
}

impl ReferenceSource for FileSource {
    fn describe(&self) -> String {
        match FileKind::of(&self.path) {
            Some(FileKind::Workbook) => format!("file:{}#{}", self.path.display(), self.sheet),
            _ => format!("file:{}", self.path.display()),
        }
    }

    fn header_row(&mut self) -> Result<Vec<String>, SourceError> {
        Ok(self.load()?.first().cloned().unwrap_or_default())
    }

    fn rows(&mut self, limit: usize) -> Result<Vec<ReferenceRow>, SourceError> {
        Ok(self
            .load()?
            .iter()
            .skip(1)
            .take(limit)
            .map(|values| ReferenceRow::new(values.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn stock_workbook(dir: &Path) -> PathBuf {
        let path = dir.join("stock.xlsx");
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.set_name("IN").unwrap();
        for (col, h) in ["ULI PO", "Customer", "Material No", "Brand", "INV-1"].iter().enumerate() {
            ws.write_string(0, col as u16, *h).unwrap();
        }
        ws.write_string(1, 0, "U-1").unwrap();
        ws.write_number(1, 2, 100665.0).unwrap();
        ws.write_string(1, 3, " Nike ").unwrap();
        ws.write_number(1, 4, 5.0).unwrap();
        ws.write_string(2, 0, "U-2").unwrap();
        wb.save(&path).unwrap();
        path
    }

    #[test]
    fn workbook_sheet_rows_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = FileSource::new(stock_workbook(dir.path()), "IN");
        assert_eq!(src.header_row().unwrap()[4], "INV-1");
        let rows = src.rows(100).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values, vec!["U-1", "", "100665", "Nike", "5"]);
        assert_eq!(src.rows(1).unwrap().len(), 1);
    }

    #[test]
    fn missing_sheet_is_sheet_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = FileSource::new(stock_workbook(dir.path()), "OUT");
        let err = src.header_row().unwrap_err();
        assert_eq!(err.to_string(), "Sheet named \"OUT\" not found");
    }

    #[test]
    fn csv_source_ignores_sheet_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "ULI PO,Material No\nU-1, M-1 \n").unwrap();
        let mut src = FileSource::new(&path, "IN");
        assert_eq!(src.header_row().unwrap(), vec!["ULI PO", "Material No"]);
        assert_eq!(src.rows(10).unwrap()[0].values, vec!["U-1", "M-1"]);
        assert_eq!(src.describe(), format!("file:{}", path.display()));
    }

    #[test]
    fn missing_file_is_read_error() {
        let mut src = FileSource::new("/nonexistent/stock.csv", "IN");
        assert!(matches!(src.header_row(), Err(SourceError::Read(_))));
    }
}
