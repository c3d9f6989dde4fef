// Spreadsheet and reference-table I/O

pub mod csv;
pub mod remote;
pub mod source;
pub mod xlsx;

use std::path::Path;

use stuffcheck_recon::model::RawGrid;

pub use remote::HttpSource;
pub use source::FileSource;

/// Workbook formats calamine can open.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Workbook,
    Delimited,
}

impl FileKind {
    /// Classify by extension (case-insensitive). `None` means not a
    /// spreadsheet.
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Workbook)
        } else if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Delimited)
        } else {
            None
        }
    }
}

/// Read a stuffing sheet: the first worksheet of a workbook, or the whole of
/// a CSV/TSV file.
pub fn read_stuffing_sheet(path: &Path) -> Result<RawGrid, String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match FileKind::of(path) {
        Some(FileKind::Workbook) => xlsx::read_first_sheet(path),
        Some(FileKind::Delimited) => csv::read_grid(path),
        None => Err(format!("{} is not a spreadsheet file", name)),
    }
}
