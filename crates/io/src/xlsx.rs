// Excel import (xlsx, xls, xlsb, ods) via calamine

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use stuffcheck_recon::model::{Cell, RawGrid};

/// Outcome of reading one named sheet.
#[derive(Debug)]
pub enum SheetRead {
    Found(RawGrid),
    /// The workbook opened but has no sheet by that name.
    Missing { available: Vec<String> },
}

/// Read the first worksheet of a workbook file.
pub fn read_first_sheet(path: &Path) -> Result<RawGrid, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;
    first_sheet(&mut workbook)
}

/// Read the first worksheet of a workbook held in memory (an uploaded body).
pub fn read_first_sheet_from_bytes(bytes: Vec<u8>) -> Result<RawGrid, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open Excel data: {}", e))?;
    first_sheet(&mut workbook)
}

/// Read the sheet called `name` (exact, case-sensitive).
pub fn read_named_sheet(path: &Path, name: &str) -> Result<SheetRead, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;
    let available: Vec<String> = workbook.sheet_names().to_vec();
    if !available.iter().any(|s| s == name) {
        return Ok(SheetRead::Missing { available });
    }
    let range = workbook
        .worksheet_range(name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", name, e))?;
    Ok(SheetRead::Found(range_to_grid(&range)))
}

fn first_sheet<RS: std::io::Read + std::io::Seek>(
    workbook: &mut Sheets<RS>,
) -> Result<RawGrid, String> {
    let names = workbook.sheet_names().to_vec();
    let Some(first) = names.first() else {
        return Err("Excel file contains no sheets".to_string());
    };
    let range = workbook
        .worksheet_range(first)
        .map_err(|e| format!("Failed to read sheet '{}': {}", first, e))?;
    log::debug!("reading first sheet '{}' ({} x {})", first, range.height(), range.width());
    Ok(range_to_grid(&range))
}

/// Convert a calamine range into an A1-anchored grid.
///
/// The range may start below or right of A1; leading rows and columns are
/// padded with empty cells so grid positions equal sheet positions.
/// Trailing empty cells are dropped from each row.
pub fn range_to_grid(range: &Range<Data>) -> RawGrid {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid: RawGrid = vec![Vec::new(); start_row as usize];

    for row in range.rows() {
        let mut cells: Vec<Cell> = Vec::with_capacity(start_col as usize + row.len());
        cells.resize(start_col as usize, Cell::Empty);
        cells.extend(row.iter().map(cell_from_data));
        while matches!(cells.last(), Some(Cell::Empty)) {
            cells.pop();
        }
        grid.push(cells);
    }

    grid
}

pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        // Dates keep their serial number.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
