// CSV/TSV import

use std::path::Path;

use stuffcheck_recon::model::{Cell, RawGrid};

/// Read a delimited text file into a grid. Non-empty fields become text
/// cells; the delimiter is sniffed.
pub fn read_grid(path: &Path) -> Result<RawGrid, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    grid_from_str(&content, delimiter)
}

/// Parse delimited text into ragged rows of strings.
pub fn records_from_str(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, String> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut out = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        out.push(record.iter().map(str::to_string).collect());
    }
    Ok(out)
}

pub fn grid_from_str(content: &str, delimiter: u8) -> Result<RawGrid, String> {
    let records = records_from_str(content, delimiter)?;
    Ok(records
        .into_iter()
        .map(|fields| {
            fields
                .into_iter()
                .map(|f| if f.is_empty() { Cell::Empty } else { Cell::Text(f) })
                .collect()
        })
        .collect())
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                ::csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        // More consistent lines win; wider rows break ties.
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Excel-exported CSVs are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(decode_text(bytes))
}

pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}
