//! Human-readable rendering of extraction and check results.
//!
//! Lines carry a visual class so a terminal (or any other front end) can
//! colour them without re-deriving status.

use serde::Serialize;
use stuffcheck_recon::{MatchStatus, ParsedDocument, ReconciliationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineClass {
    Info,
    Success,
    Warn,
    Fail,
}

impl LineClass {
    pub fn for_status(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Ok => Self::Success,
            MatchStatus::Missing => Self::Warn,
            MatchStatus::Mismatch => Self::Fail,
        }
    }

    /// Short tag used as a line prefix on plain terminals.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Info => "    ",
            Self::Success => "  ok",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderLine {
    pub class: LineClass,
    pub text: String,
}

impl RenderLine {
    fn new(class: LineClass, text: impl Into<String>) -> Self {
        Self { class, text: text.into() }
    }
}

fn or_empty(value: &str) -> &str {
    if value.is_empty() {
        "(empty)"
    } else {
        value
    }
}

/// One-file summary printed after extraction.
pub fn parsed_summary(file: &str, doc: &ParsedDocument) -> Vec<RenderLine> {
    vec![
        RenderLine::new(LineClass::Info, file),
        RenderLine::new(
            LineClass::Info,
            format!(
                "Invoice: {} — Brand/TO: {} — Container: {}",
                or_empty(&doc.invoice_title),
                or_empty(&doc.brand_to),
                or_empty(&doc.container)
            ),
        ),
        RenderLine::new(LineClass::Info, format!("Items found: {}", doc.items.len())),
    ]
}

pub fn render_report(file: &str, report: &ReconciliationReport) -> Vec<RenderLine> {
    let state = if report.invoice_found { "found" } else { "not found" };
    let mut lines = vec![RenderLine::new(LineClass::Info, format!("{file} — invoice: {state}"))];

    if !report.invoice_found {
        lines.push(RenderLine::new(LineClass::Fail, "Invoice not found in the reference sheet"));
        return lines;
    }

    lines.push(RenderLine::new(LineClass::Info, format!("Summary: {}", report.summary)));
    for item in &report.items {
        let mut text = format!("Row {}: {} — {}", item.row_index, item.material_no, item.status);
        if !item.message.is_empty() {
            text.push_str(" — ");
            text.push_str(&item.message);
        }
        lines.push(RenderLine::new(LineClass::for_status(item.status), text));
    }
    lines
}

/// Plain-text form: `<tag> <text>` per line.
pub fn to_text(lines: &[RenderLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} {}", l.class.tag(), l.text))
        .collect::<Vec<_>>()
        .join("\n")
}
