//! `stuffcheck-recon` - stuffing-sheet extraction and reconciliation engine.
//!
//! Pure engine crate: takes a raw grid or pre-loaded reference rows, returns
//! typed documents and per-item verdicts. No CLI, file or network IO.

pub mod classify;
pub mod coerce;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod fields;
pub mod matcher;
pub mod model;
pub mod source;

pub use config::ReconConfig;
pub use engine::{check_in, reconcile, run};
pub use error::{ReconError, SourceError};
pub use extract::{extract, extract_with_layout};
pub use model::{
    Cell, ItemRecord, MatchResult, MatchStatus, ParsedDocument, RawGrid, ReconciliationReport,
    ReferenceRow, ReferenceTable,
};
pub use source::{InMemorySource, ReferenceSource};
