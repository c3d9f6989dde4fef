use serde::Serialize;

use crate::model::{MatchResult, MatchStatus};

/// Per-status item counts of one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub mismatch: usize,
    pub missing: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.ok + self.mismatch + self.missing
    }

    /// Human-readable summary: `"{ok} ok, {mismatch} mismatch, {missing} missing"`.
    pub fn summary_line(&self) -> String {
        format!("{} ok, {} mismatch, {} missing", self.ok, self.mismatch, self.missing)
    }
}

/// Count results by status.
pub fn compute_counts(results: &[MatchResult]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for r in results {
        match r.status {
            MatchStatus::Ok => counts.ok += 1,
            MatchStatus::Mismatch => counts.mismatch += 1,
            MatchStatus::Missing => counts.missing += 1,
        }
    }
    counts
}
