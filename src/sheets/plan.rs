//! Pure diff between the current sheet grid and the accepted roster.

use crate::models::{ParticipantKey, Report};
use std::collections::HashSet;

/// Sheets carry three header rows before the first participant row.
pub const DEFAULT_HEADER_ROWS: usize = 3;
/// Participant handles live in column C.
pub const DEFAULT_HANDLE_COLUMN: usize = 2;

/// Row deletions to bring one sheet in line with the accepted roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPlan {
    /// 0-indexed rows to delete, in DESCENDING order so that applying them
    /// one at a time never shifts a row still waiting to be deleted.
    pub delete_rows: Vec<usize>,
}

impl CleanPlan {
    pub fn is_empty(&self) -> bool {
        self.delete_rows.is_empty()
    }
}

/// Compute the deletions for one sheet.
///
/// A data row is deleted when its handle cell, normalized, is not in the
/// accepted set: rejected participants and handles unknown to every contest
/// both go. Header rows and rows with an empty handle cell are left alone.
/// Pure and deterministic, so re-running on an already-clean sheet yields an
/// empty plan.
pub fn clean_plan(
    grid: &[Vec<String>],
    report: &Report,
    header_rows: usize,
    handle_column: usize,
) -> CleanPlan {
    let accepted: HashSet<&ParticipantKey> = report.accepted.iter().map(|r| &r.key).collect();

    let mut delete_rows = Vec::new();
    for (row_idx, row) in grid.iter().enumerate().skip(header_rows) {
        let Some(cell) = row.get(handle_column) else {
            continue;
        };
        let key = ParticipantKey::new(cell);
        if key.is_empty() {
            continue;
        }
        if !accepted.contains(&key) {
            delete_rows.push(row_idx);
        }
    }

    delete_rows.sort_unstable_by(|a, b| b.cmp(a));
    CleanPlan { delete_rows }
}
