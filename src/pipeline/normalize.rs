//! Raw standings rows → validated [`ContestResult`].
//!
//! Per-row problems are collected, never thrown: a contest with a handful of
//! bad rows still participates in the run, and the skips show up in the
//! summary.

use crate::models::{ContestResult, ParticipantKey, RawRow, RowSkip};
use std::collections::HashMap;

/// Result of normalizing one contest: the validated rows plus everything
/// that had to be skipped along the way.
#[derive(Debug, Clone)]
pub struct NormalizedContest {
    pub result: ContestResult,
    pub skips: Vec<RowSkip>,
}

/// Normalize one contest's raw rows.
///
/// Rows with an empty handle or an unparsable solved count are skipped.
/// Two surviving rows that normalize to the same key are an identity
/// conflict: both are excluded and a `DuplicateParticipant` skip names the
/// key. Sources merge pagination re-lists on the raw handle before calling
/// this, so a collision here means two genuinely different raw handles
/// collapsed to one key.
pub fn normalize_contest(name: &str, rows: &[RawRow]) -> NormalizedContest {
    let mut skips = Vec::new();
    let mut parsed: Vec<(ParticipantKey, u32)> = Vec::with_capacity(rows.len());

    for row in rows {
        let key = ParticipantKey::new(&row.handle);
        if key.is_empty() {
            skips.push(RowSkip::EmptyHandle {
                raw_handle: row.handle.clone(),
            });
            continue;
        }

        let solved = match row.solved.trim().parse::<u32>() {
            Ok(n) => n,
            Err(_) => {
                skips.push(RowSkip::MalformedRecord {
                    handle: row.handle.clone(),
                    raw_solved: row.solved.clone(),
                });
                continue;
            }
        };

        parsed.push((key, solved));
    }

    let mut seen: HashMap<ParticipantKey, usize> = HashMap::new();
    for (key, _) in &parsed {
        *seen.entry(key.clone()).or_insert(0) += 1;
    }

    let mut reported: Vec<ParticipantKey> = Vec::new();
    let rows = parsed
        .into_iter()
        .filter(|(key, _)| {
            if seen[key] > 1 {
                if !reported.contains(key) {
                    reported.push(key.clone());
                    skips.push(RowSkip::DuplicateParticipant { key: key.clone() });
                }
                false
            } else {
                true
            }
        })
        .collect();

    NormalizedContest {
        result: ContestResult {
            name: name.to_string(),
            rows,
        },
        skips,
    }
}
