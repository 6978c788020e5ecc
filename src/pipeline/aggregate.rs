//! Merge per-contest results into per-participant totals.

use crate::models::{AggregateRecord, ContestResult, ParticipantKey};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Result of the merge: the records plus any contest+key pairs whose data
/// had to be excluded because the same contest set the same key twice.
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub records: Vec<AggregateRecord>,
    pub conflicts: Vec<(String, ParticipantKey)>,
}

/// Merge N contest results into one record per distinct participant.
///
/// Totals are computed in a second pass after all contests are merged, so
/// the merge itself is a plain set union: any permutation of the input
/// contests produces the same record set. Output order is unspecified;
/// the report builder owns ordering.
///
/// A second entry for the same contest+key is unreachable while the
/// ContestResult invariant holds. Should one arrive anyway, that contest's
/// data for the key is dropped entirely (neither value can be trusted) and
/// the pair is reported as a conflict.
pub fn aggregate(results: &[ContestResult]) -> Aggregated {
    let mut records: BTreeMap<ParticipantKey, BTreeMap<String, u32>> = BTreeMap::new();
    let mut conflicted: BTreeSet<(String, ParticipantKey)> = BTreeSet::new();

    for contest in results {
        for (key, solved) in &contest.rows {
            if conflicted.contains(&(contest.name.clone(), key.clone())) {
                continue;
            }
            let per_contest = records.entry(key.clone()).or_default();
            if per_contest.remove(&contest.name).is_some() {
                warn!(
                    "duplicate entry for {} in {} reached aggregation, excluding both",
                    key, contest.name
                );
                conflicted.insert((contest.name.clone(), key.clone()));
                continue;
            }
            per_contest.insert(contest.name.clone(), *solved);
        }
    }

    let records = records
        .into_iter()
        .map(|(key, solved)| {
            let total = solved.values().sum();
            AggregateRecord { key, solved, total }
        })
        .collect();

    Aggregated {
        records,
        conflicts: conflicted.into_iter().collect(),
    }
}
