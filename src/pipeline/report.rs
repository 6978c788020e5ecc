//! Partition decided records into the final report views.

use crate::models::{AggregateRecord, Decision, Report};

/// Build the report from records and their decisions, paired by position.
///
/// Accepted records are sorted by descending total, ties broken by ascending
/// key, so repeated runs over the same inputs publish byte-identical output.
/// The rejected set keeps every record with its reason for auditing.
pub fn build(
    records: Vec<AggregateRecord>,
    decisions: Vec<Decision>,
    contest_order: Vec<String>,
) -> Report {
    debug_assert_eq!(records.len(), decisions.len());

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (record, decision) in records.into_iter().zip(decisions) {
        match decision {
            Decision::Accept => accepted.push(record),
            Decision::Reject(reason) => rejected.push((record, reason)),
        }
    }

    accepted.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    rejected.sort_by(|a, b| a.0.key.cmp(&b.0.key));

    Report {
        accepted,
        rejected,
        contest_order,
    }
}

impl Report {
    /// Accepted participants who entered the given contest, in report order.
    pub fn per_contest(&self, contest: &str) -> Vec<&AggregateRecord> {
        self.accepted
            .iter()
            .filter(|r| r.solved_in(contest).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticipantKey, RejectReason};
    use std::collections::BTreeMap;

    fn record(key: &str, entries: &[(&str, u32)]) -> AggregateRecord {
        let solved: BTreeMap<String, u32> = entries
            .iter()
            .map(|(c, n)| (c.to_string(), *n))
            .collect();
        let total = solved.values().sum();
        AggregateRecord {
            key: ParticipantKey::new(key),
            solved,
            total,
        }
    }

    #[test]
    fn sorts_accepted_by_total_then_key() {
        let records = vec![
            record("zed", &[("C1", 5)]),
            record("amy", &[("C1", 5)]),
            record("bob", &[("C1", 9)]),
        ];
        let decisions = vec![Decision::Accept; 3];
        let report = build(records, decisions, vec!["C1".to_string()]);

        let order: Vec<&str> = report.accepted.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(order, vec!["bob", "amy", "zed"]);
    }

    #[test]
    fn partitions_rejections_with_reasons() {
        let records = vec![record("a", &[("C1", 5)]), record("b", &[("C1", 1)])];
        let decisions = vec![
            Decision::Accept,
            Decision::Reject(RejectReason::GlobalThresholdFailed),
        ];
        let report = build(records, decisions, vec!["C1".to_string()]);

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0.key, ParticipantKey::new("b"));
        assert_eq!(report.rejected[0].1, RejectReason::GlobalThresholdFailed);
    }

    #[test]
    fn per_contest_view_keeps_entrants_only() {
        let records = vec![
            record("a", &[("C1", 5), ("C2", 4)]),
            record("c", &[("C2", 6)]),
        ];
        let decisions = vec![Decision::Accept; 2];
        let report = build(
            records,
            decisions,
            vec!["C1".to_string(), "C2".to_string()],
        );

        let c1: Vec<&str> = report
            .per_contest("C1")
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(c1, vec!["a"]);

        let c2: Vec<&str> = report
            .per_contest("C2")
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(c2, vec!["a", "c"]);
    }
}
