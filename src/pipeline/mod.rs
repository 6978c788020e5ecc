//! The aggregation-and-threshold-filtering core.
//!
//! Pure, synchronous transform over already-fetched standings: normalize
//! each contest, merge into per-participant records, apply thresholds,
//! build the report. Sources and the sheet client live elsewhere and are
//! the only components that touch the network.

pub mod aggregate;
pub mod filter;
pub mod normalize;
pub mod report;

use crate::models::{Decision, RawRow, Report, RunSummary, ThresholdConfig};
use anyhow::Result;
use tracing::{info, warn};

/// The per-contest input to a run: the contest name and either its complete
/// raw row set or the terminal error its source reported.
pub type ContestFetch = (String, std::result::Result<Vec<RawRow>, String>);

/// Run the whole core over fetched standings.
///
/// Failed contests are dropped from aggregation and their rules suspended;
/// the run aborts only on a configuration error (a rule naming a contest
/// that does not exist). Always returns a best-effort report over whatever
/// contests succeeded, plus the summary of everything that was skipped.
pub fn run(fetches: Vec<ContestFetch>, thresholds: &ThresholdConfig) -> Result<(Report, RunSummary)> {
    let mut summary = RunSummary::default();
    let mut results = Vec::new();
    let mut contest_order = Vec::new();

    for (name, outcome) in fetches {
        match outcome {
            Ok(rows) => {
                let normalized = normalize::normalize_contest(&name, &rows);
                if !normalized.skips.is_empty() {
                    warn!(
                        "⚠️  {}: skipped {} row(s)",
                        name,
                        normalized.skips.len()
                    );
                }
                summary.record_contest(&name, rows.len());
                summary.record_skips(&name, &normalized.skips);
                contest_order.push(name);
                results.push(normalized.result);
            }
            Err(error) => {
                warn!("❌ {}: source failed: {}", name, error);
                summary.record_failure(&name, error);
            }
        }
    }

    let fetched: Vec<String> = results.iter().map(|c| c.name.clone()).collect();
    let failed: Vec<String> = summary
        .failed_contests
        .iter()
        .map(|f| f.contest.clone())
        .collect();

    let effective = filter::validate(thresholds, &fetched, &failed)?;
    summary.suspended_rules = effective.suspended.clone();

    let aggregated = aggregate::aggregate(&results);
    for (contest, key) in aggregated.conflicts {
        summary
            .skipped_rows
            .push((contest, crate::models::RowSkip::DuplicateParticipant { key }));
    }
    let records = aggregated.records;
    let decisions: Vec<Decision> = records
        .iter()
        .map(|r| filter::decide(r, &effective.config))
        .collect();

    let report = report::build(records, decisions, contest_order);
    summary.accepted = report.accepted.len();
    summary.rejected = report.rejected.len();
    summary.finished_at = Some(chrono::Utc::now());

    info!(
        "✅ {} accepted, {} rejected, {} row(s) skipped",
        summary.accepted,
        summary.rejected,
        summary.skip_count()
    );

    Ok((report, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContestRule, ParticipantKey, RejectReason};

    fn rows(data: &[(&str, &str)]) -> Vec<RawRow> {
        data.iter().map(|(h, s)| RawRow::new(*h, *s)).collect()
    }

    fn thresholds(rules: &[(&str, Option<u32>)], global: u32) -> ThresholdConfig {
        ThresholdConfig {
            rules: rules
                .iter()
                .map(|(c, m)| ContestRule {
                    contest: c.to_string(),
                    min_solved: *m,
                })
                .collect(),
            global,
        }
    }

    #[test]
    fn end_to_end_thresholds() {
        let fetches = vec![
            ("C1".to_string(), Ok(rows(&[("a", "5"), ("b", "2")]))),
            ("C2".to_string(), Ok(rows(&[("a", "4"), ("c", "6")]))),
        ];
        let cfg = thresholds(&[("C1", Some(3)), ("C2", None)], 8);

        let (report, summary) = run(fetches, &cfg).unwrap();

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].key, ParticipantKey::new("a"));
        assert_eq!(report.accepted[0].total, 9);

        let b = report
            .rejected
            .iter()
            .find(|(r, _)| r.key == ParticipantKey::new("b"))
            .unwrap();
        assert_eq!(
            b.1,
            RejectReason::IndividualThresholdFailed {
                contest: "C1".to_string()
            }
        );

        // c never entered C1, so its rule does not apply; the total falls short.
        let c = report
            .rejected
            .iter()
            .find(|(r, _)| r.key == ParticipantKey::new("c"))
            .unwrap();
        assert_eq!(c.1, RejectReason::GlobalThresholdFailed);

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.rejected, 2);
    }

    #[test]
    fn malformed_rows_do_not_abort_the_run() {
        let fetches = vec![(
            "C1".to_string(),
            Ok(rows(&[("", "3"), ("alice", "5")])),
        )];
        let cfg = thresholds(&[("C1", None)], 1);

        let (report, summary) = run(fetches, &cfg).unwrap();
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(summary.skip_count(), 1);
    }

    #[test]
    fn failed_contest_suspends_its_rule() {
        let fetches = vec![
            ("C1".to_string(), Ok(rows(&[("a", "5")]))),
            ("C2".to_string(), Err("access denied".to_string())),
        ];
        let cfg = thresholds(&[("C1", None), ("C2", Some(3))], 4);

        let (report, summary) = run(fetches, &cfg).unwrap();
        assert_eq!(summary.failed_contests.len(), 1);
        assert_eq!(summary.suspended_rules, vec!["C2".to_string()]);
        // a is judged on C1 alone, not rejected through C2's rule.
        assert_eq!(report.accepted.len(), 1);
    }

    #[test]
    fn unknown_rule_contest_is_fatal() {
        let fetches = vec![("C1".to_string(), Ok(rows(&[("a", "5")])))];
        let cfg = thresholds(&[("Ghost", Some(1))], 0);
        assert!(run(fetches, &cfg).is_err());
    }

    #[test]
    fn contest_input_order_does_not_change_the_report() {
        let c1 = ("C1".to_string(), Ok(rows(&[("a", "5"), ("b", "2")])));
        let c2 = ("C2".to_string(), Ok(rows(&[("a", "4"), ("c", "6")])));
        let cfg = thresholds(&[("C1", Some(3)), ("C2", None)], 8);

        let (forward, _) = run(vec![c1.clone(), c2.clone()], &cfg).unwrap();
        let (backward, _) = run(vec![c2, c1], &cfg).unwrap();

        assert_eq!(forward.accepted, backward.accepted);
        assert_eq!(forward.rejected, backward.rejected);
    }
}
