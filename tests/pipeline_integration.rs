//! End-to-end pipeline tests: CSV fixtures in, report artifacts out.

use standsync::config::{ContestEntry, ContestsFile};
use standsync::export;
use standsync::models::{ParticipantKey, RawRow, RejectReason, RowSkip};
use standsync::pipeline;
use standsync::scrapers::{self, CsvStandingsSource, StandingsSource};
use std::path::Path;

fn write_standings(dir: &Path, contest: &str, rows: &[(&str, &str)]) {
    let mut text = String::from("Handle,Solved_Problems,Total_Solved\n");
    for (handle, solved) in rows {
        text.push_str(&format!("{},,{}\n", handle, solved));
    }
    std::fs::write(dir.join(format!("{}_standings.csv", contest)), text).unwrap();
}

fn contests_fixture() -> ContestsFile {
    ContestsFile {
        contests: vec![
            ContestEntry {
                name: "C1".to_string(),
                url: String::new(),
                individual_threshold: Some(3),
            },
            ContestEntry {
                name: "C2".to_string(),
                url: String::new(),
                individual_threshold: None,
            },
        ],
    }
}

#[tokio::test]
async fn csv_rerun_produces_the_expected_roster() {
    let dir = tempfile::tempdir().unwrap();
    write_standings(dir.path(), "C1", &[("a", "5"), ("b", "2")]);
    write_standings(dir.path(), "C2", &[("a", "4"), ("c", "6")]);

    let contests = contests_fixture();
    let thresholds = contests.threshold_config(8);
    let source = CsvStandingsSource::new(dir.path());

    let fetches = scrapers::fetch_all(&source, &contests.contests).await;
    let (report, summary) = pipeline::run(fetches, &thresholds).unwrap();

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].key, ParticipantKey::new("a"));
    assert_eq!(report.accepted[0].total, 9);

    let reasons: Vec<(&str, &RejectReason)> = report
        .rejected
        .iter()
        .map(|(r, reason)| (r.key.as_str(), reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (
                "b",
                &RejectReason::IndividualThresholdFailed {
                    contest: "C1".to_string()
                }
            ),
            ("c", &RejectReason::GlobalThresholdFailed),
        ]
    );

    assert_eq!(summary.contests_fetched, vec!["C1", "C2"]);
    assert!(summary.failed_contests.is_empty());
}

#[tokio::test]
async fn handles_merge_across_contests_regardless_of_case() {
    let dir = tempfile::tempdir().unwrap();
    write_standings(dir.path(), "C1", &[("Alice", "5")]);
    write_standings(dir.path(), "C2", &[(" alice ", "4")]);

    let contests = contests_fixture();
    let thresholds = contests.threshold_config(8);
    let source = CsvStandingsSource::new(dir.path());

    let fetches = scrapers::fetch_all(&source, &contests.contests).await;
    let (report, _) = pipeline::run(fetches, &thresholds).unwrap();

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].key, ParticipantKey::new("alice"));
    assert_eq!(report.accepted[0].total, 9);
}

#[tokio::test]
async fn malformed_and_empty_rows_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_standings(
        dir.path(),
        "C1",
        &[("", "3"), ("alice", "5"), ("bob", "many")],
    );
    write_standings(dir.path(), "C2", &[("alice", "4")]);

    let contests = contests_fixture();
    let thresholds = contests.threshold_config(8);
    let source = CsvStandingsSource::new(dir.path());

    let fetches = scrapers::fetch_all(&source, &contests.contests).await;
    let (report, summary) = pipeline::run(fetches, &thresholds).unwrap();

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(summary.skip_count(), 2);
    assert!(summary
        .skipped_rows
        .iter()
        .any(|(c, s)| c == "C1" && matches!(s, RowSkip::EmptyHandle { .. })));
    assert!(summary
        .skipped_rows
        .iter()
        .any(|(c, s)| c == "C1" && matches!(s, RowSkip::MalformedRecord { .. })));
}

#[tokio::test]
async fn missing_contest_file_fails_that_contest_only() {
    let dir = tempfile::tempdir().unwrap();
    write_standings(dir.path(), "C2", &[("alice", "9")]);

    let contests = contests_fixture();
    let thresholds = contests.threshold_config(8);
    let source = CsvStandingsSource::new(dir.path());

    let fetches = scrapers::fetch_all(&source, &contests.contests).await;
    let (report, summary) = pipeline::run(fetches, &thresholds).unwrap();

    assert_eq!(summary.failed_contests.len(), 1);
    assert_eq!(summary.failed_contests[0].contest, "C1");
    // C1's individual rule is suspended, so alice is judged on C2 alone.
    assert_eq!(summary.suspended_rules, vec!["C1"]);
    assert_eq!(report.accepted.len(), 1);
}

#[tokio::test]
async fn rerun_from_raw_standings_keeps_rejected_participants() {
    let dir = tempfile::tempdir().unwrap();
    let contests = contests_fixture();
    let thresholds = contests.threshold_config(8);

    // First run, as if freshly fetched: persist the raw standings the way
    // the binary does before any filtering happens.
    let fetched: Vec<(&str, Vec<RawRow>)> = vec![
        (
            "C1",
            vec![RawRow::new("a", "5"), RawRow::new("b", "2")],
        ),
        (
            "C2",
            vec![RawRow::new("a", "4"), RawRow::new("c", "6")],
        ),
    ];
    for (name, rows) in &fetched {
        export::write_raw_standings(name, rows, dir.path()).unwrap();
    }

    let first: Vec<_> = fetched
        .into_iter()
        .map(|(name, rows)| (name.to_string(), Ok(rows)))
        .collect();
    let (first_report, _) = pipeline::run(first, &thresholds).unwrap();
    assert_eq!(first_report.rejected.len(), 2);

    // Also write the filtered report views: a re-run must not pick them up.
    export::write_per_contest(&first_report, dir.path()).unwrap();

    // Second run from the persisted files only.
    let source = CsvStandingsSource::new(dir.path());
    let fetches = scrapers::fetch_all(&source, &contests.contests).await;
    let (second_report, summary) = pipeline::run(fetches, &thresholds).unwrap();

    assert!(summary.failed_contests.is_empty());
    assert_eq!(second_report.accepted, first_report.accepted);
    assert_eq!(second_report.rejected, first_report.rejected);
    // b and c are still here to audit, with their reasons intact.
    let rejected_keys: Vec<&str> = second_report
        .rejected
        .iter()
        .map(|(r, _)| r.key.as_str())
        .collect();
    assert_eq!(rejected_keys, vec!["b", "c"]);
}

#[tokio::test]
async fn artifacts_are_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_standings(dir.path(), "C1", &[("zed", "4"), ("amy", "4"), ("bob", "9")]);
    write_standings(dir.path(), "C2", &[("amy", "4"), ("bob", "1")]);

    let contests = contests_fixture();
    let thresholds = contests.threshold_config(8);
    let source = CsvStandingsSource::new(dir.path());

    let mut outputs = Vec::new();
    for run in 0..2 {
        let fetches = scrapers::fetch_all(&source, &contests.contests).await;
        let (report, _) = pipeline::run(fetches, &thresholds).unwrap();

        let out = dir.path().join(format!("combined_{}.csv", run));
        export::write_combined(&report, &out).unwrap();
        outputs.push(std::fs::read_to_string(&out).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);

    // bob totals 10, amy 8, zed falls below the global threshold.
    let lines: Vec<&str> = outputs[0].lines().collect();
    assert!(lines[1].starts_with("bob,"));
    assert!(lines[2].starts_with("amy,"));
}
