use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Join key for one participant across contests.
///
/// Handles are matched case-insensitively and with surrounding whitespace
/// stripped: `"Alice"`, `" alice "` and `"ALICE"` are the same participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantKey(String);

impl ParticipantKey {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One standings row as handed over by a source, before normalization.
///
/// `solved` stays textual so that malformed counts from file-based sources
/// surface as per-row skips instead of aborting the load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    pub handle: String,
    pub solved: String,
}

impl RawRow {
    pub fn new(handle: impl Into<String>, solved: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            solved: solved.into(),
        }
    }
}

/// Normalized, validated standings of a single contest.
///
/// Invariant: no two rows share a key. Collisions are resolved during
/// normalization (both occurrences dropped with a diagnostic), so downstream
/// stages can rely on the rows being a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestResult {
    pub name: String,
    pub rows: Vec<(ParticipantKey, u32)>,
}

/// Merged per-participant view across all contests of one run.
///
/// An absent contest entry means the participant did not enter that contest,
/// which is not the same thing as having solved zero problems in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub key: ParticipantKey,
    pub solved: BTreeMap<String, u32>,
    pub total: u32,
}

impl AggregateRecord {
    pub fn solved_in(&self, contest: &str) -> Option<u32> {
        self.solved.get(contest).copied()
    }
}

/// One threshold rule: minimum solved count in a specific contest,
/// enforced only for participants who actually entered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestRule {
    pub contest: String,
    pub min_solved: Option<u32>,
}

/// Threshold configuration for one run. Rule order matters: when several
/// individual rules would reject the same participant, the first one listed
/// is the reported reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub rules: Vec<ContestRule>,
    pub global: u32,
}

/// Why a participant was rejected. At most one reason is ever reported,
/// individual rules taking precedence over the global threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    IndividualThresholdFailed { contest: String },
    GlobalThresholdFailed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::IndividualThresholdFailed { contest } => {
                write!(f, "below individual threshold for {}", contest)
            }
            RejectReason::GlobalThresholdFailed => write!(f, "below global threshold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Final output of the pipeline: accepted roster in its published order
/// plus the full rejected set for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Sorted by descending total, ties broken by ascending key.
    pub accepted: Vec<AggregateRecord>,
    pub rejected: Vec<(AggregateRecord, RejectReason)>,
    /// Contest column order for tabular output.
    pub contest_order: Vec<String>,
}

/// Per-row problem found while normalizing a contest. These never abort
/// anything; they are collected and surfaced in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowSkip {
    MalformedRecord { handle: String, raw_solved: String },
    EmptyHandle { raw_handle: String },
    DuplicateParticipant { key: ParticipantKey },
}

impl fmt::Display for RowSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSkip::MalformedRecord { handle, raw_solved } => {
                write!(
                    f,
                    "malformed solved count {:?} for handle {:?}",
                    raw_solved, handle
                )
            }
            RowSkip::EmptyHandle { raw_handle } => {
                write!(f, "handle {:?} is empty after normalization", raw_handle)
            }
            RowSkip::DuplicateParticipant { key } => {
                write!(f, "duplicate participant {} excluded", key)
            }
        }
    }
}

/// Terminal failure of one contest's source. The run keeps going; the
/// contest is simply absent from aggregation and its rule is suspended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestFailure {
    pub contest: String,
    pub error: String,
}

/// Accumulated diagnostics of a single run, built up stage by stage and
/// returned to the caller. Nothing in the pipeline writes to global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub contests_fetched: Vec<String>,
    pub failed_contests: Vec<ContestFailure>,
    pub rows_seen: usize,
    pub skipped_rows: Vec<(String, RowSkip)>,
    /// Individual rules that could not be enforced because their contest failed.
    pub suspended_rules: Vec<String>,
    pub accepted: usize,
    pub rejected: usize,
    pub sheet_rows_deleted: usize,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn record_contest(&mut self, name: &str, rows: usize) {
        self.contests_fetched.push(name.to_string());
        self.rows_seen += rows;
    }

    pub fn record_failure(&mut self, contest: &str, error: impl fmt::Display) {
        self.failed_contests.push(ContestFailure {
            contest: contest.to_string(),
            error: error.to_string(),
        });
    }

    pub fn record_skips(&mut self, contest: &str, skips: &[RowSkip]) {
        for skip in skips {
            self.skipped_rows.push((contest.to_string(), skip.clone()));
        }
    }

    pub fn skip_count(&self) -> usize {
        self.skipped_rows.len()
    }
}
