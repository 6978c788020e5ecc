//! Threshold rules: validation and per-participant decisions.

use crate::models::{AggregateRecord, Decision, RejectReason, ThresholdConfig};
use anyhow::{bail, Result};
use tracing::warn;

/// Rule set actually enforced for a run, after validation against the
/// contests that were really fetched.
#[derive(Debug, Clone)]
pub struct EffectiveThresholds {
    pub config: ThresholdConfig,
    /// Contests whose individual rule was dropped because their fetch failed.
    pub suspended: Vec<String>,
}

/// Validate the configured rules against the fetched contest set.
///
/// A rule naming a contest that was neither fetched nor reported failed is a
/// configuration error and aborts the run: letting it through would silently
/// no-op the rule. A rule on a contest whose fetch failed is suspended with
/// a warning instead, so one bad source does not take the whole run down,
/// and absence-due-to-failure is never read as non-participation.
pub fn validate(
    config: &ThresholdConfig,
    fetched: &[String],
    failed: &[String],
) -> Result<EffectiveThresholds> {
    let mut rules = Vec::new();
    let mut suspended = Vec::new();

    for rule in &config.rules {
        if fetched.iter().any(|c| c == &rule.contest) {
            rules.push(rule.clone());
        } else if failed.iter().any(|c| c == &rule.contest) {
            if rule.min_solved.is_some() {
                warn!(
                    "⚠️  Individual threshold for {} suspended: contest fetch failed",
                    rule.contest
                );
                suspended.push(rule.contest.clone());
            }
        } else {
            bail!(
                "threshold rule references unknown contest {:?} (known contests: {:?})",
                rule.contest,
                fetched
            );
        }
    }

    Ok(EffectiveThresholds {
        config: ThresholdConfig {
            rules,
            global: config.global,
        },
        suspended,
    })
}

/// Decide one participant against the effective rule set.
///
/// Rules are checked in configuration order and the first violated
/// individual rule is the reported reason; the global threshold is only
/// consulted after every individual rule passed. Individual rules bind
/// entrants only: no entry for a contest means no violation of its rule.
pub fn decide(record: &AggregateRecord, config: &ThresholdConfig) -> Decision {
    for rule in &config.rules {
        let Some(min) = rule.min_solved else {
            continue;
        };
        if let Some(solved) = record.solved_in(&rule.contest) {
            if solved < min {
                return Decision::Reject(RejectReason::IndividualThresholdFailed {
                    contest: rule.contest.clone(),
                });
            }
        }
    }

    if record.total < config.global {
        return Decision::Reject(RejectReason::GlobalThresholdFailed);
    }

    Decision::Accept
}
