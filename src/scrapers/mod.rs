//! Standings sources: where raw rows come from.
//!
//! A source either returns a contest's complete row set or fails the whole
//! contest; the pipeline never sees partial pages. Retrying, rate limiting
//! and pagination all live behind the trait.

pub mod codeforces;
pub mod csv_source;

use crate::config::ContestEntry;
use crate::models::RawRow;
use crate::pipeline::ContestFetch;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::join_all;

pub use codeforces::CodeforcesClient;
pub use csv_source::CsvStandingsSource;

#[async_trait]
pub trait StandingsSource: Send + Sync {
    /// Fetch a contest's complete raw standings, already retried and
    /// already merged across pagination.
    async fn fetch(&self, contest: &ContestEntry) -> Result<Vec<RawRow>>;
}

/// Fetch all configured contests concurrently, in configured order.
///
/// Per-contest failures are captured, not propagated: the caller decides
/// whether a failed contest aborts the run.
pub async fn fetch_all(
    source: &dyn StandingsSource,
    contests: &[ContestEntry],
) -> Vec<ContestFetch> {
    let futures = contests.iter().map(|entry| async move {
        let outcome = source
            .fetch(entry)
            .await
            .map_err(|e| format!("{:#}", e));
        (entry.name.clone(), outcome)
    });
    join_all(futures).await
}
