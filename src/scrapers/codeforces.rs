//! Codeforces standings client.
//!
//! Talks to the `contest.standings` API endpoint configured per contest in
//! `contests.toml`. Pages are fetched with jittered delays and merged on the
//! raw handle: the solved set of a handle listed on several pages is the
//! union across pages, matching the "latest snapshot wins, nothing is lost"
//! semantics of standings that shift while being paged through.

use crate::config::{Config, ContestEntry};
use crate::models::RawRow;
use crate::scrapers::StandingsSource;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

const PAGE_SIZE: u32 = 200;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Minimum spacing between requests, shared across concurrent contest fetches.
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn acquire(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            let wait = self.min_interval - elapsed;
            debug!("Rate limiting: waiting {}ms", wait.as_millis());
            sleep(wait).await;
        }
        self.last_request = Instant::now();
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    comment: Option<String>,
    result: Option<Standings>,
}

#[derive(Debug, Deserialize)]
struct Standings {
    rows: Vec<StandingsRow>,
}

#[derive(Debug, Deserialize)]
struct StandingsRow {
    party: Party,
    #[serde(rename = "problemResults")]
    problem_results: Vec<ProblemResult>,
}

#[derive(Debug, Deserialize)]
struct Party {
    members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct Member {
    handle: String,
}

#[derive(Debug, Deserialize)]
struct ProblemResult {
    points: f64,
}

pub struct CodeforcesClient {
    client: Client,
    rate_limiter: Mutex<RateLimiter>,
    min_page_delay_ms: u64,
    max_page_delay_ms: u64,
    max_pages: u32,
}

impl CodeforcesClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("standsync/0.1 (standings aggregator)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: Mutex::new(RateLimiter::new(Duration::from_millis(
                config.min_page_delay_ms,
            ))),
            min_page_delay_ms: config.min_page_delay_ms,
            max_page_delay_ms: config.max_page_delay_ms,
            max_pages: config.max_pages,
        }
    }

    async fn page_delay(&self) {
        let hi = self.max_page_delay_ms.max(self.min_page_delay_ms);
        let ms = rand::thread_rng().gen_range(self.min_page_delay_ms..=hi);
        sleep(Duration::from_millis(ms)).await;
    }

    async fn fetch_page(&self, url: &str, from: u32) -> Result<Vec<StandingsRow>> {
        self.rate_limiter.lock().await.acquire().await;

        let response = self
            .execute_with_retry(url, &[("from", from.to_string()), ("count", PAGE_SIZE.to_string())])
            .await?;

        let api: ApiResponse = response
            .json()
            .await
            .context("Failed to parse standings response")?;

        if api.status != "OK" {
            bail!(
                "standings API returned {}: {}",
                api.status,
                api.comment.unwrap_or_default()
            );
        }

        Ok(api.result.map(|r| r.rows).unwrap_or_default())
    }

    async fn execute_with_retry(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let mut backoff = INITIAL_BACKOFF_MS;

        for attempt in 0..MAX_RETRIES {
            let request = self.client.get(url).query(params);

            match timeout(Duration::from_secs(20), request.send()).await {
                Ok(Ok(response)) => {
                    if response.status().is_success() {
                        return Ok(response);
                    } else if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        warn!("Rate limited on attempt {}, backing off", attempt + 1);
                        sleep(Duration::from_secs(30)).await;
                    } else {
                        let status = response.status();
                        let text = response.text().await.unwrap_or_default();
                        bail!("standings API error {}: {}", status, text);
                    }
                }
                Ok(Err(e)) => {
                    warn!("Request failed (attempt {}): {}", attempt + 1, e);
                }
                Err(_) => {
                    warn!("Request timeout (attempt {})", attempt + 1);
                }
            }

            if attempt < MAX_RETRIES - 1 {
                debug!("Retrying in {}ms", backoff);
                sleep(Duration::from_millis(backoff)).await;
                backoff = (backoff * 2).min(30000);
            }
        }

        bail!("Max retries exceeded for {}", url)
    }
}

#[async_trait]
impl StandingsSource for CodeforcesClient {
    async fn fetch(&self, contest: &ContestEntry) -> Result<Vec<RawRow>> {
        info!("🔎 Scraping standings: {}", contest.name);

        // Raw handle → set of solved problem indices, unioned across pages.
        let mut solved_sets: HashMap<String, BTreeSet<usize>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut from = 1u32;

        for page in 1..=self.max_pages {
            let rows = self
                .fetch_page(&contest.url, from)
                .await
                .with_context(|| format!("page {} of {}", page, contest.name))?;

            if rows.is_empty() {
                break;
            }

            let mut any_new = false;
            for row in &rows {
                let Some(member) = row.party.members.first() else {
                    continue;
                };
                let handle = member.handle.clone();
                let solved: BTreeSet<usize> = row
                    .problem_results
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.points > 0.0)
                    .map(|(i, _)| i)
                    .collect();

                match solved_sets.get_mut(&handle) {
                    Some(existing) => {
                        let before = existing.len();
                        existing.extend(solved);
                        if existing.len() > before {
                            any_new = true;
                        }
                    }
                    None => {
                        solved_sets.insert(handle.clone(), solved);
                        order.push(handle);
                        any_new = true;
                    }
                }
            }

            debug!(
                "[PAGE {}] {} row(s), {} participant(s) so far",
                page,
                rows.len(),
                order.len()
            );

            if !any_new {
                debug!("No new data found, stopping pagination");
                break;
            }
            if (rows.len() as u32) < PAGE_SIZE {
                break;
            }

            from += PAGE_SIZE;
            self.page_delay().await;
        }

        info!(
            "✅ {}: fetched {} participant(s)",
            contest.name,
            order.len()
        );

        Ok(order
            .into_iter()
            .map(|handle| {
                let count = solved_sets[&handle].len();
                RawRow::new(handle, count.to_string())
            })
            .collect())
    }
}
