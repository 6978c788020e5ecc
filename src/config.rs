//! Run configuration: environment variables plus the contests file.

use crate::models::{ContestRule, ThresholdConfig};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration, loaded once per run.
#[derive(Debug, Clone)]
pub struct Config {
    pub spreadsheet_id: String,
    pub sheet_names: Vec<String>,
    /// OAuth bearer token for the Sheets API, supplied by the environment.
    pub sheets_token: Option<String>,
    pub global_threshold: u32,
    pub run_scraper: bool,
    pub combined_csv: String,
    pub min_page_delay_ms: u64,
    pub max_page_delay_ms: u64,
    pub max_pages: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let spreadsheet_id = std::env::var("SPREADSHEET_ID").unwrap_or_default();

        let sheet_names = std::env::var("SHEET_NAMES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let sheets_token = std::env::var("GOOGLE_SHEETS_TOKEN").ok();

        let global_threshold = std::env::var("GLOBAL_THRESHOLD")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .unwrap_or(8);

        let run_scraper = std::env::var("RUN_SCRAPER")
            .unwrap_or_else(|_| "true".to_string())
            .to_lowercase()
            == "true";

        let combined_csv = std::env::var("COMBINED_CSV")
            .unwrap_or_else(|_| "combined_results.csv".to_string());

        let min_page_delay_ms = std::env::var("MIN_PAGE_DELAY_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .unwrap_or(1000);

        let max_page_delay_ms = std::env::var("MAX_PAGE_DELAY_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .unwrap_or(2000);

        let max_pages = std::env::var("MAX_PAGES")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);

        Ok(Self {
            spreadsheet_id,
            sheet_names,
            sheets_token,
            global_threshold,
            run_scraper,
            combined_csv,
            min_page_delay_ms,
            max_page_delay_ms,
            max_pages,
        })
    }

    /// Check the parts of the configuration that sheet sync depends on and
    /// hand back the bearer token, so callers cannot reach the Sheets API
    /// with an unvalidated (or empty) token. Report generation alone does
    /// not need a spreadsheet.
    pub fn validate_for_sheets(&self) -> Result<&str> {
        if self.spreadsheet_id.is_empty() {
            bail!("SPREADSHEET_ID not set");
        }
        if self.sheet_names.is_empty() {
            bail!("SHEET_NAMES not set");
        }
        match self.sheets_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => bail!("GOOGLE_SHEETS_TOKEN not set"),
        }
    }
}

/// One contest in the contests file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestEntry {
    pub name: String,
    pub url: String,
    /// Minimum solved count required from entrants of this contest.
    pub individual_threshold: Option<u32>,
}

/// The `contests.toml` file: ordered list of contests to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestsFile {
    #[serde(rename = "contest")]
    pub contests: Vec<ContestEntry>,
}

impl ContestsFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read contests file {}", path.display()))?;
        let file: ContestsFile = toml::from_str(&text)
            .with_context(|| format!("failed to parse contests file {}", path.display()))?;
        if file.contests.is_empty() {
            bail!("no contests configured in {}", path.display());
        }
        Ok(file)
    }

    pub fn contest_names(&self) -> Vec<String> {
        self.contests.iter().map(|c| c.name.clone()).collect()
    }

    /// Threshold rules in file order plus the global threshold from config.
    pub fn threshold_config(&self, global: u32) -> ThresholdConfig {
        ThresholdConfig {
            rules: self
                .contests
                .iter()
                .map(|c| ContestRule {
                    contest: c.name.clone(),
                    min_solved: c.individual_threshold,
                })
                .collect(),
            global,
        }
    }
}
