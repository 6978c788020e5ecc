//! File-based standings source for re-runs on previously exported data.
//!
//! Reads `<contest>_standings.csv` as written by a prior run (or by hand).
//! Fields are handed through as raw text; a malformed solved count is the
//! normalizer's problem, not a load failure. A missing file fails the
//! contest.

use crate::config::ContestEntry;
use crate::models::RawRow;
use crate::scrapers::StandingsSource;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CsvStandingsSource {
    dir: PathBuf,
}

impl CsvStandingsSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn standings_path(&self, contest: &str) -> PathBuf {
        self.dir.join(format!("{}_standings.csv", contest))
    }
}

/// Split one CSV line, honoring double-quoted fields with `""` escapes.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

#[async_trait]
impl StandingsSource for CsvStandingsSource {
    async fn fetch(&self, contest: &ContestEntry) -> Result<Vec<RawRow>> {
        let path = self.standings_path(&contest.name);
        if !path.exists() {
            bail!(
                "{} not found; run with scraping enabled first",
                path.display()
            );
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut lines = text.lines();
        let header = match lines.next() {
            Some(h) => split_line(h),
            None => bail!("{} is empty", path.display()),
        };

        let handle_col = header
            .iter()
            .position(|h| h.trim() == "Handle")
            .with_context(|| format!("{} has no Handle column", path.display()))?;
        let solved_col = header
            .iter()
            .position(|h| h.trim() == "Total_Solved")
            .with_context(|| format!("{} has no Total_Solved column", path.display()))?;

        let mut rows = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_line(line);
            let handle = fields.get(handle_col).cloned().unwrap_or_default();
            let solved = fields.get(solved_col).cloned().unwrap_or_default();
            rows.push(RawRow::new(handle, solved));
        }

        info!(
            "📂 Loaded {} row(s) from {}",
            rows.len(),
            path.display()
        );
        Ok(rows)
    }
}
