//! Google Sheets REST client.
//!
//! Thin wrapper over the Sheets v4 API: reads the grid, applies the clean
//! plan as `deleteDimension` requests, and restores borders and alignment on
//! the roster columns. The bearer token is supplied by the environment; this
//! client never runs an OAuth flow.

use crate::models::Report;
use crate::sheets::plan::{clean_plan, DEFAULT_HANDLE_COLUMN, DEFAULT_HEADER_ROWS};
use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;
const FORMAT_BATCH_SIZE: usize = 50;

pub struct SheetsClient {
    client: Client,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("standsync/0.1 (standings aggregator)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
        }
    }

    /// Map sheet title → numeric sheet id for the configured spreadsheet.
    pub async fn sheet_ids(&self) -> Result<HashMap<String, i64>> {
        let url = format!(
            "{}/{}?fields=sheets.properties",
            SHEETS_API_BASE, self.spreadsheet_id
        );
        let body = self.get_with_retry(&url).await?;

        let mut ids = HashMap::new();
        if let Some(sheets) = body.get("sheets").and_then(Value::as_array) {
            for sheet in sheets {
                let props = &sheet["properties"];
                if let (Some(title), Some(id)) = (
                    props["title"].as_str(),
                    props["sheetId"].as_i64(),
                ) {
                    ids.insert(title.to_string(), id);
                }
            }
        }
        Ok(ids)
    }

    /// Read a value range as a grid of strings. Trailing empty cells are
    /// absent from the API response, which the plan layer tolerates.
    pub async fn get_values(&self, sheet_name: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{}/{}/values/{}!{}",
            SHEETS_API_BASE, self.spreadsheet_id, sheet_name, range
        );
        let body = self.get_with_retry(&url).await?;

        let grid = body
            .get("values")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| {
                                cells
                                    .iter()
                                    .map(|c| c.as_str().unwrap_or_default().to_string())
                                    .collect()
                            })
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(grid)
    }

    /// Delete the given rows (0-indexed, must be descending) in one batch.
    pub async fn delete_rows(&self, sheet_id: i64, rows_desc: &[usize]) -> Result<()> {
        if rows_desc.is_empty() {
            return Ok(());
        }

        let requests: Vec<Value> = rows_desc
            .iter()
            .map(|row| {
                json!({
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row,
                            "endIndex": row + 1,
                        }
                    }
                })
            })
            .collect();

        self.batch_update(json!({ "requests": requests })).await?;
        // Give the API a moment before the next sheet is touched.
        sleep(Duration::from_secs(2)).await;
        Ok(())
    }

    /// Apply left alignment and solid borders to the name and handle columns,
    /// skipping empty cells, in batches the API accepts without complaint.
    pub async fn format_columns(&self, sheet_name: &str, sheet_id: i64) -> Result<usize> {
        let values = self.get_values(sheet_name, "B:C").await?;
        if values.is_empty() {
            return Ok(0);
        }

        let border = json!({ "style": "SOLID", "color": { "red": 0, "green": 0, "blue": 0 } });
        let mut requests = Vec::new();

        for (row_idx, row) in values.iter().enumerate() {
            for col_idx in 0..row.len().min(2) {
                if row[col_idx].trim().is_empty() {
                    continue;
                }
                requests.push(json!({
                    "updateCells": {
                        "range": {
                            "sheetId": sheet_id,
                            "startRowIndex": row_idx,
                            "endRowIndex": row_idx + 1,
                            "startColumnIndex": col_idx + 1,
                            "endColumnIndex": col_idx + 2,
                        },
                        "fields": "userEnteredFormat(horizontalAlignment,borders)",
                        "rows": [{
                            "values": [{
                                "userEnteredFormat": {
                                    "horizontalAlignment": "LEFT",
                                    "borders": {
                                        "left": border,
                                        "right": border,
                                        "top": border,
                                        "bottom": border,
                                    }
                                }
                            }]
                        }]
                    }
                }));
            }
        }

        let formatted = requests.len();
        for batch in requests.chunks(FORMAT_BATCH_SIZE) {
            self.batch_update(json!({ "requests": batch })).await?;
            sleep(Duration::from_secs(1)).await;
        }

        if formatted > 0 {
            info!("  ✅ Formatted {} cell(s) in '{}'", formatted, sheet_name);
        }
        Ok(formatted)
    }

    /// Clean every configured sheet against the accepted roster and restore
    /// formatting. Returns the total number of deleted rows.
    pub async fn clean(&self, sheet_names: &[String], report: &Report) -> Result<usize> {
        let ids = self.sheet_ids().await?;
        let mut total_deleted = 0;

        for sheet_name in sheet_names {
            let Some(&sheet_id) = ids.get(sheet_name) else {
                warn!("⚠️  Sheet '{}' not found, skipping", sheet_name);
                continue;
            };

            let grid = self.get_values(sheet_name, "A:D").await?;
            if grid.len() <= DEFAULT_HEADER_ROWS {
                warn!("⚠️  '{}': no data rows", sheet_name);
                continue;
            }

            let plan = clean_plan(&grid, report, DEFAULT_HEADER_ROWS, DEFAULT_HANDLE_COLUMN);
            if plan.is_empty() {
                info!("✅ No rows to delete in '{}'", sheet_name);
                continue;
            }

            self.delete_rows(sheet_id, &plan.delete_rows).await?;
            info!(
                "✅ Deleted {} row(s) from '{}'",
                plan.delete_rows.len(),
                sheet_name
            );
            total_deleted += plan.delete_rows.len();
        }

        for sheet_name in sheet_names {
            if let Some(&sheet_id) = ids.get(sheet_name) {
                info!("📋 Formatting '{}'...", sheet_name);
                self.format_columns(sheet_name, sheet_id).await?;
            }
        }

        Ok(total_deleted)
    }

    async fn get_with_retry(&self, url: &str) -> Result<Value> {
        let response = self.execute_with_retry(|| self.client.get(url)).await?;
        response
            .json()
            .await
            .context("Failed to parse Sheets API response")
    }

    async fn batch_update(&self, body: Value) -> Result<()> {
        let url = format!(
            "{}/{}:batchUpdate",
            SHEETS_API_BASE, self.spreadsheet_id
        );
        self.execute_with_retry(|| self.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn execute_with_retry<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut backoff = INITIAL_BACKOFF_MS;

        for attempt in 0..MAX_RETRIES {
            let request = build().bearer_auth(&self.token);

            match timeout(Duration::from_secs(20), request.send()).await {
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    } else if status == StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error()
                    {
                        warn!(
                            "Sheets API {} on attempt {}, backing off",
                            status,
                            attempt + 1
                        );
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        bail!("Sheets API error {}: {}", status, text);
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

        bail!("Max retries exceeded for Sheets API")
    }
}
