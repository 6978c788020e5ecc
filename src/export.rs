//! CSV artifacts: raw per-contest standings, the combined report, and
//! per-contest report views.

use crate::models::{RawRow, Report};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row<W: Write>(w: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    writeln!(w, "{}", line.join(","))
}

/// Persist one contest's raw standings as fetched, before any filtering.
///
/// This is what `CsvStandingsSource` re-runs consume: the complete row set,
/// so thresholds can be re-applied (or relaxed) later without re-scraping.
/// The filtered per-contest report views live under a different name.
pub fn write_raw_standings(
    contest: &str,
    rows: &[RawRow],
    out_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let path = out_dir
        .as_ref()
        .join(format!("{}_standings.csv", contest));
    let file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    write_row(
        &mut w,
        &[
            "Handle".to_string(),
            "Solved_Problems".to_string(),
            "Total_Solved".to_string(),
        ],
    )?;
    for row in rows {
        write_row(
            &mut w,
            &[row.handle.clone(), String::new(), row.solved.clone()],
        )?;
    }

    w.flush()?;
    info!(
        "✅ Saved {} raw row(s) to {}",
        rows.len(),
        path.display()
    );
    Ok(path)
}

/// Write the combined report: one row per accepted participant, one column
/// per contest in configured order, total last. A contest the participant
/// did not enter renders as an empty cell, not as 0.
pub fn write_combined(report: &Report, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    let mut header = vec!["Handle".to_string()];
    for contest in &report.contest_order {
        header.push(format!("{}_Solved", contest));
    }
    header.push("Total_All_Contests".to_string());
    write_row(&mut w, &header)?;

    for record in &report.accepted {
        let mut row = vec![record.key.as_str().to_string()];
        for contest in &report.contest_order {
            row.push(
                record
                    .solved_in(contest)
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            );
        }
        row.push(record.total.to_string());
        write_row(&mut w, &row)?;
    }

    w.flush()?;
    info!(
        "✅ Wrote combined results for {} participant(s) to {}",
        report.accepted.len(),
        path.display()
    );
    Ok(())
}

/// Write one report file per contest, filtered to accepted entrants of
/// that contest, in report order. Returns the paths written. Distinct from
/// the raw `_standings.csv` files so re-runs never read filtered data.
pub fn write_per_contest(report: &Report, out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    let mut written = Vec::new();

    for contest in &report.contest_order {
        let path = out_dir.join(format!("{}_report.csv", contest));
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut w = BufWriter::new(file);

        write_row(
            &mut w,
            &["Handle".to_string(), "Total_Solved".to_string()],
        )?;
        for record in report.per_contest(contest) {
            let solved = record.solved_in(contest).unwrap_or(0);
            write_row(
                &mut w,
                &[record.key.as_str().to_string(), solved.to_string()],
            )?;
        }

        w.flush()?;
        written.push(path);
    }

    info!("✅ Wrote {} per-contest file(s)", written.len());
    Ok(written)
}
