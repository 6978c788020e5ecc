//! standsync - multi-contest standings aggregation and roster sync.
//!
//! Fetches standings for every configured contest (or re-reads previously
//! exported CSVs), merges them per participant, applies individual and
//! global thresholds, writes the combined report, and cleans the tracking
//! spreadsheet down to the accepted roster.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use standsync::{
    config::{Config, ContestsFile},
    export,
    pipeline,
    scrapers::{self, CodeforcesClient, CsvStandingsSource, StandingsSource},
    sheets::SheetsClient,
};

#[derive(Debug, Parser)]
#[command(name = "standsync", about = "Aggregate contest standings and sync the roster sheet")]
struct Cli {
    /// Contests file (name, url, optional individual threshold per contest)
    #[arg(long, default_value = "contests.toml")]
    contests: PathBuf,

    /// Use previously exported standings CSVs instead of scraping
    #[arg(long)]
    skip_scrape: bool,

    /// Compute the report but do not touch the spreadsheet
    #[arg(long)]
    skip_sheets: bool,

    /// Treat any single contest source failure as fatal
    #[arg(long)]
    abort_on_failure: bool,

    /// Directory for CSV artifacts (and for CSV re-runs)
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "standsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_run_banner(contests: &ContestsFile, global_threshold: u32) {
    info!("{}", "=".repeat(60));
    info!("STANDINGS SYNC (Multi-Contest)");
    info!("{}", "=".repeat(60));
    info!("Number of contests: {}", contests.contests.len());
    for entry in &contests.contests {
        match entry.individual_threshold {
            Some(t) => info!("  - {} (Individual Threshold: {})", entry.name, t),
            None => info!("  - {} (No Individual Threshold)", entry.name),
        }
    }
    info!("Global Threshold: {}", global_threshold);
    info!("{}", "=".repeat(60));
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let contests = ContestsFile::load(&cli.contests)?;
    let thresholds = contests.threshold_config(config.global_threshold);

    print_run_banner(&contests, config.global_threshold);

    let scrape = config.run_scraper && !cli.skip_scrape;
    let source: Box<dyn StandingsSource> = if scrape {
        info!("STEP 1: SCRAPING ALL CONTESTS");
        Box::new(CodeforcesClient::new(&config))
    } else {
        info!("STEP 1: LOADING EXISTING CSVS");
        Box::new(CsvStandingsSource::new(&cli.out_dir))
    };

    let fetches = scrapers::fetch_all(source.as_ref(), &contests.contests).await;

    if scrape {
        // Persist the complete raw standings before any filtering, so
        // re-runs with --skip-scrape see the same data this run saw.
        std::fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;
        for (name, outcome) in &fetches {
            if let Ok(rows) = outcome {
                export::write_raw_standings(name, rows, &cli.out_dir)?;
            }
        }
    }

    if cli.abort_on_failure {
        if let Some((name, Err(error))) = fetches.iter().find(|(_, r)| r.is_err()) {
            bail!("contest {} failed and --abort-on-failure is set: {}", name, error);
        }
    }

    info!("STEP 2: AGGREGATING AND FILTERING");
    let (report, mut summary) = pipeline::run(fetches, &thresholds)?;

    info!("STEP 3: WRITING REPORTS");
    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;
    export::write_combined(&report, cli.out_dir.join(&config.combined_csv))?;
    export::write_per_contest(&report, &cli.out_dir)?;

    if cli.skip_sheets {
        info!("Skipping sheet sync (--skip-sheets)");
    } else {
        info!("STEP 4: CLEANING GOOGLE SHEETS");
        let token = config.validate_for_sheets()?;
        let client = SheetsClient::new(&config.spreadsheet_id, token);
        summary.sheet_rows_deleted = client.clean(&config.sheet_names, &report).await?;
        info!("✅ Total deleted: {} row(s)", summary.sheet_rows_deleted);
    }

    info!("{}", "=".repeat(60));
    info!("🎉 RUN COMPLETE");
    info!("{}", "=".repeat(60));
    info!(
        "Accepted: {} | Rejected: {} | Skipped rows: {}",
        summary.accepted,
        summary.rejected,
        summary.skip_count()
    );
    for failure in &summary.failed_contests {
        warn!("Contest skipped: {} ({})", failure.contest, failure.error);
    }
    for contest in &summary.suspended_rules {
        warn!("Individual threshold for {} was not enforced (contest failed)", contest);
    }
    info!("Check {} for full results.", config.combined_csv);

    Ok(())
}
