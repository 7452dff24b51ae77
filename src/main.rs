//! SPI soccer betting backtest.
//!
//! Fetches FiveThirtyEight's SPI match projections and football-data.co.uk
//! historical odds, reconciles team identity across the two feeds, joins
//! them on (date, home, away), and reports the ROI of expected-value
//! betting rules against several published odds sources.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, info_span, warn};

use spi_backtest::config;
use spi_backtest::feeds::spi::filter_completed;
use spi_backtest::feeds::{FootballDataClient, RetrievalMode, SpiClient};
use spi_backtest::logging;
use spi_backtest::reconcile::{
    canonicalize_odds, canonicalize_spi, expand_all, expand_window, join_matches, JoinConfig,
    NameCanonicalizer, NameGroupingTable, NormalizeReport,
};
use spi_backtest::retry::RetryPolicy;
use spi_backtest::roi::{self, OddsSource, RoiSummary};

/// HTTP timeout for one feed request.
const HTTP_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before any config or logging initialization so cached
    // env lookups see the file's values.
    dotenvy::dotenv().ok();

    // Keep the guard alive so the non-blocking file writer flushes on exit.
    let _log_guard = logging::init_logging();
    let run_id = logging::get_run_id();

    let seasons = config::seasons_from_env();
    let mode = RetrievalMode::from_env();
    let names_path = config::names_file_from_env();

    let root_span = info_span!(
        "spi_backtest",
        run_id = %run_id,
        seasons = ?(seasons.first(), seasons.last()),
        retrieval_mode = ?mode,
    );
    let _enter = root_span.enter();

    info!("🚀 SPI betting backtest");
    info!(
        "   Seasons: {}..{} | retrieval: {:?} | names table: {}",
        seasons.first().copied().unwrap_or_default(),
        seasons.last().copied().unwrap_or_default(),
        mode,
        names_path.display()
    );

    // The grouping table is a hard requirement; without it every join key
    // would be provider-spelled and the match rate meaningless.
    let table = NameGroupingTable::load(&names_path)?;
    let canonicalizer = NameCanonicalizer::new(&table);
    info!(
        groups = table.group_count(),
        variants = canonicalizer.variant_count(),
        "name grouping table loaded"
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!("spi-backtest/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .context("building HTTP client")?;
    let retry = RetryPolicy::from_env();
    let spi_client = SpiClient::new(http.clone(), retry.clone());
    let odds_client = FootballDataClient::new(http, retry, config::fetch_concurrency());

    let (spi_result, odds_result) =
        tokio::join!(spi_client.fetch(), odds_client.fetch_all(&seasons, mode));
    let spi_raw = spi_result.context("projection feed retrieval")?;
    let (odds_raw, fetch_report) = odds_result.context("odds feed retrieval")?;

    if !fetch_report.failed.is_empty() {
        warn!(
            "   Missing odds fragments ({}): {}",
            fetch_report.failed.len(),
            fetch_report
                .failed
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    // Canonicalize every name-bearing field on both sides before anything
    // touches a join key.
    let (spi_normalized, spi_misses) = canonicalize_spi(spi_raw, &canonicalizer);
    let (odds_normalized, odds_misses) = canonicalize_odds(odds_raw, &canonicalizer);
    log_name_misses("projection feed", &spi_misses);
    log_name_misses("odds feed", &odds_misses);

    let today = Utc::now().date_naive();
    let spi_ready = filter_completed(spi_normalized, &config::spi_league_names(), today);
    info!(rows = spi_ready.len(), "projection rows after league/date filter");

    // Date tolerance applies to the odds side only; the projection feed's
    // dates are treated as ground truth.
    let odds_expanded = expand_window(&odds_normalized);

    let join_report = join_matches(&spi_ready, &odds_expanded, &JoinConfig::default());
    info!(
        matched = join_report.matched.len(),
        unmatched_projection = join_report.unmatched_spi.len(),
        unmatched_odds = join_report.unmatched_odds.len(),
        conflicts = join_report.conflicts.len(),
        "join complete ({:.1}% match rate)",
        join_report.match_rate() * 100.0
    );
    if !join_report.conflicts.is_empty() {
        let unresolved = join_report.conflicts.iter().filter(|c| !c.resolved).count();
        warn!(
            total = join_report.conflicts.len(),
            unresolved, "join cardinality conflicts recorded"
        );
    }

    let (oriented, skipped) = expand_all(&join_report.matched);
    if skipped > 0 {
        warn!(skipped, "joined matches without final scores were not oriented");
    }
    info!(rows = oriented.len(), "oriented table built");

    info!("📈 Outcome-line ROI (bet when model EV > 0)");
    for source in [OddsSource::Average, OddsSource::Bet365, OddsSource::BestAvailable] {
        report_roi(source, &roi::evaluate(&oriented, source));
    }

    info!("📈 Over/under 2.5 goals ROI");
    for source in [OddsSource::Average, OddsSource::Bet365, OddsSource::BestAvailable] {
        report_roi(source, &roi::evaluate_totals(&join_report.matched, source));
    }

    Ok(())
}

fn log_name_misses(feed: &str, report: &NormalizeReport) {
    if report.unknown.is_empty() {
        info!("   {feed}: all team names resolved");
        return;
    }
    let sample: Vec<&str> = report.unknown.keys().take(10).map(String::as_str).collect();
    warn!(
        distinct = report.distinct_unknown(),
        occurrences = report.total_unknown(),
        "   {feed}: unresolved team names (sample: {})",
        sample.join(", ")
    );
}

fn report_roi(source: OddsSource, summary: &RoiSummary) {
    match summary.roi() {
        Some(roi) => info!(
            "   {source} ROI = {:+.2}% ({} bets, {} won, {} rows excluded)",
            roi * 100.0,
            summary.bets_placed,
            summary.bets_won,
            summary.rows_skipped
        ),
        None => info!(
            "   {source} ROI = n/a (no bets placed, {} rows excluded)",
            summary.rows_skipped
        ),
    }
}
