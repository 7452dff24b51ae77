//! FiveThirtyEight SPI projections feed.
//!
//! One CSV covering every league: per-match team strength ratings, win and
//! draw probabilities, projected and (for played matches) actual scores
//! with expected-goals breakdowns.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::info;

use crate::config;
use crate::reconcile::types::SpiMatch;
use crate::retry::{retry_async, RetryPolicy};

/// Raw CSV row; column names follow the feed.
#[derive(Debug, Deserialize)]
struct RawSpiRow {
    date: String,
    league: String,
    team1: String,
    team2: String,
    spi1: Option<f64>,
    spi2: Option<f64>,
    prob1: Option<f64>,
    prob2: Option<f64>,
    probtie: Option<f64>,
    proj_score1: Option<f64>,
    proj_score2: Option<f64>,
    importance1: Option<f64>,
    importance2: Option<f64>,
    score1: Option<u32>,
    score2: Option<u32>,
    xg1: Option<f64>,
    xg2: Option<f64>,
    nsxg1: Option<f64>,
    nsxg2: Option<f64>,
    adj_score1: Option<f64>,
    adj_score2: Option<f64>,
}

/// Client for the SPI projections feed.
pub struct SpiClient {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl SpiClient {
    pub fn new(http: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    /// Fetch and parse the full projections CSV.
    pub async fn fetch(&self) -> Result<Vec<SpiMatch>> {
        let url = config::SPI_MATCHES_URL;
        let body = retry_async(&self.retry, "SPI feed", || async {
            let response = self.http.get(url).send().await?.error_for_status()?;
            Ok(response.text().await?)
        })
        .await?;

        let records = parse_csv(&body)?;
        info!(rows = records.len(), "SPI feed fetched");
        Ok(records)
    }
}

/// Parse the projections CSV.
///
/// Every row must carry a valid ISO date; a date that does not parse means
/// the feed itself is malformed and the run should not continue on it.
pub fn parse_csv(text: &str) -> Result<Vec<SpiMatch>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<RawSpiRow>().enumerate() {
        let row = row.with_context(|| format!("SPI feed row {}", line + 2))?;
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("SPI feed row {}: bad date {:?}", line + 2, row.date))?;
        records.push(SpiMatch {
            date,
            league: row.league,
            home: row.team1.clone(),
            away: row.team2.clone(),
            home_source: row.team1,
            away_source: row.team2,
            spi_home: row.spi1,
            spi_away: row.spi2,
            prob_home: row.prob1,
            prob_away: row.prob2,
            prob_draw: row.probtie,
            proj_score_home: row.proj_score1,
            proj_score_away: row.proj_score2,
            importance_home: row.importance1,
            importance_away: row.importance2,
            score_home: row.score1,
            score_away: row.score2,
            xg_home: row.xg1,
            xg_away: row.xg2,
            nsxg_home: row.nsxg1,
            nsxg_away: row.nsxg2,
            adj_score_home: row.adj_score1,
            adj_score_away: row.adj_score2,
        });
    }
    Ok(records)
}

/// Keep only rows in leagues the odds feed covers, for matches already
/// played. Future fixtures carry projections but nothing to settle against.
pub fn filter_completed(
    records: Vec<SpiMatch>,
    leagues: &HashSet<String>,
    today: NaiveDate,
) -> Vec<SpiMatch> {
    records
        .into_iter()
        .filter(|r| r.date < today && leagues.contains(&r.league))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "season,date,league_id,league,team1,team2,spi1,spi2,prob1,prob2,probtie,proj_score1,proj_score2,importance1,importance2,score1,score2,xg1,xg2,nsxg1,nsxg2,adj_score1,adj_score2";

    #[test]
    fn test_parse_played_match() {
        let csv = format!(
            "{HEADER}\n2023,2024-03-10,2411,Barclays Premier League,Arsenal,Chelsea,88.2,74.1,0.58,0.18,0.24,2.1,0.9,45.2,30.1,2,1,2.3,0.7,1.9,1.1,2.2,0.9\n"
        );
        let records = parse_csv(&csv).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(r.home, "Arsenal");
        assert_eq!(r.away, "Chelsea");
        assert_eq!(r.prob_home, Some(0.58));
        assert_eq!(r.prob_draw, Some(0.24));
        assert_eq!(r.score_home, Some(2));
        assert_eq!(r.xg_away, Some(0.7));
    }

    #[test]
    fn test_parse_future_match_has_empty_scores() {
        let csv = format!(
            "{HEADER}\n2023,2030-01-01,2411,Barclays Premier League,Arsenal,Chelsea,88.2,74.1,0.58,0.18,0.24,2.1,0.9,,,,,,,,,,\n"
        );
        let records = parse_csv(&csv).unwrap();
        assert_eq!(records[0].score_home, None);
        assert_eq!(records[0].xg_home, None);
        assert_eq!(records[0].importance_home, None);
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let csv = format!(
            "{HEADER}\n2023,10/03/2024,2411,Barclays Premier League,Arsenal,Chelsea,,,,,,,,,,,,,,,,,\n"
        );
        let err = parse_csv(&csv).unwrap_err();
        assert!(format!("{err:#}").contains("bad date"));
    }

    #[test]
    fn test_filter_completed() {
        let csv = format!(
            "{HEADER}\n\
             2023,2024-03-10,2411,Barclays Premier League,Arsenal,Chelsea,,,,,,,,,,2,1,,,,,,\n\
             2023,2030-01-01,2411,Barclays Premier League,Arsenal,Chelsea,,,,,,,,,,,,,,,,,\n\
             2023,2024-03-10,1979,Chinese Super League,Team A,Team B,,,,,,,,,,1,1,,,,,,\n\
             2023,2024-03-10,0,Unlisted League,Team C,Team D,,,,,,,,,,0,0,,,,,,\n"
        );
        let records = parse_csv(&csv).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let filtered = filter_completed(records, &crate::config::spi_league_names(), today);
        // Future fixture and unlisted league drop out.
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.date < today));
    }
}
