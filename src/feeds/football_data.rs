//! football-data.co.uk historical odds feed.
//!
//! Main leagues ship one file per season; secondary leagues ship one file
//! covering all seasons under a different column naming (Home/Away/HG/AG
//! instead of HomeTeam/AwayTeam/FTHG/FTAG). Files are latin-1 encoded,
//! dates appear in two day/month/year formats depending on the year, and
//! row sets are ragged. All of that is absorbed here so the reconcile
//! pipeline only ever sees clean records.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use tracing::{info, warn};

use super::{FetchReport, FragmentId, RetrievalMode};
use crate::config;
use crate::reconcile::types::{OddsBoard, OddsMatch};
use crate::retry::{retry_async, RetryPolicy};

/// Client for the odds feed.
pub struct FootballDataClient {
    http: reqwest::Client,
    retry: RetryPolicy,
    concurrency: usize,
}

struct Fragment {
    id: FragmentId,
    url: String,
}

impl FootballDataClient {
    pub fn new(http: reqwest::Client, retry: RetryPolicy, concurrency: usize) -> Self {
        Self {
            http,
            retry,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch every (league, season) file plus every secondary-league file
    /// concurrently and concatenate the fragments.
    ///
    /// Under [`RetrievalMode::FailFast`] the first failed fragment aborts
    /// the retrieval; under [`RetrievalMode::PartialSuccess`] failures are
    /// collected in the report and the rest of the data is used.
    pub async fn fetch_all(
        &self,
        season_end_years: &[u16],
        mode: RetrievalMode,
    ) -> Result<(Vec<OddsMatch>, FetchReport)> {
        let fragments = build_fragments(season_end_years);
        let mut report = FetchReport {
            fragments_total: fragments.len(),
            ..FetchReport::default()
        };

        let mut outcomes: Vec<(FragmentId, Result<(Vec<OddsMatch>, usize)>)> =
            stream::iter(fragments.into_iter().map(|fragment| {
                let Fragment { id, url } = fragment;
                async move {
                    let result = self.fetch_fragment(&id, &url).await;
                    (id, result)
                }
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // buffer_unordered completes in arbitrary order; sort so the
        // concatenated feed (and everything joined from it) is stable.
        outcomes.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut records = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok((rows, skipped)) => {
                    report.fragments_ok += 1;
                    report.rows += rows.len();
                    report.rows_skipped += skipped;
                    records.extend(rows);
                }
                Err(e) => match mode {
                    RetrievalMode::FailFast => {
                        return Err(e.context(format!("odds fragment {id}")));
                    }
                    RetrievalMode::PartialSuccess => {
                        warn!(fragment = %id, "odds fragment failed: {e:#}");
                        report.failed.push(id);
                    }
                },
            }
        }

        if report.fragments_ok == 0 {
            return Err(anyhow!(
                "all {} odds fragments failed",
                report.fragments_total
            ));
        }

        info!(
            fragments_ok = report.fragments_ok,
            fragments_failed = report.failed.len(),
            rows = report.rows,
            rows_skipped = report.rows_skipped,
            "odds feed fetched"
        );
        Ok((records, report))
    }

    async fn fetch_fragment(
        &self,
        id: &FragmentId,
        url: &str,
    ) -> Result<(Vec<OddsMatch>, usize)> {
        let body = retry_async(&self.retry, &format!("odds fragment {id}"), || async {
            let response = self.http.get(url).send().await?.error_for_status()?;
            // Files are latin-1; reqwest decodes via the charset hint.
            Ok(response.text_with_charset("ISO-8859-1").await?)
        })
        .await?;

        parse_fragment(&id.league, id.season.as_deref(), url, &body)
    }
}

fn build_fragments(season_end_years: &[u16]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    for (league, _) in config::MAIN_LEAGUES {
        for &year in season_end_years {
            let season = config::season_code(year);
            fragments.push(Fragment {
                url: config::main_league_url(&season, league),
                id: FragmentId {
                    league: league.to_string(),
                    season: Some(season),
                },
            });
        }
    }
    for (league, _) in config::EXTRA_LEAGUES {
        fragments.push(Fragment {
            url: config::extra_league_url(league),
            id: FragmentId {
                league: league.to_string(),
                season: None,
            },
        });
    }
    fragments
}

/// Header lookup that tolerates the feed's two column-naming schemes.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { index }
    }

    /// First non-empty value under any of the given column names.
    fn get<'r>(&self, record: &'r csv::StringRecord, names: &[&str]) -> Option<&'r str> {
        names
            .iter()
            .filter_map(|name| self.index.get(*name))
            .filter_map(|&i| record.get(i))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    fn f64(&self, record: &csv::StringRecord, names: &[&str]) -> Option<f64> {
        self.get(record, names).and_then(|v| v.parse().ok())
    }

    fn u32(&self, record: &csv::StringRecord, names: &[&str]) -> Option<u32> {
        self.get(record, names).and_then(|v| v.parse().ok())
    }
}

/// Parse one odds CSV.
///
/// Returns the parsed rows and the count of rows skipped for missing
/// date/team fields. A file that cannot be read as CSV at all is a
/// fragment-level failure.
pub fn parse_fragment(
    league_code: &str,
    season: Option<&str>,
    source_url: &str,
    text: &str,
) -> Result<(Vec<OddsMatch>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("odds file {source_url}: no header row"))?
        .clone();
    let columns = Columns::new(&headers);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row.with_context(|| format!("odds file {source_url}: unreadable row"))?;
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let date = columns.get(&row, &["Date"]).and_then(parse_date);
        let home = columns.get(&row, &["HomeTeam", "Home"]);
        let away = columns.get(&row, &["AwayTeam", "Away"]);
        let (date, home, away) = match (date, home, away) {
            (Some(d), Some(h), Some(a)) => (d, h, a),
            _ => {
                skipped += 1;
                continue;
            }
        };

        records.push(OddsMatch {
            date,
            league_code: columns
                .get(&row, &["Div"])
                .unwrap_or(league_code)
                .to_string(),
            home: home.to_string(),
            away: away.to_string(),
            home_source: home.to_string(),
            away_source: away.to_string(),
            score_home: columns.u32(&row, &["FTHG", "HG"]),
            score_away: columns.u32(&row, &["FTAG", "AG"]),
            odds: OddsBoard {
                bet365_home: columns.f64(&row, &["B365H"]),
                bet365_draw: columns.f64(&row, &["B365D"]),
                bet365_away: columns.f64(&row, &["B365A"]),
                avg_home: columns.f64(&row, &["AvgH"]),
                avg_draw: columns.f64(&row, &["AvgD"]),
                avg_away: columns.f64(&row, &["AvgA"]),
                max_home: columns.f64(&row, &["MaxH"]),
                max_draw: columns.f64(&row, &["MaxD"]),
                max_away: columns.f64(&row, &["MaxA"]),
                bet365_over: columns.f64(&row, &["B365>2.5"]),
                bet365_under: columns.f64(&row, &["B365<2.5"]),
                avg_over: columns.f64(&row, &["Avg>2.5"]),
                avg_under: columns.f64(&row, &["Avg<2.5"]),
                max_over: columns.f64(&row, &["Max>2.5"]),
                max_under: columns.f64(&row, &["Max<2.5"]),
            },
            season: season.map(|s| s.to_string()),
            source_url: source_url.to_string(),
        });
    }

    if skipped > 0 {
        warn!(
            file = source_url,
            skipped, "odds rows skipped for missing date or team names"
        );
    }
    Ok((records, skipped))
}

/// Dates come in two formats depending on the year of the file.
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%y"))
        .ok()
}
