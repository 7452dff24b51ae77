//! Record types flowing through the reconciliation pipeline.
//!
//! Every stage consumes immutable records and produces new ones; nothing in
//! here is mutated in place after construction.

use chrono::NaiveDate;

/// One row of the SPI projections feed.
///
/// `home`/`away` start out as the names the feed used and are replaced by
/// canonical identities in the normalization step; `home_source` and
/// `away_source` always keep the as-fetched spelling for auditing.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiMatch {
    pub date: NaiveDate,
    pub league: String,
    pub home: String,
    pub away: String,
    pub home_source: String,
    pub away_source: String,
    pub spi_home: Option<f64>,
    pub spi_away: Option<f64>,
    pub prob_home: Option<f64>,
    pub prob_away: Option<f64>,
    pub prob_draw: Option<f64>,
    pub proj_score_home: Option<f64>,
    pub proj_score_away: Option<f64>,
    pub importance_home: Option<f64>,
    pub importance_away: Option<f64>,
    pub score_home: Option<u32>,
    pub score_away: Option<u32>,
    pub xg_home: Option<f64>,
    pub xg_away: Option<f64>,
    pub nsxg_home: Option<f64>,
    pub nsxg_away: Option<f64>,
    pub adj_score_home: Option<f64>,
    pub adj_score_away: Option<f64>,
}

/// Quoted odds for one match from the historical odds feed.
///
/// Columns are decimal odds; absent bookmaker columns stay `None` and the
/// affected metric simply excludes the row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OddsBoard {
    pub bet365_home: Option<f64>,
    pub bet365_draw: Option<f64>,
    pub bet365_away: Option<f64>,
    pub avg_home: Option<f64>,
    pub avg_draw: Option<f64>,
    pub avg_away: Option<f64>,
    pub max_home: Option<f64>,
    pub max_draw: Option<f64>,
    pub max_away: Option<f64>,
    pub bet365_over: Option<f64>,
    pub bet365_under: Option<f64>,
    pub avg_over: Option<f64>,
    pub avg_under: Option<f64>,
    pub max_over: Option<f64>,
    pub max_under: Option<f64>,
}

/// One row of the football-data.co.uk odds feed.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsMatch {
    pub date: NaiveDate,
    pub league_code: String,
    pub home: String,
    pub away: String,
    pub home_source: String,
    pub away_source: String,
    pub score_home: Option<u32>,
    pub score_away: Option<u32>,
    pub odds: OddsBoard,
    /// Season file the row came from ("1617"); None for single-file leagues.
    pub season: Option<String>,
    pub source_url: String,
}

/// An odds record replicated into the ±1-day tolerance window.
///
/// `record.date` carries the shifted date used as the join key;
/// `offset_days` is -1, 0, or +1 relative to the reported date, and
/// `source_index` points back at the pre-expansion row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedOdds {
    pub offset_days: i64,
    pub source_index: usize,
    pub record: OddsMatch,
}

/// One projection row matched to exactly one odds row.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedMatch {
    pub spi: SpiMatch,
    /// The odds row with its originally reported date.
    pub odds: OddsMatch,
    /// Window offset that produced the match (0 = dates agreed).
    pub odds_offset_days: i64,
}

/// Which side of a match an oriented record bets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BetSide {
    Home,
    Away,
    Draw,
}

impl std::fmt::Display for BetSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetSide::Home => write!(f, "home"),
            BetSide::Away => write!(f, "away"),
            BetSide::Draw => write!(f, "draw"),
        }
    }
}

/// The odds quoted for one outcome across the tracked odds sources.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuotedOdds {
    pub average: Option<f64>,
    pub bet365: Option<f64>,
    pub best: Option<f64>,
}

/// A joined match rewritten from one side's perspective with a single
/// win/lose outcome. Created once per side per match, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedRecord {
    pub date: NaiveDate,
    pub league: String,
    pub side: BetSide,
    /// Canonical identity of the side being bet on; None for draw.
    pub team: Option<String>,
    /// Canonical identity of the opposing side; None for draw, which has
    /// no singular opponent.
    pub opponent: Option<String>,
    /// True iff this perspective's outcome is the one that occurred.
    pub win: bool,
    /// Model probability of this outcome.
    pub prob: Option<f64>,
    /// Quoted odds for this outcome.
    pub quoted: QuotedOdds,
    pub spi_for: Option<f64>,
    pub spi_against: Option<f64>,
    pub proj_score_for: Option<f64>,
    pub proj_score_against: Option<f64>,
    pub importance_for: Option<f64>,
    pub importance_against: Option<f64>,
    pub score_for: Option<u32>,
    pub score_against: Option<u32>,
    pub xg_for: Option<f64>,
    pub xg_against: Option<f64>,
    pub nsxg_for: Option<f64>,
    pub nsxg_against: Option<f64>,
    pub adj_score_for: Option<f64>,
    pub adj_score_against: Option<f64>,
}
