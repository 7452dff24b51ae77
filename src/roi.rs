//! Return-on-investment evaluation of the betting rules.
//!
//! Two rules from the original strategy:
//! - **Outcome lines**: over the oriented table, bet one unit on any
//!   outcome whose model probability gives positive expected value
//!   against the quoted odds.
//! - **Over/under 2.5 goals**: per joined match, bet over (under) when
//!   the projected combined score is above (below) 2.5.
//!
//! Rows missing the probability or odds a metric needs are excluded from
//! that metric, never treated as zero.

use crate::reconcile::types::{JoinedMatch, OrientedRecord};

/// Which published odds column a metric is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OddsSource {
    /// Market-average odds.
    Average,
    /// Bet365 quoted odds.
    Bet365,
    /// Best odds available across bookmakers.
    BestAvailable,
}

impl std::fmt::Display for OddsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OddsSource::Average => write!(f, "Avg"),
            OddsSource::Bet365 => write!(f, "B365"),
            OddsSource::BestAvailable => write!(f, "Max"),
        }
    }
}

/// Aggregate result of one strategy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoiSummary {
    /// Net units won or lost across all placed bets.
    pub balance: f64,
    pub bets_placed: usize,
    pub bets_won: usize,
    /// Rows excluded for a missing probability or odds field.
    pub rows_skipped: usize,
}

impl RoiSummary {
    /// Realized return per placed bet; None when nothing was bet.
    pub fn roi(&self) -> Option<f64> {
        if self.bets_placed == 0 {
            None
        } else {
            Some(self.balance / self.bets_placed as f64)
        }
    }

    fn settle(&mut self, won: bool, odds: f64) {
        self.bets_placed += 1;
        if won {
            self.bets_won += 1;
            self.balance += odds - 1.0;
        } else {
            self.balance -= 1.0;
        }
    }
}

/// Evaluate the outcome-line rule over the oriented table.
///
/// A bet is placed iff `prob * (odds - 1) - (1 - prob) > 0`; each placed
/// bet returns `odds - 1` on a win and `-1` otherwise.
pub fn evaluate(records: &[OrientedRecord], source: OddsSource) -> RoiSummary {
    let mut summary = RoiSummary::default();
    for r in records {
        let (prob, odds) = match (r.prob, line_odds(r, source)) {
            (Some(p), Some(o)) => (p, o),
            _ => {
                summary.rows_skipped += 1;
                continue;
            }
        };
        let ev = prob * (odds - 1.0) - (1.0 - prob);
        if ev > 0.0 {
            summary.settle(r.win, odds);
        }
    }
    summary
}

/// Evaluate the over/under 2.5 goals rule over the joined set.
///
/// One bet at most per match: over when the projected combined score is
/// above 2.5, under when below. Settled against the actual combined score.
pub fn evaluate_totals(matches: &[JoinedMatch], source: OddsSource) -> RoiSummary {
    let mut summary = RoiSummary::default();
    for m in matches {
        let projected = match (m.spi.proj_score_home, m.spi.proj_score_away) {
            (Some(h), Some(a)) => h + a,
            _ => {
                summary.rows_skipped += 1;
                continue;
            }
        };
        let actual = match (m.spi.score_home, m.spi.score_away) {
            (Some(h), Some(a)) => h + a,
            _ => {
                summary.rows_skipped += 1;
                continue;
            }
        };
        let (over_odds, under_odds) = match totals_odds(m, source) {
            (Some(o), Some(u)) => (o, u),
            _ => {
                summary.rows_skipped += 1;
                continue;
            }
        };

        if projected > 2.5 {
            summary.settle(actual > 2, over_odds);
        } else if projected < 2.5 {
            summary.settle(actual <= 2, under_odds);
        }
    }
    summary
}

fn line_odds(r: &OrientedRecord, source: OddsSource) -> Option<f64> {
    match source {
        OddsSource::Average => r.quoted.average,
        OddsSource::Bet365 => r.quoted.bet365,
        OddsSource::BestAvailable => r.quoted.best,
    }
}

fn totals_odds(m: &JoinedMatch, source: OddsSource) -> (Option<f64>, Option<f64>) {
    let board = &m.odds.odds;
    match source {
        OddsSource::Average => (board.avg_over, board.avg_under),
        OddsSource::Bet365 => (board.bet365_over, board.bet365_under),
        OddsSource::BestAvailable => (board.max_over, board.max_under),
    }
}
