//! Perspective expansion: one joined match becomes three oriented records.
//!
//! Downstream evaluation wants to ask one question, "does this bet win at
//! these odds with this probability", regardless of whether the bet is on
//! the home side, the away side, or the draw. Expanding each joined match
//! into three single-outcome records lets the evaluator be written once.

use super::types::{BetSide, JoinedMatch, OrientedRecord, QuotedOdds};

/// The observed result of a match, computed once from the final scores
/// before any orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchOutcome {
    fn from_scores(score_home: u32, score_away: u32) -> Self {
        match score_home.cmp(&score_away) {
            std::cmp::Ordering::Greater => MatchOutcome::HomeWin,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::AwayWin,
        }
    }
}

/// The three perspectives of one joined match. Exactly one of the three
/// `win` flags is true.
#[derive(Debug, Clone, PartialEq)]
pub struct Perspectives {
    pub home: OrientedRecord,
    pub away: OrientedRecord,
    pub draw: OrientedRecord,
}

/// Expand one joined match into its three perspectives.
///
/// Returns None when either final score is missing on the projection side;
/// without an observed outcome there is nothing to settle a bet against.
pub fn expand(m: &JoinedMatch) -> Option<Perspectives> {
    let outcome = MatchOutcome::from_scores(m.spi.score_home?, m.spi.score_away?);

    let home = OrientedRecord {
        date: m.spi.date,
        league: m.spi.league.clone(),
        side: BetSide::Home,
        team: Some(m.spi.home.clone()),
        opponent: Some(m.spi.away.clone()),
        win: outcome == MatchOutcome::HomeWin,
        prob: m.spi.prob_home,
        quoted: QuotedOdds {
            average: m.odds.odds.avg_home,
            bet365: m.odds.odds.bet365_home,
            best: m.odds.odds.max_home,
        },
        spi_for: m.spi.spi_home,
        spi_against: m.spi.spi_away,
        proj_score_for: m.spi.proj_score_home,
        proj_score_against: m.spi.proj_score_away,
        importance_for: m.spi.importance_home,
        importance_against: m.spi.importance_away,
        score_for: m.spi.score_home,
        score_against: m.spi.score_away,
        xg_for: m.spi.xg_home,
        xg_against: m.spi.xg_away,
        nsxg_for: m.spi.nsxg_home,
        nsxg_against: m.spi.nsxg_away,
        adj_score_for: m.spi.adj_score_home,
        adj_score_against: m.spi.adj_score_away,
    };

    // Away perspective: every home/away-suffixed pair swaps.
    let away = OrientedRecord {
        side: BetSide::Away,
        team: Some(m.spi.away.clone()),
        opponent: Some(m.spi.home.clone()),
        win: outcome == MatchOutcome::AwayWin,
        prob: m.spi.prob_away,
        quoted: QuotedOdds {
            average: m.odds.odds.avg_away,
            bet365: m.odds.odds.bet365_away,
            best: m.odds.odds.max_away,
        },
        spi_for: m.spi.spi_away,
        spi_against: m.spi.spi_home,
        proj_score_for: m.spi.proj_score_away,
        proj_score_against: m.spi.proj_score_home,
        importance_for: m.spi.importance_away,
        importance_against: m.spi.importance_home,
        score_for: m.spi.score_away,
        score_against: m.spi.score_home,
        xg_for: m.spi.xg_away,
        xg_against: m.spi.xg_home,
        nsxg_for: m.spi.nsxg_away,
        nsxg_against: m.spi.nsxg_home,
        adj_score_for: m.spi.adj_score_away,
        adj_score_against: m.spi.adj_score_home,
        ..home.clone()
    };

    // Draw perspective: no singular opponent, probability and odds come
    // from the dedicated draw columns; the stat fields keep the home
    // orientation of the base record.
    let draw = OrientedRecord {
        side: BetSide::Draw,
        team: None,
        opponent: None,
        win: outcome == MatchOutcome::Draw,
        prob: m.spi.prob_draw,
        quoted: QuotedOdds {
            average: m.odds.odds.avg_draw,
            bet365: m.odds.odds.bet365_draw,
            best: m.odds.odds.max_draw,
        },
        ..home.clone()
    };

    Some(Perspectives { home, away, draw })
}

/// Expand a whole joined set into a flat oriented table.
///
/// Returns the oriented records (3 per expandable match) and the count of
/// matches skipped for missing final scores.
pub fn expand_all(matches: &[JoinedMatch]) -> (Vec<OrientedRecord>, usize) {
    let mut out = Vec::with_capacity(matches.len() * 3);
    let mut skipped = 0usize;
    for m in matches {
        match expand(m) {
            Some(p) => {
                out.push(p.home);
                out.push(p.away);
                out.push(p.draw);
            }
            None => skipped += 1,
        }
    }
    (out, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::types::{OddsBoard, OddsMatch, SpiMatch};
    use chrono::NaiveDate;

    fn joined(score_home: Option<u32>, score_away: Option<u32>) -> JoinedMatch {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        JoinedMatch {
            spi: SpiMatch {
                date,
                league: "Barclays Premier League".to_string(),
                home: "EXAMPLE".to_string(),
                away: "Example United".to_string(),
                home_source: "FC Example".to_string(),
                away_source: "Example Utd".to_string(),
                spi_home: Some(80.0),
                spi_away: Some(70.0),
                prob_home: Some(0.5),
                prob_away: Some(0.3),
                prob_draw: Some(0.2),
                proj_score_home: Some(1.8),
                proj_score_away: Some(1.1),
                importance_home: Some(60.0),
                importance_away: Some(40.0),
                score_home,
                score_away,
                xg_home: Some(1.9),
                xg_away: Some(0.8),
                nsxg_home: Some(1.5),
                nsxg_away: Some(1.0),
                adj_score_home: Some(2.1),
                adj_score_away: Some(1.0),
            },
            odds: OddsMatch {
                date,
                league_code: "E0".to_string(),
                home: "EXAMPLE".to_string(),
                away: "Example United".to_string(),
                home_source: "Example FC".to_string(),
                away_source: "Example United".to_string(),
                score_home,
                score_away,
                odds: OddsBoard {
                    bet365_home: Some(1.8),
                    bet365_draw: Some(3.6),
                    bet365_away: Some(4.5),
                    avg_home: Some(1.75),
                    avg_draw: Some(3.5),
                    avg_away: Some(4.4),
                    max_home: Some(1.9),
                    max_draw: Some(3.8),
                    max_away: Some(4.8),
                    ..OddsBoard::default()
                },
                season: None,
                source_url: "test".to_string(),
            },
            odds_offset_days: 0,
        }
    }

    fn win_flags(p: &Perspectives) -> (bool, bool, bool) {
        (p.home.win, p.away.win, p.draw.win)
    }

    #[test]
    fn test_exactly_one_win_flag_for_each_outcome() {
        let cases = [
            ((2, 1), (true, false, false)),
            ((0, 3), (false, true, false)),
            ((1, 1), (false, false, true)),
            ((0, 0), (false, false, true)),
        ];
        for ((sh, sa), expected) in cases {
            let p = expand(&joined(Some(sh), Some(sa))).unwrap();
            assert_eq!(win_flags(&p), expected, "scores {sh}-{sa}");
            let true_count = [p.home.win, p.away.win, p.draw.win]
                .iter()
                .filter(|&&w| w)
                .count();
            assert_eq!(true_count, 1, "partition violated for {sh}-{sa}");
        }
    }

    #[test]
    fn test_away_perspective_swaps_all_paired_fields() {
        let p = expand(&joined(Some(2), Some(1))).unwrap();
        let away = &p.away;
        assert_eq!(away.team.as_deref(), Some("Example United"));
        assert_eq!(away.opponent.as_deref(), Some("EXAMPLE"));
        assert_eq!(away.prob, Some(0.3));
        assert_eq!(away.quoted.bet365, Some(4.5));
        assert_eq!(away.quoted.average, Some(4.4));
        assert_eq!(away.quoted.best, Some(4.8));
        assert_eq!(away.spi_for, Some(70.0));
        assert_eq!(away.spi_against, Some(80.0));
        assert_eq!(away.proj_score_for, Some(1.1));
        assert_eq!(away.score_for, Some(1));
        assert_eq!(away.score_against, Some(2));
        assert_eq!(away.xg_for, Some(0.8));
        assert_eq!(away.nsxg_for, Some(1.0));
        assert_eq!(away.adj_score_for, Some(1.0));
        assert_eq!(away.importance_for, Some(40.0));
    }

    #[test]
    fn test_draw_perspective_uses_draw_columns_and_clears_opponent() {
        let p = expand(&joined(Some(1), Some(1))).unwrap();
        let draw = &p.draw;
        assert_eq!(draw.team, None);
        assert_eq!(draw.opponent, None);
        assert_eq!(draw.prob, Some(0.2));
        assert_eq!(draw.quoted.bet365, Some(3.6));
        assert_eq!(draw.quoted.average, Some(3.5));
        assert_eq!(draw.quoted.best, Some(3.8));
        assert!(draw.win);
    }

    #[test]
    fn test_missing_scores_cannot_be_oriented() {
        assert!(expand(&joined(None, Some(1))).is_none());
        assert!(expand(&joined(Some(1), None)).is_none());
    }

    #[test]
    fn test_expand_all_counts_skips() {
        let matches = vec![
            joined(Some(2), Some(0)),
            joined(None, None),
            joined(Some(1), Some(1)),
        ];
        let (oriented, skipped) = expand_all(&matches);
        assert_eq!(oriented.len(), 6);
        assert_eq!(skipped, 1);
    }
}
