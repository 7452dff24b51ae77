//! Cross-feed match joining on (date, home identity, away identity).
//!
//! All fuzziness has been resolved before this stage: names are canonical
//! and date skew is absorbed by the odds-side window expansion, so the key
//! comparison here is exact equality. The join never drops a record
//! silently; everything that fails to pair one-to-one lands in the
//! unmatched or conflict sets of the report so the match rate can be
//! audited before any ROI number is trusted.

use chrono::{Duration, NaiveDate};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::types::{ExpandedOdds, JoinedMatch, OddsMatch, SpiMatch};

/// What to do when a projection record resolves to more than one odds
/// candidate (possible when the ±1-day window collides with a genuinely
/// distinct match, e.g. a cup rematch two days after a league game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Emit no match for the record; the conflict set carries it.
    Reject,
    /// Resolve only when exactly one candidate sits at day offset zero
    /// (its reported date agrees with the projection feed); the conflict
    /// is still recorded. Anything else is rejected.
    #[default]
    PreferExactDate,
}

/// Configuration for the join operation.
#[derive(Debug, Clone, Default)]
pub struct JoinConfig {
    pub conflict_policy: ConflictPolicy,
}

/// Why a record ended up in the conflict set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The join key resolved to more than one odds candidate.
    MultipleCandidates,
    /// The only candidate's underlying odds row was already paired with an
    /// earlier projection record.
    OddsRowConsumed,
}

/// One cardinality violation, with every candidate that was in play.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinConflict {
    pub spi: SpiMatch,
    pub kind: ConflictKind,
    pub candidates: Vec<ExpandedOdds>,
    /// True when the policy resolved the conflict; the record then also
    /// appears in `matched`.
    pub resolved: bool,
}

/// Result of the join operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    pub matched: Vec<JoinedMatch>,
    /// Projection records with no odds candidate.
    pub unmatched_spi: Vec<SpiMatch>,
    /// Odds rows (original dates, pre-expansion) no projection record used.
    pub unmatched_odds: Vec<OddsMatch>,
    /// Cardinality violations, resolved or not.
    pub conflicts: Vec<JoinConflict>,
}

impl JoinReport {
    /// Share of projection records that found exactly one odds row.
    pub fn match_rate(&self) -> f64 {
        let unresolved = self.conflicts.iter().filter(|c| !c.resolved).count();
        let total = self.matched.len() + self.unmatched_spi.len() + unresolved;
        if total == 0 {
            return 0.0;
        }
        self.matched.len() as f64 / total as f64
    }
}

type JoinKey<'a> = (NaiveDate, &'a str, &'a str);

/// Join projection records against window-expanded odds records.
///
/// Each underlying odds row pairs with at most one projection record; a
/// second projection record resolving to an already-consumed row is a
/// conflict, never a duplicate match. Pure over its inputs and
/// deterministic for a given input order.
pub fn join_matches(
    spi: &[SpiMatch],
    odds: &[ExpandedOdds],
    config: &JoinConfig,
) -> JoinReport {
    // Candidate index over the expanded odds rows, in input order.
    let mut by_key: FxHashMap<JoinKey<'_>, Vec<usize>> = FxHashMap::default();
    for (idx, e) in odds.iter().enumerate() {
        by_key
            .entry((e.record.date, e.record.home.as_str(), e.record.away.as_str()))
            .or_default()
            .push(idx);
    }

    let base_rows = odds
        .iter()
        .map(|e| e.source_index + 1)
        .max()
        .unwrap_or(0);
    let mut consumed = vec![false; base_rows];

    let mut report = JoinReport::default();

    for record in spi {
        let key = (record.date, record.home.as_str(), record.away.as_str());
        let candidates = match by_key.get(&key) {
            Some(c) if !c.is_empty() => c,
            _ => {
                debug!(
                    date = %record.date,
                    home = %record.home,
                    away = %record.away,
                    "no odds candidate for projection record"
                );
                report.unmatched_spi.push(record.clone());
                continue;
            }
        };

        if candidates.len() == 1 {
            let e = &odds[candidates[0]];
            if consumed[e.source_index] {
                warn!(
                    date = %record.date,
                    home = %record.home,
                    away = %record.away,
                    "odds row already paired with an earlier projection record"
                );
                report.conflicts.push(JoinConflict {
                    spi: record.clone(),
                    kind: ConflictKind::OddsRowConsumed,
                    candidates: vec![e.clone()],
                    resolved: false,
                });
            } else {
                consumed[e.source_index] = true;
                report.matched.push(joined(record, e));
            }
            continue;
        }

        // More than one candidate: never pick by iteration order.
        let resolution = match config.conflict_policy {
            ConflictPolicy::Reject => None,
            ConflictPolicy::PreferExactDate => {
                let mut exact = candidates
                    .iter()
                    .filter(|&&i| odds[i].offset_days == 0 && !consumed[odds[i].source_index]);
                match (exact.next(), exact.next()) {
                    (Some(&i), None) => Some(i),
                    _ => None,
                }
            }
        };

        if let Some(i) = resolution {
            let e = &odds[i];
            consumed[e.source_index] = true;
            report.matched.push(joined(record, e));
        }
        warn!(
            date = %record.date,
            home = %record.home,
            away = %record.away,
            candidates = candidates.len(),
            resolved = resolution.is_some(),
            "multiple odds candidates for one projection record"
        );
        report.conflicts.push(JoinConflict {
            spi: record.clone(),
            kind: ConflictKind::MultipleCandidates,
            candidates: candidates.iter().map(|&i| odds[i].clone()).collect(),
            resolved: resolution.is_some(),
        });
    }

    // Odds rows never used by any projection record, at their reported date.
    for e in odds {
        if e.offset_days == 0 && !consumed[e.source_index] {
            report.unmatched_odds.push(e.record.clone());
        }
    }

    report
}

/// Build the joined record, restoring the odds row's reported date.
fn joined(spi: &SpiMatch, e: &ExpandedOdds) -> JoinedMatch {
    let mut odds = e.record.clone();
    odds.date = e.record.date - Duration::days(e.offset_days);
    JoinedMatch {
        spi: spi.clone(),
        odds,
        odds_offset_days: e.offset_days,
    }
}
