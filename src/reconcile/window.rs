//! Date tolerance window for the odds side of the join.
//!
//! The odds feed sometimes reports a match one day off from the projection
//! feed (late kickoffs, timezone conventions). Each odds record is
//! replicated at date-1, date, and date+1 so the join can absorb the skew.
//! This must run only on the odds side; widening both sides would multiply
//! false-positive matches.

use chrono::Duration;

use super::types::{ExpandedOdds, OddsMatch};

/// Replicate every record at the three window dates.
///
/// Output length is exactly 3x the input; duplicates are not collapsed
/// here, the join reports any collisions instead.
pub fn expand(records: &[OddsMatch]) -> Vec<ExpandedOdds> {
    let mut out = Vec::with_capacity(records.len() * 3);
    for (source_index, record) in records.iter().enumerate() {
        for offset_days in [-1i64, 0, 1] {
            let mut shifted = record.clone();
            shifted.date = record.date + Duration::days(offset_days);
            out.push(ExpandedOdds {
                offset_days,
                source_index,
                record: shifted,
            });
        }
    }
    out
}
