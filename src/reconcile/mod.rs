//! Entity reconciliation and join pipeline.
//!
//! The two feeds disagree on club spelling and occasionally on the match
//! date, and every financial number downstream is only as good as this
//! join: one silently duplicated or mismatched row corrupts the ROI with
//! no visible error. The stages are:
//!
//! - **names**: canonicalize raw team names through a precomputed
//!   grouping-table artifact (strip, exact lookup, pass-through misses)
//! - **window**: replicate odds records at ±1 day to absorb cross-source
//!   reporting-date skew (odds side only)
//! - **join**: exact (date, home, away) join with full unmatched and
//!   conflict reporting
//! - **perspective**: rewrite each joined match as home/away/draw oriented
//!   records with a single win flag each
//!
//! Every stage is synchronous and pure: immutable records in, new records
//! out, no shared mutable state.

pub mod join;
pub mod names;
pub mod perspective;
pub mod types;
pub mod window;

pub use join::{join_matches, ConflictKind, ConflictPolicy, JoinConfig, JoinConflict, JoinReport};
pub use names::{
    canonicalize_odds, canonicalize_spi, NameCanonicalizer, NameGroupingTable, NormalizeReport,
};
pub use perspective::{expand_all, Perspectives};
pub use types::{
    BetSide, ExpandedOdds, JoinedMatch, OddsBoard, OddsMatch, OrientedRecord, QuotedOdds, SpiMatch,
};
pub use window::expand as expand_window;
