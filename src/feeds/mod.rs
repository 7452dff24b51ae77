//! Feed retrieval: the only concurrent part of the system.
//!
//! Each (league, season) file is fetched independently; fragments are
//! concatenated only after every fetch resolves. A failed fragment fails
//! alone; whether that aborts the run or just gets reported is an
//! explicit caller choice, never a silent drop.

pub mod football_data;
pub mod spi;

pub use football_data::FootballDataClient;
pub use spi::SpiClient;

/// How to treat per-fragment retrieval failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalMode {
    /// Abort the whole retrieval on the first failed fragment.
    FailFast,
    /// Keep the fragments that succeeded and report the ones missing.
    #[default]
    PartialSuccess,
}

impl RetrievalMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fail_fast" | "failfast" | "strict" => RetrievalMode::FailFast,
            "partial" | "partial_success" | "lenient" => RetrievalMode::PartialSuccess,
            _ => RetrievalMode::PartialSuccess,
        }
    }

    /// Parse from the RETRIEVAL_MODE env var.
    pub fn from_env() -> Self {
        std::env::var("RETRIEVAL_MODE")
            .map(|v| Self::from_str(&v))
            .unwrap_or_default()
    }
}

/// Identifies one fetched file of the odds feed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FragmentId {
    pub league: String,
    /// Season file code ("1617"); None for single-file leagues.
    pub season: Option<String>,
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.season {
            Some(season) => write!(f, "{} {}", self.league, season),
            None => write!(f, "{}", self.league),
        }
    }
}

/// Outcome of the odds-feed retrieval, for auditing before the join.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub fragments_total: usize,
    pub fragments_ok: usize,
    /// Fragments that could not be fetched or parsed.
    pub failed: Vec<FragmentId>,
    /// Rows parsed across all successful fragments.
    pub rows: usize,
    /// Rows dropped inside successful fragments (unparseable date,
    /// missing team names, blank lines).
    pub rows_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_mode_from_str() {
        assert_eq!(RetrievalMode::from_str("fail_fast"), RetrievalMode::FailFast);
        assert_eq!(RetrievalMode::from_str("STRICT"), RetrievalMode::FailFast);
        assert_eq!(
            RetrievalMode::from_str("partial"),
            RetrievalMode::PartialSuccess
        );
        assert_eq!(
            RetrievalMode::from_str("anything-else"),
            RetrievalMode::PartialSuccess
        );
    }

    #[test]
    fn test_fragment_id_display() {
        let seasonal = FragmentId {
            league: "E0".to_string(),
            season: Some("1617".to_string()),
        };
        assert_eq!(seasonal.to_string(), "E0 1617");

        let single = FragmentId {
            league: "BRA".to_string(),
            season: None,
        };
        assert_eq!(single.to_string(), "BRA");
    }
}
