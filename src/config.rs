//! Feed locations, league mapping tables, and environment configuration.
//!
//! Every path and URL the pipeline touches is defined here and passed down
//! explicitly; the reconciliation core never reads the environment itself.

use std::collections::HashSet;
use std::path::PathBuf;

/// FiveThirtyEight SPI club match projections (one CSV for all leagues).
pub const SPI_MATCHES_URL: &str =
    "https://projects.fivethirtyeight.com/soccer-api/club/spi_matches.csv";

/// football-data.co.uk per-season files for the main (mostly European) leagues.
const FOOTBALL_DATA_MAIN_URL: &str = "https://www.football-data.co.uk/mmz4281/{season}/{league}.csv";

/// football-data.co.uk single-file feeds for the secondary leagues.
const FOOTBALL_DATA_EXTRA_URL: &str = "https://www.football-data.co.uk/new/{league}.csv";

/// Main-league codes and the SPI league names they correspond to.
pub const MAIN_LEAGUES: &[(&str, &[&str])] = &[
    ("E0", &["Barclays Premier League"]),
    ("E1", &["English League Championship"]),
    ("E2", &["English League One"]),
    ("E3", &["English League Two"]),
    ("SC0", &["Scottish Premiership"]),
    ("D1", &["German Bundesliga"]),
    ("D2", &["German 2. Bundesliga"]),
    ("I1", &["Italy Serie A"]),
    ("I2", &["Italy Serie B"]),
    ("SP1", &["Spanish Primera Division"]),
    ("SP2", &["Spanish Segunda Division"]),
    ("F1", &["French Ligue 1"]),
    ("F2", &["French Ligue 2"]),
    ("N1", &["Dutch Eredivisie"]),
    ("B1", &["Belgian Jupiler League"]),
    ("P1", &["Portuguese Liga"]),
    ("T1", &["Turkish Turkcell Super Lig"]),
    ("G1", &["Greek Super League"]),
];

/// Secondary-league codes and their SPI league names. Mexico runs two
/// tournaments per calendar year, so one code maps to two SPI leagues.
pub const EXTRA_LEAGUES: &[(&str, &[&str])] = &[
    ("ARG", &["Argentina Primera Division"]),
    ("AUT", &["Austrian T-Mobile Bundesliga"]),
    ("BRA", &["Brasileiro Série A"]),
    ("CHN", &["Chinese Super League"]),
    ("DNK", &["Danish SAS-Ligaen"]),
    ("JPN", &["Japanese J League"]),
    (
        "MEX",
        &[
            "Mexican Primera Division Torneo Apertura",
            "Mexican Primera Division Torneo Clausura",
        ],
    ),
    ("NOR", &["Norwegian Tippeligaen"]),
    ("RUS", &["Russian Premier Liga"]),
    ("SWE", &["Swedish Allsvenskan"]),
    ("SWZ", &["Swiss Raiffeisen Super League"]),
];

/// First and last season end-year fetched by default (a season end-year of
/// 2017 means the 2016/17 season file "1617").
pub const DEFAULT_SEASON_FIRST: u16 = 2016;
pub const DEFAULT_SEASON_LAST: u16 = 2023;

/// Default concurrent feed fetches.
const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Default location of the name grouping table artifact.
const DEFAULT_NAMES_FILE: &str = "./data/names.json";

/// URL for one main-league season file. Season is the two-digit start and
/// end year concatenated, e.g. "1617" for 2016/17.
pub fn main_league_url(season: &str, league: &str) -> String {
    FOOTBALL_DATA_MAIN_URL
        .replace("{season}", season)
        .replace("{league}", league)
}

/// URL for one secondary-league file.
pub fn extra_league_url(league: &str) -> String {
    FOOTBALL_DATA_EXTRA_URL.replace("{league}", league)
}

/// Season file name for a season ending in `end_year`: "1617" for 2017.
pub fn season_code(end_year: u16) -> String {
    format!("{:02}{:02}", (end_year - 1) % 100, end_year % 100)
}

/// Every SPI league name covered by the odds feed, for filtering the
/// projection feed before the join.
pub fn spi_league_names() -> HashSet<String> {
    MAIN_LEAGUES
        .iter()
        .chain(EXTRA_LEAGUES.iter())
        .flat_map(|(_, names)| names.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Season end-years to fetch, from SEASON_FIRST/SEASON_LAST env vars.
/// Values outside 1994..=2100 or an inverted range fall back to defaults.
pub fn seasons_from_env() -> Vec<u16> {
    let first = env_year("SEASON_FIRST", DEFAULT_SEASON_FIRST);
    let last = env_year("SEASON_LAST", DEFAULT_SEASON_LAST);
    if first > last {
        return (DEFAULT_SEASON_FIRST..=DEFAULT_SEASON_LAST).collect();
    }
    (first..=last).collect()
}

fn env_year(var: &str, default: u16) -> u16 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .filter(|&y| (1994..=2100).contains(&y))
        .unwrap_or(default)
}

/// Path of the name grouping table (NAMES_FILE env var).
pub fn names_file_from_env() -> PathBuf {
    std::env::var("NAMES_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_NAMES_FILE))
}

/// Concurrent feed fetches (FETCH_CONCURRENCY env var, cached).
pub fn fetch_concurrency() -> usize {
    static CACHED: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("FETCH_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= 64)
            .unwrap_or(DEFAULT_FETCH_CONCURRENCY)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_code() {
        assert_eq!(season_code(2017), "1617");
        assert_eq!(season_code(2023), "2223");
        assert_eq!(season_code(2000), "9900");
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            main_league_url("1617", "E0"),
            "https://www.football-data.co.uk/mmz4281/1617/E0.csv"
        );
        assert_eq!(
            extra_league_url("BRA"),
            "https://www.football-data.co.uk/new/BRA.csv"
        );
    }

    #[test]
    fn test_spi_league_names_cover_both_tables() {
        let names = spi_league_names();
        assert!(names.contains("Barclays Premier League"));
        assert!(names.contains("Mexican Primera Division Torneo Apertura"));
        assert!(names.contains("Mexican Primera Division Torneo Clausura"));
        // 18 main codes with one name each + 11 extra codes, MEX carrying two
        assert_eq!(names.len(), 18 + 12);
    }
}
