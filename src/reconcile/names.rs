//! Team name canonicalization via a precomputed grouping table.
//!
//! The two feeds spell clubs differently ("Man United", "Manchester Utd",
//! "Manchester United FC"). Equivalence clusters are computed offline and
//! shipped as a JSON artifact mapping each canonical name to its known
//! variants; at run time canonicalization is a strip-then-exact lookup.
//! Names absent from the table pass through unchanged but are counted so
//! the match rate can be audited before the ROI numbers are trusted.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::types::{OddsMatch, SpiMatch};

/// The grouping artifact: canonical name -> raw variants.
///
/// Loaded once at startup and read-only for the life of the run.
#[derive(Debug, Clone)]
pub struct NameGroupingTable {
    groups: HashMap<String, Vec<String>>,
}

impl NameGroupingTable {
    /// Load the artifact from a JSON file of `{"canonical": ["variant", ...]}`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading name grouping table {}", path.display()))?;
        let groups: HashMap<String, Vec<String>> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing name grouping table {}", path.display()))?;
        Ok(Self { groups })
    }

    /// Build a table directly from groups (fixtures and tests).
    pub fn from_groups(groups: HashMap<String, Vec<String>>) -> Self {
        Self { groups }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Maps any known raw spelling to its canonical identity.
pub struct NameCanonicalizer {
    /// Inverted index: stripped variant -> stripped canonical.
    index: FxHashMap<String, String>,
}

impl NameCanonicalizer {
    /// Invert the grouping table into a variant -> canonical index.
    ///
    /// Both sides are whitespace-stripped; each canonical name also maps to
    /// itself so a source already using the canonical spelling resolves.
    pub fn new(table: &NameGroupingTable) -> Self {
        let mut index = FxHashMap::default();
        for (canonical, variants) in &table.groups {
            let canonical = canonical.trim().to_string();
            for variant in variants {
                index.insert(variant.trim().to_string(), canonical.clone());
            }
            index.insert(canonical.clone(), canonical);
        }
        Self { index }
    }

    /// Canonicalize one raw name: strip, exact lookup, pass through unknowns.
    ///
    /// Case and punctuation are NOT normalized here; any fuzziness must
    /// already be baked into the grouping table.
    pub fn canonicalize(&self, raw: &str) -> String {
        let stripped = raw.trim();
        match self.index.get(stripped) {
            Some(canonical) => canonical.clone(),
            None => stripped.to_string(),
        }
    }

    /// Whether a raw name resolves through the table (after stripping).
    pub fn is_known(&self, raw: &str) -> bool {
        self.index.contains_key(raw.trim())
    }

    pub fn variant_count(&self) -> usize {
        self.index.len()
    }
}

/// Names that passed through unresolved, with occurrence counts.
///
/// BTreeMap keeps the audit log output stable between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub unknown: BTreeMap<String, usize>,
}

impl NormalizeReport {
    pub fn distinct_unknown(&self) -> usize {
        self.unknown.len()
    }

    pub fn total_unknown(&self) -> usize {
        self.unknown.values().sum()
    }

    fn record(&mut self, canonicalizer: &NameCanonicalizer, raw: &str) {
        if !canonicalizer.is_known(raw) {
            *self.unknown.entry(raw.trim().to_string()).or_insert(0) += 1;
        }
    }
}

/// Replace both team names of every projection record with their canonical
/// identity. Must run before the join on every name-bearing field; joining
/// first and canonicalizing later would change the join key under the join.
pub fn canonicalize_spi(
    records: Vec<SpiMatch>,
    canonicalizer: &NameCanonicalizer,
) -> (Vec<SpiMatch>, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let records = records
        .into_iter()
        .map(|mut r| {
            report.record(canonicalizer, &r.home_source);
            report.record(canonicalizer, &r.away_source);
            r.home = canonicalizer.canonicalize(&r.home_source);
            r.away = canonicalizer.canonicalize(&r.away_source);
            r
        })
        .collect();
    (records, report)
}

/// Same as [`canonicalize_spi`] for the odds feed.
pub fn canonicalize_odds(
    records: Vec<OddsMatch>,
    canonicalizer: &NameCanonicalizer,
) -> (Vec<OddsMatch>, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let records = records
        .into_iter()
        .map(|mut r| {
            report.record(canonicalizer, &r.home_source);
            report.record(canonicalizer, &r.away_source);
            r.home = canonicalizer.canonicalize(&r.home_source);
            r.away = canonicalizer.canonicalize(&r.away_source);
            r
        })
        .collect();
    (records, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_canonicalizer() -> NameCanonicalizer {
        let mut groups = HashMap::new();
        groups.insert(
            "EXAMPLE".to_string(),
            vec!["FC Example".to_string(), "Example FC ".to_string()],
        );
        groups.insert(
            "Example United".to_string(),
            vec!["Example Utd".to_string()],
        );
        NameCanonicalizer::new(&NameGroupingTable::from_groups(groups))
    }

    #[test]
    fn test_variants_resolve_to_canonical() {
        let canon = example_canonicalizer();
        assert_eq!(canon.canonicalize("FC Example"), "EXAMPLE");
        assert_eq!(canon.canonicalize("Example FC"), "EXAMPLE");
        assert_eq!(canon.canonicalize("Example Utd"), "Example United");
    }

    #[test]
    fn test_canonical_maps_to_itself() {
        let canon = example_canonicalizer();
        assert_eq!(canon.canonicalize("EXAMPLE"), "EXAMPLE");
    }

    #[test]
    fn test_whitespace_stripped_before_lookup() {
        let canon = example_canonicalizer();
        assert_eq!(canon.canonicalize("  FC Example  "), "EXAMPLE");
        // Variant stored with trailing whitespace is stripped at build time
        assert_eq!(canon.canonicalize("Example FC"), "EXAMPLE");
    }

    #[test]
    fn test_unknown_name_passes_through_stripped() {
        let canon = example_canonicalizer();
        assert_eq!(canon.canonicalize(" Unlisted FC "), "Unlisted FC");
        assert!(!canon.is_known("Unlisted FC"));
    }

    #[test]
    fn test_case_is_not_normalized() {
        let canon = example_canonicalizer();
        // "fc example" is not in the table; exact match only
        assert_eq!(canon.canonicalize("fc example"), "fc example");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let canon = example_canonicalizer();
        for name in ["FC Example", "Example Utd", "Unlisted FC", "EXAMPLE"] {
            let once = canon.canonicalize(name);
            assert_eq!(canon.canonicalize(&once), once, "not idempotent: {name}");
        }
    }

    #[test]
    fn test_normalize_report_counts_distinct_misses() {
        let canon = example_canonicalizer();
        let mut report = NormalizeReport::default();
        report.record(&canon, "Unlisted FC");
        report.record(&canon, "Unlisted FC");
        report.record(&canon, "Another Unknown");
        report.record(&canon, "FC Example"); // known, not counted
        assert_eq!(report.distinct_unknown(), 2);
        assert_eq!(report.total_unknown(), 3);
        assert_eq!(report.unknown["Unlisted FC"], 2);
    }
}
