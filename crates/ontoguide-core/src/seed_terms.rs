//! Metric name to seed-term resolution.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{SeedTerm, SeedTermDocument};
use crate::iri::seed_term_from_entry;

/// Which lookup step found the document key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    SuffixToggled,
    /// First key containing the target name. Ambiguous when several do.
    Substring,
}

/// Seed terms found for one metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSeedTerms {
    pub matched_key: Option<String>,
    pub match_kind: Option<MatchKind>,
    /// Every term in document order, valid or not.
    pub terms: Vec<SeedTerm>,
}

impl ResolvedSeedTerms {
    /// Terms usable by the extraction tool.
    pub fn valid_terms(&self) -> Vec<SeedTerm> {
        self.terms.iter().filter(|t| t.valid).cloned().collect()
    }

    pub fn has_valid(&self) -> bool {
        self.terms.iter().any(|t| t.valid)
    }

    pub fn labels(&self, limit: usize) -> Vec<String> {
        self.terms
            .iter()
            .filter(|t| !t.label.is_empty())
            .take(limit)
            .map(|t| t.label.clone())
            .collect()
    }
}

/// Looks metric names up in a [`SeedTermDocument`].
#[derive(Debug, Clone, Copy)]
pub struct SeedTermResolver<'a> {
    document: &'a SeedTermDocument,
    suffix: &'a str,
}

impl<'a> SeedTermResolver<'a> {
    pub fn new(document: &'a SeedTermDocument, suffix: &'a str) -> Self {
        Self { document, suffix }
    }

    fn toggled(&self, metric: &str) -> Option<String> {
        if self.suffix.is_empty() {
            return None;
        }
        match metric.strip_suffix(self.suffix) {
            Some(base) if !base.is_empty() => Some(base.to_string()),
            _ => Some(format!("{metric}{}", self.suffix)),
        }
    }

    /// Find the document key for `metric`: exact, then suffix toggled, then
    /// the first key containing `metric`.
    pub fn find_key(&self, metric: &str) -> Option<(&'a str, MatchKind)> {
        let document = self.document;

        if let Some(key) = document.keys().find(|k| *k == metric) {
            return Some((key, MatchKind::Exact));
        }

        if let Some(alt) = self.toggled(metric) {
            if let Some(key) = document.keys().find(|k| *k == alt) {
                return Some((key, MatchKind::SuffixToggled));
            }
        }

        if metric.is_empty() {
            return None;
        }
        let mut matches = document.keys().filter(|k| k.contains(metric));
        let first = matches.next()?;
        if matches.next().is_some() {
            warn!(metric, key = first, "Several seed-term keys contain the metric; using the first");
        }
        Some((first, MatchKind::Substring))
    }

    /// Resolve `metric` to normalized seed terms.
    ///
    /// A miss is an empty result, not an error.
    pub fn resolve(&self, metric: &str) -> ResolvedSeedTerms {
        let Some((key, kind)) = self.find_key(metric) else {
            debug!(metric, "No seed terms found");
            return ResolvedSeedTerms::default();
        };

        let terms: Vec<SeedTerm> = self
            .document
            .get(key)
            .unwrap_or_default()
            .iter()
            .map(seed_term_from_entry)
            .collect();

        let rejected = terms.iter().filter(|t| !t.valid).count();
        if rejected > 0 {
            warn!(metric, key, rejected, "Excluded seed terms with invalid identifiers");
        }
        debug!(metric, key, kind = ?kind, terms = terms.len(), "Resolved seed terms");

        ResolvedSeedTerms {
            matched_key: Some(key.to_string()),
            match_kind: Some(kind),
            terms,
        }
    }
}
