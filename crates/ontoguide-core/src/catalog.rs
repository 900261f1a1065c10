//! Metric catalog parsing into structured worst-range rules.
//!
//! The catalog is a CSV table with at least the columns `Metric` and
//! `1 (Worst)`; `5 (Best)` is carried along for display. Worst-range cells
//! are free text such as `"< 0.2"`, `"> 12"` or the hand-typed `">0. 8"`.
//! Rows that cannot be parsed are dropped with a warning and recorded in
//! [`ThresholdRuleTable::rejected`]; they never abort the build.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::{ComparisonRule, MetricDefinition, OntoGuideError, Result};

/// Conventional suffix carried by some catalog keys (`ANOnto` vs `AN`).
pub const DEFAULT_METRIC_SUFFIX: &str = "Onto";

/// One raw catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "1 (Worst)")]
    pub worst: String,
    #[serde(rename = "5 (Best)", default)]
    pub best: Option<String>,
}

impl CatalogRow {
    pub fn new(metric: impl Into<String>, worst: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            worst: worst.into(),
            best: None,
        }
    }

    pub fn with_best(mut self, best: impl Into<String>) -> Self {
        self.best = Some(best.into());
        self
    }
}

fn threshold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([<>])\s*(-?(?:\d+(?:\s*\.\s*\d*)?|\.\s*\d+))").expect("static regex")
    })
}

/// Parse a worst-range cell into a comparison rule.
///
/// Only the leading number after the comparator is read; trailing text such
/// as `"> 12 classes"` is ignored. Stray spaces inside that number
/// (`">0. 8"`) are typos, not separators.
pub fn parse_worst_range(metric: &str, raw: &str) -> Result<ComparisonRule> {
    let text = raw.trim();
    let parse_err = |reason: &str| OntoGuideError::Parse {
        metric: metric.to_string(),
        text: raw.to_string(),
        reason: reason.to_string(),
    };

    let Some(caps) = threshold_re().captures(text) else {
        return Err(match text.chars().next() {
            Some('<' | '>') => parse_err("threshold is not a number"),
            Some(_) => parse_err("comparator must be `<` or `>`"),
            None => parse_err("expected a comparator followed by a number"),
        });
    };

    let number: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    let threshold: f64 = number
        .parse()
        .map_err(|_| parse_err("threshold is not a number"))?;
    if !threshold.is_finite() {
        return Err(parse_err("threshold is not finite"));
    }

    match &caps[1] {
        "<" => Ok(ComparisonRule::LessThan(threshold)),
        _ => Ok(ComparisonRule::GreaterThan(threshold)),
    }
}

/// Lookup keys for `name`: the literal name, then the name with `suffix`
/// stripped when present, otherwise appended.
pub(crate) fn suffix_candidates(name: &str, suffix: &str) -> Vec<String> {
    let mut out = vec![name.to_string()];
    if suffix.is_empty() {
        return out;
    }
    match name.strip_suffix(suffix) {
        Some(base) if !base.is_empty() => out.push(base.to_string()),
        _ => out.push(format!("{name}{suffix}")),
    }
    out
}

/// Immutable lookup table of worst-range rules, keyed by catalog name.
#[derive(Debug, Clone)]
pub struct ThresholdRuleTable {
    definitions: Vec<MetricDefinition>,
    index: HashMap<String, usize>,
    suffix: String,
    rejected: Vec<String>,
}

impl ThresholdRuleTable {
    /// Build a table from rows, dropping unparsable ones.
    pub fn from_rows<I>(rows: I, suffix: &str) -> Self
    where
        I: IntoIterator<Item = CatalogRow>,
    {
        let mut definitions = Vec::new();
        let mut index = HashMap::new();
        let mut rejected = Vec::new();

        for row in rows {
            let name = row.metric.trim().to_string();
            if name.is_empty() {
                continue;
            }
            match parse_worst_range(&name, &row.worst) {
                Ok(rule) => {
                    if index.contains_key(&name) {
                        warn!(metric = %name, "Duplicate catalog row; keeping the first");
                        continue;
                    }
                    index.insert(name.clone(), definitions.len());
                    definitions.push(MetricDefinition {
                        name,
                        rule,
                        worst_range: row.worst,
                        best_range: row.best.filter(|b| !b.trim().is_empty()),
                    });
                }
                Err(e) => {
                    warn!(metric = %name, error = %e, "Dropping catalog row");
                    rejected.push(name);
                }
            }
        }

        info!(
            loaded = definitions.len(),
            rejected = rejected.len(),
            "Loaded metric ranges"
        );

        Self {
            definitions,
            index,
            suffix: suffix.to_string(),
            rejected,
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R, suffix: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.deserialize::<CatalogRow>() {
            match record {
                Ok(row) => rows.push(row),
                Err(e) => warn!(error = %e, "Skipping unreadable catalog record"),
            }
        }
        Ok(Self::from_rows(rows, suffix))
    }

    pub fn from_csv_path(path: &Path, suffix: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, suffix)
    }

    /// Look a metric up by its literal name, then with the suffix appended,
    /// then with the suffix stripped.
    pub fn lookup(&self, name: &str) -> Result<&MetricDefinition> {
        suffix_candidates(name, &self.suffix)
            .into_iter()
            .find_map(|candidate| self.index.get(&candidate))
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| OntoGuideError::NotFound(format!("metric {name} is not in the catalog")))
    }


    /// Human-readable best/worst ranges for prompts and reports.
    pub fn range_info(&self, name: &str) -> String {
        match self.lookup(name) {
            Ok(def) => format!(
                "Best range (5): {}, Worst range (1): {}",
                def.best_range.as_deref().unwrap_or("Unknown"),
                def.worst_range
            ),
            Err(_) => "Range information not available".to_string(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Metric names whose rows were dropped during the build.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ThresholdRuleTable {
        ThresholdRuleTable::from_rows(
            vec![
                CatalogRow::new("ANOnto", "< 0.2").with_best("> 0.8"),
                CatalogRow::new("NOMOnto", "> 12"),
                CatalogRow::new("TMOnto2", ">0. 8"),
                CatalogRow::new("LCOMOnto", "between 1 and 2"),
            ],
            DEFAULT_METRIC_SUFFIX,
        )
    }

    #[test]
    fn test_typo_threshold_parses_as_fraction() {
        let rule = parse_worst_range("TMOnto2", ">0. 8").unwrap();
        assert_eq!(rule, ComparisonRule::GreaterThan(0.8));
        let rule = parse_worst_range("X", ">0 .8").unwrap();
        assert_eq!(rule, ComparisonRule::GreaterThan(0.8));
        let rule = parse_worst_range("X", "< 0.2 (low)").unwrap();
        assert_eq!(rule, ComparisonRule::LessThan(0.2));
        let rule = parse_worst_range("NOMOnto", "> 12 classes").unwrap();
        assert_eq!(rule, ComparisonRule::GreaterThan(12.0));
        let rule = parse_worst_range("X", "<.5").unwrap();
        assert_eq!(rule, ComparisonRule::LessThan(0.5));
    }

    #[test]
    fn test_unparsable_rows_are_dropped_not_fatal() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.rejected(), &["LCOMOnto".to_string()]);
        assert!(parse_worst_range("X", "= 3").is_err());
        assert!(parse_worst_range("X", "<").is_err());
        assert!(parse_worst_range("X", "< low").is_err());
        assert!(parse_worst_range("X", "").is_err());
    }

    #[test]
    fn test_lookup_tolerates_suffix_on_either_side() {
        let t = table();
        assert_eq!(t.lookup("ANOnto").unwrap().name, "ANOnto");
        assert_eq!(t.lookup("AN").unwrap().name, "ANOnto");
        assert_eq!(t.lookup("TMOnto2").unwrap().name, "TMOnto2");

        let t = ThresholdRuleTable::from_rows(
            vec![CatalogRow::new("WMC", "> 5")],
            DEFAULT_METRIC_SUFFIX,
        );
        assert_eq!(t.lookup("WMCOnto").unwrap().name, "WMC");
    }

    #[test]
    fn test_lookup_miss_is_not_found() {
        let err = table().lookup("RFCOnto").unwrap_err();
        assert!(matches!(err, OntoGuideError::NotFound(_)));
    }

    #[test]
    fn test_range_info() {
        let t = table();
        assert_eq!(
            t.range_info("AN"),
            "Best range (5): > 0.8, Worst range (1): < 0.2"
        );
        assert_eq!(
            t.range_info("NOMOnto"),
            "Best range (5): Unknown, Worst range (1): > 12"
        );
        assert_eq!(t.range_info("Nope"), "Range information not available");
    }

    #[test]
    fn test_from_csv_reader() {
        let csv = "Metric,1 (Worst),2,3,4,5 (Best)\n\
                   ANOnto,< 0.2,,,,> 0.8\n\
                   NOMOnto,> 12,,,,<= 2\n\
                   \"CBOOnto\",\">0. 8\",,,,\n";
        let t = ThresholdRuleTable::from_csv_reader(csv.as_bytes(), DEFAULT_METRIC_SUFFIX).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(
            t.lookup("CBO").unwrap().rule,
            ComparisonRule::GreaterThan(0.8)
        );
        assert!(t.lookup("CBOOnto").unwrap().best_range.is_none());
    }
}
