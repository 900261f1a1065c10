//! Worst-metric classification and severity ordering.
//!
//! Each scored metric is matched against the [`ThresholdRuleTable`]; metrics
//! without a catalog rule are excluded rather than treated as errors. Worst
//! metrics are ordered by a severity key whose direction depends on the
//! metric's name prefix, see [`SeverityPolicy`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ThresholdRuleTable;
use crate::domain::{ClassifiedMetric, ScoredMetric};

pub use crate::domain::DEFAULT_RESERVED_KEYS;

/// Default prefix families for which a lower value is more severe.
pub const DEFAULT_ASCENDING_PREFIXES: [&str; 2] = ["AN", "AR"];

/// Direction of the severity sort, keyed on metric name prefix.
///
/// Metrics whose name starts with one of `ascending_prefixes` are ordered by
/// ascending value (lower is more severe); every other metric by descending
/// value (higher is more severe).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    pub ascending_prefixes: Vec<String>,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ASCENDING_PREFIXES)
    }
}

impl SeverityPolicy {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ascending_prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lower_is_more_severe(&self, name: &str) -> bool {
        self.ascending_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Sort key where smaller means more severe.
    pub fn severity_key(&self, name: &str, value: f64) -> f64 {
        if self.lower_is_more_severe(name) {
            value
        } else {
            -value
        }
    }
}

/// Output of one classification pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Every metric that matched a catalog rule, in document order.
    pub classified: Vec<ClassifiedMetric>,
    /// Worst metrics, most severe first.
    pub worst: Vec<ClassifiedMetric>,
    /// Metrics with no catalog rule.
    pub unmatched: Vec<String>,
    /// Every non-reserved scored metric, regardless of catalog coverage.
    pub scored: Vec<ScoredMetric>,
}

impl ClassificationReport {
    pub fn worst_scored(&self) -> Vec<ScoredMetric> {
        self.worst.iter().map(ClassifiedMetric::as_scored).collect()
    }

    /// The `limit` lowest-scoring metrics, ignoring catalog rules.
    pub fn lowest_scoring(&self, limit: usize) -> Vec<ScoredMetric> {
        let mut all = self.scored.clone();
        all.sort_by(|a, b| a.value.total_cmp(&b.value));
        all.truncate(limit);
        all
    }

    /// Worst metric names with the catalog suffix removed.
    pub fn worst_base_names(&self, suffix: &str) -> Vec<String> {
        self.worst
            .iter()
            .map(|m| {
                m.catalog_key
                    .strip_suffix(suffix)
                    .filter(|base| !base.is_empty())
                    .unwrap_or(m.catalog_key.as_str())
                    .to_string()
            })
            .collect()
    }
}

/// Applies catalog rules to scored metrics.
#[derive(Debug, Clone, Copy)]
pub struct WorstMetricClassifier<'a> {
    table: &'a ThresholdRuleTable,
    policy: &'a SeverityPolicy,
    reserved_keys: &'a [String],
}

impl<'a> WorstMetricClassifier<'a> {
    pub fn new(
        table: &'a ThresholdRuleTable,
        policy: &'a SeverityPolicy,
        reserved_keys: &'a [String],
    ) -> Self {
        Self {
            table,
            policy,
            reserved_keys,
        }
    }

    fn is_reserved(&self, name: &str) -> bool {
        self.reserved_keys.iter().any(|k| k == name)
    }

    /// Classify `metrics`. Pure: the same input always yields the same
    /// report, including the order of the worst list.
    pub fn classify(&self, metrics: &[ScoredMetric]) -> ClassificationReport {
        let mut report = ClassificationReport::default();

        for metric in metrics {
            if self.is_reserved(&metric.name) {
                continue;
            }
            report.scored.push(metric.clone());

            let definition = match self.table.lookup(&metric.name) {
                Ok(def) => def,
                Err(_) => {
                    debug!(metric = %metric.name, "No catalog rule; excluded from classification");
                    report.unmatched.push(metric.name.clone());
                    continue;
                }
            };

            report.classified.push(ClassifiedMetric {
                name: metric.name.clone(),
                value: metric.value,
                catalog_key: definition.name.clone(),
                is_worst: definition.rule.is_worst(metric.value),
                severity_key: self.policy.severity_key(&metric.name, metric.value),
                severity_rank: None,
            });
        }

        let mut worst: Vec<ClassifiedMetric> = report
            .classified
            .iter()
            .filter(|m| m.is_worst)
            .cloned()
            .collect();
        // Stable: equal keys keep document order.
        worst.sort_by(|a, b| a.severity_key.total_cmp(&b.severity_key));

        for (rank, entry) in worst.iter_mut().enumerate() {
            entry.severity_rank = Some(rank);
            if let Some(c) = report.classified.iter_mut().find(|c| c.name == entry.name) {
                c.severity_rank = Some(rank);
            }
        }
        report.worst = worst;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogRow, DEFAULT_METRIC_SUFFIX};

    fn reserved() -> Vec<String> {
        DEFAULT_RESERVED_KEYS.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> ThresholdRuleTable {
        ThresholdRuleTable::from_rows(
            vec![
                CatalogRow::new("ANOnto", "< 0.2"),
                CatalogRow::new("AROnto", "< 0.5"),
                CatalogRow::new("NOMOnto", "> 12"),
                CatalogRow::new("WMCOnto", "> 5"),
                CatalogRow::new("name", "> 0"),
            ],
            DEFAULT_METRIC_SUFFIX,
        )
    }

    #[test]
    fn test_prefix_policy_direction() {
        let policy = SeverityPolicy::default();
        assert!(policy.lower_is_more_severe("ANOnto"));
        assert!(policy.lower_is_more_severe("AROnto"));
        assert!(!policy.lower_is_more_severe("NOMOnto"));
        assert_eq!(policy.severity_key("AN", 0.1), 0.1);
        assert_eq!(policy.severity_key("NOM", 20.0), -20.0);
    }

    #[test]
    fn test_classify_orders_by_dual_severity_key() {
        let t = table();
        let policy = SeverityPolicy::default();
        let reserved = reserved();
        let classifier = WorstMetricClassifier::new(&t, &policy, &reserved);

        let metrics = vec![
            ScoredMetric::new("name", 3.0),
            ScoredMetric::new("ANOnto", 0.1),
            ScoredMetric::new("NOM", 20.0),
            ScoredMetric::new("AROnto", 0.3),
            ScoredMetric::new("WMCOnto", 6.0),
            ScoredMetric::new("RFCOnto", 99.0),
        ];
        let report = classifier.classify(&metrics);

        let order: Vec<&str> = report.worst.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(order, vec!["NOM", "WMCOnto", "ANOnto", "AROnto"]);
        assert_eq!(report.worst[0].severity_rank, Some(0));
        assert_eq!(report.worst[0].catalog_key, "NOMOnto");
        assert_eq!(report.unmatched, vec!["RFCOnto".to_string()]);
        assert!(report.scored.iter().all(|m| m.name != "name"));
    }

    #[test]
    fn test_non_worst_metrics_have_no_rank() {
        let t = table();
        let policy = SeverityPolicy::default();
        let reserved = reserved();
        let classifier = WorstMetricClassifier::new(&t, &policy, &reserved);

        let report = classifier.classify(&[ScoredMetric::new("ANOnto", 0.2)]);
        assert_eq!(report.classified.len(), 1);
        assert!(!report.classified[0].is_worst);
        assert!(report.classified[0].severity_rank.is_none());
        assert!(report.worst.is_empty());
    }

    #[test]
    fn test_lowest_scoring_ignores_rules() {
        let t = table();
        let policy = SeverityPolicy::default();
        let reserved = reserved();
        let classifier = WorstMetricClassifier::new(&t, &policy, &reserved);

        let metrics: Vec<ScoredMetric> = (0..7)
            .map(|i| ScoredMetric::new(format!("M{i}"), f64::from(7 - i)))
            .collect();
        let report = classifier.classify(&metrics);
        let lowest = report.lowest_scoring(5);
        assert_eq!(lowest.len(), 5);
        assert_eq!(lowest[0].name, "M6");
        assert_eq!(lowest[4].name, "M2");
    }

    #[test]
    fn test_worst_base_names_strip_suffix() {
        let t = table();
        let policy = SeverityPolicy::default();
        let reserved = reserved();
        let classifier = WorstMetricClassifier::new(&t, &policy, &reserved);
        let report = classifier.classify(&[
            ScoredMetric::new("ANOnto", 0.0),
            ScoredMetric::new("NOM", 13.0),
        ]);
        assert_eq!(report.worst_base_names("Onto"), vec!["NOM", "AN"]);
    }
}
