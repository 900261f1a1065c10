//! Reporting-context view of a classification.

use serde::{Deserialize, Serialize};

use crate::catalog::ThresholdRuleTable;
use crate::classifier::ClassificationReport;
use crate::descriptions::MetricDescriptions;
use crate::domain::{ScoredMetric, ScoredMetricsDocument, SeedTermDocument};
use crate::seed_terms::SeedTermResolver;
use crate::tie_break::REPORTING_WINDOW;

/// Length of the highest-scoring, lowest-subcharacteristic and seed label
/// lists.
pub const SUMMARY_LIST_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstMetricEntry {
    pub name: String,
    pub value: f64,
    pub range_info: String,
    pub description: String,
    /// Display labels of the metric's seed terms.
    pub seed_terms: Vec<String>,
}

/// Worst, best and overall metric listing for one scored ontology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub ontology: Option<String>,
    pub timestamp: Option<String>,
    /// Most severe first, at most `window` entries.
    pub worst: Vec<WorstMetricEntry>,
    /// Highest values, descending.
    pub highest: Vec<ScoredMetric>,
    /// Lowest subcharacteristics, ascending.
    pub lowest_subcharacteristics: Vec<ScoredMetric>,
    pub all_metrics: Vec<ScoredMetric>,
}

impl MetricsSummary {
    pub fn build(
        document: &ScoredMetricsDocument,
        classification: &ClassificationReport,
        table: &ThresholdRuleTable,
        descriptions: &MetricDescriptions,
        seeds: Option<&SeedTermDocument>,
        window: usize,
    ) -> Self {
        let resolver = seeds.map(|doc| SeedTermResolver::new(doc, table.suffix()));

        let worst = classification
            .worst
            .iter()
            .take(window)
            .map(|m| WorstMetricEntry {
                name: m.name.clone(),
                value: m.value,
                range_info: table.range_info(&m.name),
                description: descriptions.describe(&m.name),
                seed_terms: resolver
                    .map(|r| r.resolve(&m.name).labels(SUMMARY_LIST_LEN))
                    .unwrap_or_default(),
            })
            .collect();

        let mut highest = classification.scored.clone();
        highest.sort_by(|a, b| b.value.total_cmp(&a.value));
        highest.truncate(SUMMARY_LIST_LEN);

        let mut lowest_subcharacteristics = document.subcharacteristics.clone();
        lowest_subcharacteristics.sort_by(|a, b| a.value.total_cmp(&b.value));
        lowest_subcharacteristics.truncate(SUMMARY_LIST_LEN);

        Self {
            ontology: document.name.clone(),
            timestamp: document.timestamp.clone(),
            worst,
            highest,
            lowest_subcharacteristics,
            all_metrics: classification.scored.clone(),
        }
    }

    /// Summary using the default reporting window.
    pub fn for_reporting(
        document: &ScoredMetricsDocument,
        classification: &ClassificationReport,
        table: &ThresholdRuleTable,
        descriptions: &MetricDescriptions,
        seeds: Option<&SeedTermDocument>,
    ) -> Self {
        Self::build(
            document,
            classification,
            table,
            descriptions,
            seeds,
            REPORTING_WINDOW,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogRow, DEFAULT_METRIC_SUFFIX};
    use crate::classifier::{SeverityPolicy, WorstMetricClassifier, DEFAULT_RESERVED_KEYS};

    #[test]
    fn test_summary_lists() {
        let table = ThresholdRuleTable::from_rows(
            vec![
                CatalogRow::new("ANOnto", "< 0.2").with_best("> 0.8"),
                CatalogRow::new("NOMOnto", "> 12"),
            ],
            DEFAULT_METRIC_SUFFIX,
        );
        let document = ScoredMetricsDocument::from_json_str(
            r#"{
                "name": "pizza",
                "metrics": {"ANOnto": 0.1, "NOMOnto": "20", "A": 1, "B": 2, "C": 3, "D": 4, "E": 5},
                "subcharacteristics": {"Structural": 3.5, "Functional": 1.0}
            }"#,
        )
        .unwrap();
        let seeds = SeedTermDocument::from_json_str(
            r#"{"AN": [{"term": "Topping", "iri": "obo:PIZZA_2"}]}"#,
        )
        .unwrap();

        let policy = SeverityPolicy::default();
        let reserved: Vec<String> = DEFAULT_RESERVED_KEYS.iter().map(|s| s.to_string()).collect();
        let classification =
            WorstMetricClassifier::new(&table, &policy, &reserved).classify(&document.metrics);

        let descriptions = MetricDescriptions::from_pairs(
            [("NOM", "Number of properties per class")],
            DEFAULT_METRIC_SUFFIX,
        );

        let summary = MetricsSummary::for_reporting(
            &document,
            &classification,
            &table,
            &descriptions,
            Some(&seeds),
        );

        assert_eq!(summary.ontology.as_deref(), Some("pizza"));
        assert_eq!(summary.worst.len(), 2);
        assert_eq!(summary.worst[0].name, "NOMOnto");
        assert_eq!(summary.worst[0].description, "Number of properties per class");
        assert_eq!(summary.worst[1].description, "No description available");
        assert_eq!(summary.worst[1].seed_terms, vec!["Topping"]);
        assert_eq!(
            summary.worst[1].range_info,
            "Best range (5): > 0.8, Worst range (1): < 0.2"
        );
        assert_eq!(summary.highest.len(), 5);
        assert_eq!(summary.highest[0].name, "NOMOnto");
        assert_eq!(summary.lowest_subcharacteristics[0].name, "Functional");
        assert_eq!(summary.all_metrics.len(), 7);
    }
}
