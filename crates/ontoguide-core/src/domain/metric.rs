//! Metric definitions, scored metrics and the scored-metrics document.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::error::{OntoGuideError, Result};

/// Comparison that places a metric value in its worst range.
///
/// Both comparisons are strict: a value equal to the threshold is never worst.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "threshold", rename_all = "snake_case")]
pub enum ComparisonRule {
    LessThan(f64),
    GreaterThan(f64),
}

impl ComparisonRule {
    /// Whether `value` falls in the worst range.
    pub fn is_worst(&self, value: f64) -> bool {
        match *self {
            Self::LessThan(threshold) => value < threshold,
            Self::GreaterThan(threshold) => value > threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        match *self {
            Self::LessThan(t) | Self::GreaterThan(t) => t,
        }
    }
}

impl fmt::Display for ComparisonRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LessThan(t) => write!(f, "< {t}"),
            Self::GreaterThan(t) => write!(f, "> {t}"),
        }
    }
}

/// One catalog entry. Immutable once the rule table is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Catalog key, e.g. `ANOnto`.
    pub name: String,
    pub rule: ComparisonRule,
    /// Raw `1 (Worst)` text as it appeared in the catalog.
    pub worst_range: String,
    /// Raw `5 (Best)` text, when the catalog carries one.
    pub best_range: Option<String>,
}

/// A metric value produced by the external scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMetric {
    pub name: String,
    pub value: f64,
}

impl ScoredMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A scored metric after its catalog rule was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMetric {
    pub name: String,
    pub value: f64,
    /// Catalog key the metric matched (may differ from `name` by suffix).
    pub catalog_key: String,
    pub is_worst: bool,
    /// Sort key; smaller is more severe.
    pub severity_key: f64,
    /// Position in the worst ordering (0 = most severe); `None` when not worst.
    pub severity_rank: Option<usize>,
}

impl ClassifiedMetric {
    pub fn as_scored(&self) -> ScoredMetric {
        ScoredMetric::new(self.name.clone(), self.value)
    }
}

/// Default reserved non-metric keys of a scored-metrics document.
pub const DEFAULT_RESERVED_KEYS: [&str; 2] = ["name", "timestamp"];

/// Parsed scored-metrics document.
///
/// The `metrics` mapping keeps the document's key order. Reserved keys such
/// as `name` or `timestamp` are kept here when numeric; the classifier is
/// responsible for skipping them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredMetricsDocument {
    pub name: Option<String>,
    pub timestamp: Option<String>,
    pub metrics: Vec<ScoredMetric>,
    pub subcharacteristics: Vec<ScoredMetric>,
    /// Non-reserved keys whose values could not be read as numbers.
    pub skipped: Vec<String>,
}

impl ScoredMetricsDocument {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let reserved: Vec<String> = DEFAULT_RESERVED_KEYS.iter().map(|s| s.to_string()).collect();
        Self::from_json_str_with_reserved(raw, &reserved)
    }

    /// Parse, staying quiet about non-numeric values under `reserved` keys.
    pub fn from_json_str_with_reserved(raw: &str, reserved: &[String]) -> Result<Self> {
        let root: Value = serde_json::from_str(raw)?;
        let obj = root
            .as_object()
            .ok_or_else(|| OntoGuideError::Document("top level must be an object".to_string()))?;

        let metrics_obj = obj
            .get("metrics")
            .and_then(Value::as_object)
            .ok_or_else(|| OntoGuideError::Document("missing `metrics` mapping".to_string()))?;

        // Identity fields may live at the top level or inside `metrics`.
        let mut doc = Self {
            name: text_field(obj.get("name")).or_else(|| text_field(metrics_obj.get("name"))),
            timestamp: text_field(obj.get("timestamp"))
                .or_else(|| text_field(metrics_obj.get("timestamp"))),
            ..Self::default()
        };

        for (key, value) in metrics_obj {
            match numeric_value(value) {
                Some(v) => doc.metrics.push(ScoredMetric::new(key.clone(), v)),
                None if reserved.iter().any(|k| k == key) => {}
                None => {
                    warn!(metric = %key, value = %value, "Skipping non-numeric metric value");
                    doc.skipped.push(key.clone());
                }
            }
        }

        if let Some(subchars) = obj.get("subcharacteristics").and_then(Value::as_object) {
            for (key, value) in subchars {
                if let Some(v) = numeric_value(value) {
                    doc.subcharacteristics.push(ScoredMetric::new(key.clone(), v));
                }
            }
        }

        Ok(doc)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_path_with_reserved(path: &Path, reserved: &[String]) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str_with_reserved(&raw, reserved)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_less_than_boundary_is_exclusive() {
        let rule = ComparisonRule::LessThan(0.2);
        assert!(rule.is_worst(0.19));
        assert!(!rule.is_worst(0.2));
        assert!(!rule.is_worst(0.21));
    }

    #[test]
    fn test_greater_than_boundary_is_exclusive() {
        let rule = ComparisonRule::GreaterThan(12.0);
        assert!(!rule.is_worst(12.0));
        assert!(rule.is_worst(12.1));
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(ComparisonRule::LessThan(0.2).to_string(), "< 0.2");
        assert_eq!(ComparisonRule::GreaterThan(12.0).to_string(), "> 12");
    }

    #[test]
    fn test_document_keeps_key_order_and_skips_text() {
        let raw = r#"{
            "metrics": {
                "name": "pizza",
                "timestamp": "2024-01-01T00:00:00",
                "WMCOnto": 3.5,
                "ANOnto": "0.25",
                "NOMOnto": null,
                "AROnto": 0.1
            },
            "subcharacteristics": {"Modularity": 2.0}
        }"#;
        let doc = ScoredMetricsDocument::from_json_str(raw).unwrap();
        let names: Vec<&str> = doc.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["WMCOnto", "ANOnto", "AROnto"]);
        assert_eq!(doc.name.as_deref(), Some("pizza"));
        assert_eq!(doc.get("ANOnto"), Some(0.25));
        assert_eq!(doc.skipped, vec!["NOMOnto".to_string()]);
        assert_eq!(doc.subcharacteristics.len(), 1);
    }

    #[test]
    fn test_configured_reserved_keys_are_not_reported_as_skipped() {
        let raw = r#"{"metrics": {"name": "pizza", "source": "pizza.owl", "ANOnto": 0.1}}"#;

        let doc = ScoredMetricsDocument::from_json_str(raw).unwrap();
        assert_eq!(doc.skipped, vec!["source".to_string()]);

        let reserved = vec!["name".to_string(), "source".to_string()];
        let doc = ScoredMetricsDocument::from_json_str_with_reserved(raw, &reserved).unwrap();
        assert!(doc.skipped.is_empty());
        assert_eq!(doc.metrics, vec![ScoredMetric::new("ANOnto", 0.1)]);
    }

    #[test]
    fn test_document_requires_metrics_mapping() {
        let err = ScoredMetricsDocument::from_json_str(r#"{"scores": {}}"#).unwrap_err();
        assert!(matches!(err, OntoGuideError::Document(_)));
    }
}
