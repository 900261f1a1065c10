//! Human-readable metric descriptions.
//!
//! Loaded from a CSV table with the columns `Metric_Name` and `Description`
//! and looked up with the same suffix tolerance as the threshold catalog.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::suffix_candidates;
use crate::domain::Result;

/// Text shown when a metric has no description.
pub const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Deserialize)]
struct DescriptionRow {
    #[serde(rename = "Metric_Name")]
    metric: String,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MetricDescriptions {
    entries: HashMap<String, String>,
    suffix: String,
}

impl MetricDescriptions {
    pub fn from_pairs<I, K, V>(pairs: I, suffix: &str) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = HashMap::new();
        for (name, text) in pairs {
            let name = name.into().trim().to_string();
            let text = text.into().trim().to_string();
            if name.is_empty() || text.is_empty() {
                continue;
            }
            entries.entry(name).or_insert(text);
        }
        Self {
            entries,
            suffix: suffix.to_string(),
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R, suffix: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut pairs = Vec::new();
        for record in csv_reader.deserialize::<DescriptionRow>() {
            match record {
                Ok(row) => {
                    if let Some(text) = row.description {
                        pairs.push((row.metric, text));
                    }
                }
                Err(e) => warn!(error = %e, "Skipping unreadable description record"),
            }
        }
        let descriptions = Self::from_pairs(pairs, suffix);
        info!(loaded = descriptions.len(), "Loaded metric descriptions");
        Ok(descriptions)
    }

    pub fn from_csv_path(path: &Path, suffix: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, suffix)
    }

    /// Like [`Self::from_csv_path`], but a missing or unreadable file yields
    /// an empty table. Descriptions are display-only.
    pub fn load_or_empty(path: &Path, suffix: &str) -> Self {
        match Self::from_csv_path(path, suffix) {
            Ok(descriptions) => descriptions,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No metric descriptions");
                Self {
                    suffix: suffix.to_string(),
                    ..Self::default()
                }
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        suffix_candidates(name, &self.suffix)
            .iter()
            .find_map(|candidate| self.entries.get(candidate))
            .map(String::as_str)
    }

    /// Description of `name`, or [`NO_DESCRIPTION`].
    pub fn describe(&self, name: &str) -> String {
        self.lookup(name).unwrap_or(NO_DESCRIPTION).to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
