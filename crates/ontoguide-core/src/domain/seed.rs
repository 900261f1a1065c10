//! Seed terms and the per-metric seed-term document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{OntoGuideError, Result};

/// A candidate concept used to seed module extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTerm {
    /// Display name.
    pub label: String,
    /// Normalized identifier; `None` when the source entry carried no IRI.
    pub iri: Option<String>,
    /// Set by the identifier normalizer. Invalid terms never reach the tool.
    pub valid: bool,
}

impl SeedTerm {
    /// A term whose IRI is already known to be valid.
    pub fn trusted(label: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            iri: Some(iri.into()),
            valid: true,
        }
    }

    /// The identifier, only when the term is usable.
    pub fn usable_iri(&self) -> Option<&str> {
        if self.valid {
            self.iri.as_deref()
        } else {
            None
        }
    }
}

/// One `{term, iri}` pair as written in the seed-term document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTermEntry {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub iri: Option<String>,
}

/// Mapping of metric name to its ordered candidate terms.
///
/// Key order of the source document is preserved; the substring fallback
/// of the resolver depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTermDocument {
    entries: Vec<(String, Vec<SeedTermEntry>)>,
}

impl SeedTermDocument {
    pub fn new(entries: Vec<(String, Vec<SeedTermEntry>)>) -> Self {
        Self { entries }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let terms: Vec<SeedTermEntry> = serde_json::from_value(value).map_err(|e| {
                OntoGuideError::Document(format!("seed terms for {key} are malformed: {e}"))
            })?;
            entries.push((key, terms));
        }
        Ok(Self { entries })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn get(&self, key: &str) -> Option<&[SeedTermEntry]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
