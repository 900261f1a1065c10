//! TOML configuration with environment overrides.
//!
//! Resolution order: built-in defaults, then the TOML file (when given),
//! then `ONTOGUIDE_*` environment variables. Command-line flags are applied
//! by the binary on top of the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::DEFAULT_METRIC_SUFFIX;
use crate::classifier::{SeverityPolicy, DEFAULT_ASCENDING_PREFIXES, DEFAULT_RESERVED_KEYS};
use crate::domain::{ExtractionMethod, OntoGuideError, Result};
use crate::orchestrator::{ExtractionSettings, DEFAULT_TOP_LEVEL_LIMIT};
use crate::tie_break::{
    TieBreakResolver, FALLBACK_LOWEST_COUNT, MODULE_SELECTION_WINDOW, REPORTING_WINDOW,
};

pub const ENV_ROBOT_BIN: &str = "ONTOGUIDE_ROBOT_BIN";
pub const ENV_OUTPUT_DIR: &str = "ONTOGUIDE_OUTPUT_DIR";
pub const ENV_CATALOG: &str = "ONTOGUIDE_CATALOG";
pub const ENV_DESCRIPTIONS: &str = "ONTOGUIDE_DESCRIPTIONS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub catalog: PathBuf,
    /// Optional `Metric_Name,Description` table; missing means no descriptions.
    pub descriptions: PathBuf,
    pub output_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("metrics_catalog.csv"),
            descriptions: PathBuf::from("metric_descriptions.csv"),
            output_dir: PathBuf::from("modules"),
            scratch_dir: std::env::temp_dir().join("ontoguide"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub suffix: String,
    pub reserved_keys: Vec<String>,
    /// Name prefixes for which a lower value is more severe.
    pub ascending_prefixes: Vec<String>,
    pub module_window: usize,
    pub report_window: usize,
    pub fallback_lowest: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_METRIC_SUFFIX.to_string(),
            reserved_keys: DEFAULT_RESERVED_KEYS.iter().map(|s| s.to_string()).collect(),
            ascending_prefixes: DEFAULT_ASCENDING_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            module_window: MODULE_SELECTION_WINDOW,
            report_window: REPORTING_WINDOW,
            fallback_lowest: FALLBACK_LOWEST_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub method: ExtractionMethod,
    pub robot_bin: String,
    pub tool_timeout_secs: u64,
    pub top_level_limit: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            method: ExtractionMethod::Top,
            robot_bin: "robot".to_string(),
            tool_timeout_secs: 600,
            top_level_limit: DEFAULT_TOP_LEVEL_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub max_concurrent: usize,
    pub deadline_secs: Option<u64>,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            deadline_secs: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntoGuideConfig {
    pub paths: PathsConfig,
    pub selection: SelectionConfig,
    pub extraction: ExtractionConfig,
    pub concurrency: ConcurrencyConfig,
}

impl OntoGuideConfig {
    /// Defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    OntoGuideError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                debug!(path = %path.display(), "Loaded configuration file");
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| OntoGuideError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| OntoGuideError::Config(e.to_string()))
    }

    /// Apply `ONTOGUIDE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bin) = set(ENV_ROBOT_BIN) {
            self.extraction.robot_bin = bin;
        }
        if let Some(dir) = set(ENV_OUTPUT_DIR) {
            self.paths.output_dir = PathBuf::from(dir);
        }
        if let Some(catalog) = set(ENV_CATALOG) {
            self.paths.catalog = PathBuf::from(catalog);
        }
        if let Some(descriptions) = set(ENV_DESCRIPTIONS) {
            self.paths.descriptions = PathBuf::from(descriptions);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.selection;
        if s.suffix.is_empty() {
            return Err(OntoGuideError::Config("selection.suffix must not be empty".into()));
        }
        if s.module_window == 0 || s.report_window == 0 {
            return Err(OntoGuideError::Config("selection windows must be positive".into()));
        }
        if self.concurrency.max_concurrent == 0 {
            return Err(OntoGuideError::Config(
                "concurrency.max_concurrent must be positive".into(),
            ));
        }
        if self.extraction.robot_bin.trim().is_empty() {
            return Err(OntoGuideError::Config("extraction.robot_bin must be set".into()));
        }
        if self.extraction.tool_timeout_secs == 0 {
            return Err(OntoGuideError::Config(
                "extraction.tool_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn severity_policy(&self) -> SeverityPolicy {
        SeverityPolicy::new(self.selection.ascending_prefixes.iter().cloned())
    }

    pub fn module_selector(&self) -> TieBreakResolver {
        TieBreakResolver {
            top_n: self.selection.module_window,
            selection_index: 0,
            fallback_count: self.selection.fallback_lowest,
        }
    }

    pub fn extraction_settings(&self) -> ExtractionSettings {
        ExtractionSettings {
            method: self.extraction.method,
            output_dir: self.paths.output_dir.clone(),
            scratch_dir: self.paths.scratch_dir.clone(),
            top_level_limit: self.extraction.top_level_limit,
            suffix: self.selection.suffix.clone(),
            max_concurrent: self.concurrency.max_concurrent,
            deadline: self.concurrency.deadline_secs.map(Duration::from_secs),
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction.tool_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OntoGuideConfig::default();
        config.validate().unwrap();
        assert_eq!(config.selection.module_window, 3);
        assert_eq!(config.selection.report_window, 5);
        assert_eq!(config.extraction.method, ExtractionMethod::Top);
        assert_eq!(config.extraction.top_level_limit, 10);
        assert!(config.severity_policy().lower_is_more_severe("ANOnto"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = OntoGuideConfig::from_toml_str(
            r#"
            [extraction]
            method = "STAR"

            [concurrency]
            deadline_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.extraction.method, ExtractionMethod::Star);
        assert_eq!(config.extraction.robot_bin, "robot");
        assert_eq!(
            config.extraction_settings().deadline,
            Some(Duration::from_secs(30))
        );
        assert_eq!(config.selection.suffix, "Onto");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = OntoGuideConfig::default();
        config.apply_overrides(|key| match key {
            ENV_ROBOT_BIN => Some("/opt/robot/bin/robot".to_string()),
            ENV_OUTPUT_DIR => Some("   ".to_string()),
            ENV_DESCRIPTIONS => Some("/etc/ontoguide/descriptions.csv".to_string()),
            _ => None,
        });
        assert_eq!(config.extraction.robot_bin, "/opt/robot/bin/robot");
        assert_eq!(config.paths.output_dir, PathBuf::from("modules"));
        assert_eq!(
            config.paths.descriptions,
            PathBuf::from("/etc/ontoguide/descriptions.csv")
        );
    }

    #[test]
    fn test_validate_rejects_zero_windows() {
        let mut config = OntoGuideConfig::default();
        config.selection.module_window = 0;
        assert!(matches!(config.validate(), Err(OntoGuideError::Config(_))));

        let mut config = OntoGuideConfig::default();
        config.concurrency.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontoguide.toml");
        std::fs::write(&path, "[selection]\nascending_prefixes = [\"LOW\"]\n").unwrap();

        let config = OntoGuideConfig::load(Some(&path)).unwrap();
        assert!(config.severity_policy().lower_is_more_severe("LOWX"));
        assert!(!config.severity_policy().lower_is_more_severe("ANOnto"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = OntoGuideConfig::default();
        let raw = config.to_toml_string().unwrap();
        assert_eq!(OntoGuideConfig::from_toml_str(&raw).unwrap(), config);
    }
}
