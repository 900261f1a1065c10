//! Expansion of a single worst pick into its full tie group.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::ClassificationReport;
use crate::domain::ScoredMetric;

/// Selection window used when choosing metrics for module extraction.
pub const MODULE_SELECTION_WINDOW: usize = 3;

/// Window used when listing worst metrics in reports.
pub const REPORTING_WINDOW: usize = 5;

/// Number of lowest-scoring metrics used when nothing is in a worst range.
pub const FALLBACK_LOWEST_COUNT: usize = 5;

/// Metrics sharing the severity of the selected entry.
///
/// A singleton pick is a group of one; [`TieGroup::is_tied`] is true only
/// with two or more members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieGroup {
    pub members: Vec<ScoredMetric>,
    /// True when members came from the lowest-scoring fallback rather than
    /// from catalog worst ranges.
    pub from_fallback: bool,
}

impl TieGroup {
    pub fn is_tied(&self) -> bool {
        self.members.len() >= 2
    }

    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Picks the entry at `selection_index` within the first `top_n` ranked
/// metrics and returns every windowed entry with exactly the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieBreakResolver {
    pub top_n: usize,
    pub selection_index: usize,
    pub fallback_count: usize,
}

impl Default for TieBreakResolver {
    fn default() -> Self {
        Self::for_module_selection()
    }
}

impl TieBreakResolver {
    pub fn for_module_selection() -> Self {
        Self {
            top_n: MODULE_SELECTION_WINDOW,
            selection_index: 0,
            fallback_count: FALLBACK_LOWEST_COUNT,
        }
    }

    pub fn for_reporting() -> Self {
        Self {
            top_n: REPORTING_WINDOW,
            ..Self::for_module_selection()
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_selection_index(mut self, index: usize) -> Self {
        self.selection_index = index;
        self
    }

    /// The ranked entries inside the selection window.
    pub fn window<'r>(&self, ranked: &'r [ScoredMetric]) -> &'r [ScoredMetric] {
        &ranked[..self.top_n.min(ranked.len())]
    }

    /// Resolve the tie group within a severity-ordered list.
    ///
    /// Returns `None` only when `ranked` (or the window) is empty.
    pub fn resolve(&self, ranked: &[ScoredMetric]) -> Option<TieGroup> {
        let window = self.window(ranked);
        if window.is_empty() {
            return None;
        }

        let index = if self.selection_index < window.len() {
            self.selection_index
        } else {
            warn!(
                selection = self.selection_index,
                available = window.len(),
                "Selection outside window; using the worst metric"
            );
            0
        };
        let selected = window[index].value;

        let members: Vec<ScoredMetric> = window
            .iter()
            .filter(|m| m.value == selected)
            .cloned()
            .collect();

        if members.len() > 1 {
            let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
            info!(tied = %names.join(", "), "Found tied metrics with the same score");
        }

        Some(TieGroup {
            members,
            from_fallback: false,
        })
    }

    /// Select the metrics to extract modules for.
    ///
    /// Uses the worst list when non-empty; otherwise degrades to the
    /// `fallback_count` lowest-scoring metrics regardless of catalog rules.
    pub fn select(&self, report: &ClassificationReport) -> Option<TieGroup> {
        let worst = report.worst_scored();
        if !worst.is_empty() {
            return self.resolve(&worst);
        }

        warn!("No worst metrics found; using lowest scoring metrics instead");
        let lowest = report.lowest_scoring(self.fallback_count);
        self.resolve(&lowest).map(|mut group| {
            group.from_fallback = true;
            group
        })
    }
}
