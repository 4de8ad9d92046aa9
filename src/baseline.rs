//! Baseline snapshots and regression comparison
//!
//! A baseline is a previously captured trend map, persisted as JSON.
//! Comparing current trends against it flags operations that got more than
//! a band (default ±10%) slower (regressions) or faster (improvements).
//! Typical flow: CI writes a snapshot on the main branch, later runs
//! compare against it and fail on regressions.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, SnapshotResult};
use crate::store::FileStore;
use crate::trends::TrendSample;

/// Aggregate duration statistics persisted per operation name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    /// Mean duration in milliseconds
    pub average: f64,
    /// 95th percentile in milliseconds
    pub p95: f64,
    /// 99th percentile in milliseconds
    pub p99: f64,
}

impl From<&TrendSample> for TrendStats {
    fn from(sample: &TrendSample) -> Self {
        Self {
            average: sample.average,
            p95: sample.p95,
            p99: sample.p99,
        }
    }
}

/// A captured trend snapshot.
///
/// Serializes as `{"trends": [["name", {"average": ..., "p95": ..., "p99": ...}], ...]}`,
/// an array of name/stat pairs rather than an object keyed by name, so
/// operation names containing characters unsafe as keys survive untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    /// When the snapshot was captured; absent in hand-written baselines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    /// Name/stat pairs, in trend-map iteration order
    pub trends: Vec<(String, TrendStats)>,
}

impl BaselineSnapshot {
    /// Capture the current trend map as a snapshot
    pub fn from_trends(trends: &BTreeMap<String, TrendSample>) -> Self {
        Self {
            captured_at: Some(Utc::now()),
            trends: trends
                .iter()
                .map(|(name, sample)| (name.clone(), TrendStats::from(sample)))
                .collect(),
        }
    }

    /// Load a snapshot through the injected store
    pub fn load(store: &dyn FileStore, path: &Path) -> SnapshotResult<Self> {
        let contents = store.read(path).map_err(|e| SnapshotError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the snapshot as pretty-printed JSON through the injected store
    pub fn save(&self, store: &dyn FileStore, path: &Path) -> SnapshotResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        store
            .write(path, &json)
            .map_err(|e| SnapshotError::WriteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Stats recorded for `name`, if present
    pub fn stats_for(&self, name: &str) -> Option<&TrendStats> {
        self.trends
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, stats)| stats)
    }
}

/// Operations that moved beyond the band relative to a baseline
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaselineComparison {
    /// Operations slower than baseline, e.g.
    /// `extraction: +20.0% (avg 100.0ms -> 120.0ms)`
    pub regressions: Vec<String>,
    /// Operations faster than baseline, same format with a negative figure
    pub improvements: Vec<String>,
}

impl BaselineComparison {
    pub fn is_empty(&self) -> bool {
        self.regressions.is_empty() && self.improvements.is_empty()
    }
}

/// Diff current trends against a baseline.
///
/// Only names present on both sides are compared; a claim either way needs
/// both a baseline and current data. A baseline average of zero is skipped
/// because no relative change can be computed from it.
pub(crate) fn compare(
    current: &BTreeMap<String, TrendSample>,
    baseline: &BaselineSnapshot,
    band: f64,
) -> BaselineComparison {
    let mut comparison = BaselineComparison::default();

    for (name, stats) in &baseline.trends {
        let sample = match current.get(name) {
            Some(sample) => sample,
            None => continue,
        };
        if stats.average == 0.0 {
            continue;
        }

        let change = (sample.average - stats.average) / stats.average;
        if change > band {
            comparison
                .regressions
                .push(format_entry(name, change, stats.average, sample.average));
        } else if change < -band {
            comparison
                .improvements
                .push(format_entry(name, change, stats.average, sample.average));
        }
    }

    comparison
}

fn format_entry(name: &str, change: f64, baseline_avg: f64, current_avg: f64) -> String {
    format!(
        "{}: {:+.1}% (avg {:.1}ms -> {:.1}ms)",
        name,
        change * 100.0,
        baseline_avg,
        current_avg
    )
}
