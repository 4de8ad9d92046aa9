//! Duration statistics and trend classification
//!
//! For every operation name with enough finalized samples, derive summary
//! statistics (mean, median, p95, p99) and a direction: is this operation
//! getting faster, slower, or holding steady? Classification splits the
//! chronological series in half and compares the halves' means, which damps
//! single-outlier noise without needing a real regression model.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::history::HistoryBuffer;

/// Direction of an operation's recent duration history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Recent half is faster than the older half beyond the band
    Improving,
    /// Recent half is slower than the older half beyond the band
    Degrading,
    /// Within the band either way
    Stable,
}

impl TrendDirection {
    /// Single-glyph rendering used by the text report
    pub fn glyph(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "▲",
            TrendDirection::Degrading => "▼",
            TrendDirection::Stable => "→",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Degrading => write!(f, "degrading"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Summary statistics for one operation name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    /// Durations in finalization order (oldest first), milliseconds
    pub samples: Vec<f64>,
    /// Arithmetic mean
    pub average: f64,
    /// Middle value; mean of the two middle values for even counts
    pub median: f64,
    /// Nearest-rank 95th percentile
    pub p95: f64,
    /// Nearest-rank 99th percentile
    pub p99: f64,
    /// Half-split classification
    pub trend: TrendDirection,
}

/// Compute per-name trend samples from the retained history.
///
/// Names with fewer than `min_samples` finalized records are skipped
/// entirely rather than reported with unreliable statistics.
pub(crate) fn calculate(
    history: &HistoryBuffer,
    min_samples: usize,
    band: f64,
) -> BTreeMap<String, TrendSample> {
    let mut trends = BTreeMap::new();
    for (name, samples) in history.durations_by_name() {
        if samples.len() < min_samples {
            continue;
        }
        trends.insert(name, summarize(samples, band));
    }
    trends
}

/// Summarize one chronological duration series
pub(crate) fn summarize(samples: Vec<f64>, band: f64) -> TrendSample {
    if samples.is_empty() {
        return TrendSample {
            samples,
            average: 0.0,
            median: 0.0,
            p95: 0.0,
            p99: 0.0,
            trend: TrendDirection::Stable,
        };
    }

    let mut sorted = samples.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let len = sorted.len();
    let average = sorted.iter().sum::<f64>() / len as f64;
    let median = if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    };

    let trend = classify(&samples, band);

    TrendSample {
        samples,
        average,
        median,
        p95: percentile(&sorted, 0.95),
        p99: percentile(&sorted, 0.99),
        trend,
    }
}

/// Nearest-rank percentile over an ascending-sorted slice
fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    let index = ((sorted.len() as f64 * quantile).ceil() as usize).saturating_sub(1);
    sorted[index.min(sorted.len() - 1)]
}

/// Split the series into an older and a recent half and compare means.
///
/// A relative change beyond `band` (0.10 = ±10%) classifies the series as
/// degrading (slower) or improving (faster); anything inside the band is
/// stable. Odd-length series put the extra sample in the recent half.
fn classify(samples: &[f64], band: f64) -> TrendDirection {
    let mid = samples.len() / 2;
    if mid == 0 {
        return TrendDirection::Stable;
    }

    let older: f64 = samples[..mid].iter().sum::<f64>() / mid as f64;
    let recent: f64 = samples[mid..].iter().sum::<f64>() / (samples.len() - mid) as f64;

    if older == 0.0 {
        // No meaningful ratio; any nonzero recent half reads as a slowdown.
        return if recent > 0.0 {
            TrendDirection::Degrading
        } else {
            TrendDirection::Stable
        };
    }

    let change = (recent - older) / older;
    if change > band {
        TrendDirection::Degrading
    } else if change < -band {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    }
}
