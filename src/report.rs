//! Report and dashboard projections
//!
//! Read-only views over monitor state: a human-readable text report for
//! logs and terminals, and a serializable snapshot for UI polling. Neither
//! mutates anything; both are safe to call at any frequency.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::history::HistoryBuffer;
use crate::record::OperationRecord;
use crate::trends::TrendSample;

/// How many records the "slowest operations" report section lists
const SLOWEST_COUNT: usize = 10;

/// Counts of operations by lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationCounts {
    /// Finalized operations currently retained (completed + failed)
    pub total: usize,
    /// Operations started but not yet ended
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Point-in-time projection of monitor state for UI polling.
///
/// Counts reflect the retained history, so after eviction they cover the
/// last `history_capacity` operations rather than process lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub operations: OperationCounts,
    /// Most recently finalized records, newest first
    pub recent: Vec<OperationRecord>,
    /// Trend map as name/sample pairs, sorted by name
    pub trends: Vec<(String, TrendSample)>,
    /// Live stats from registered cache providers, keyed by provider name
    pub cache: BTreeMap<String, CacheStats>,
}

/// Render the text report
pub(crate) fn render(
    history: &HistoryBuffer,
    trends: &BTreeMap<String, TrendSample>,
    cache: &BTreeMap<String, CacheStats>,
) -> String {
    let mut out = String::new();

    out.push_str("=== Operation Telemetry Report ===\n");
    out.push_str(&format!("Total operations: {}\n", history.len()));

    out.push_str("\nTrends:\n");
    if trends.is_empty() {
        out.push_str("  (not enough samples yet)\n");
    }
    for (name, sample) in trends {
        out.push_str(&format!(
            "  {} {} {} (avg {:.1}ms, p95 {:.1}ms, p99 {:.1}ms, {} samples)\n",
            sample.trend.glyph(),
            name,
            sample.trend,
            sample.average,
            sample.p95,
            sample.p99,
            sample.samples.len()
        ));
    }

    out.push_str("\nCache performance:\n");
    if cache.is_empty() {
        out.push_str("  (no cache providers registered)\n");
    }
    for (name, stats) in cache {
        out.push_str(&format!(
            "  {}: {:.2}% hit rate ({} hits, {} misses, {} entries)\n",
            name,
            stats.hit_percent(),
            stats.hits,
            stats.misses,
            stats.size
        ));
    }

    out.push_str("\nSlowest operations:\n");
    for record in slowest(history, SLOWEST_COUNT) {
        out.push_str(&format!("  {}: {:.1}ms\n", record.name, record.duration()));
    }

    out
}

/// Top `count` finalized records by duration, slowest first
pub(crate) fn slowest(history: &HistoryBuffer, count: usize) -> Vec<&OperationRecord> {
    let mut records: Vec<&OperationRecord> =
        history.iter().filter(|r| r.duration_ms.is_some()).collect();
    records.sort_by(|a, b| {
        b.duration_ms
            .partial_cmp(&a.duration_ms)
            .unwrap_or(Ordering::Equal)
    });
    records.truncate(count);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;
    use crate::trends;

    fn history_with(durations: &[(&str, f64)]) -> HistoryBuffer {
        let mut buffer = HistoryBuffer::new(100);
        for (i, (name, duration)) in durations.iter().enumerate() {
            let mut record = OperationRecord::begin(name, i as f64, 0, Metadata::new());
            record.finalize(i as f64 + duration, 0, None);
            buffer.push(record);
        }
        buffer
    }

    #[test]
    fn test_slowest_sorted_descending() {
        let history = history_with(&[("a", 10.0), ("b", 500.0), ("c", 250.0)]);
        let top: Vec<&str> = slowest(&history, 10).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(top, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_slowest_caps_at_count() {
        let durations: Vec<(&str, f64)> = (0..25).map(|i| ("op", i as f64)).collect();
        let history = history_with(&durations);

        let top = slowest(&history, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].duration(), 24.0);
        assert_eq!(top[9].duration(), 15.0);
    }

    #[test]
    fn test_report_sections_in_order() {
        let mut durations = Vec::new();
        for _ in 0..12 {
            durations.push(("extraction.files", 100.0));
        }
        let history = history_with(&durations);
        let trend_map = BTreeMap::from([(
            "extraction.files".to_string(),
            trends::summarize(vec![100.0; 12], 0.10),
        )]);
        let cache = BTreeMap::from([(
            "file-cache".to_string(),
            CacheStats {
                hit_rate: 0.9512,
                hits: 951,
                misses: 49,
                size: 200,
            },
        )]);

        let report = render(&history, &trend_map, &cache);

        assert!(report.starts_with("=== Operation Telemetry Report ==="));
        assert!(report.contains("Total operations: 12"));
        assert!(report.contains("→ extraction.files stable"));
        assert!(report.contains("file-cache: 95.12% hit rate (951 hits, 49 misses, 200 entries)"));
        assert!(report.contains("extraction.files: 100.0ms"));

        // Section order: trends before cache before slowest.
        let trends_at = report.find("Trends:").unwrap();
        let cache_at = report.find("Cache performance:").unwrap();
        let slowest_at = report.find("Slowest operations:").unwrap();
        assert!(trends_at < cache_at && cache_at < slowest_at);
    }

    #[test]
    fn test_report_on_empty_monitor() {
        let history = HistoryBuffer::new(10);
        let report = render(&history, &BTreeMap::new(), &BTreeMap::new());

        assert!(report.contains("Total operations: 0"));
        assert!(report.contains("(not enough samples yet)"));
        assert!(report.contains("(no cache providers registered)"));
    }

    #[test]
    fn test_trend_glyphs_rendered() {
        let mut samples = vec![100.0; 10];
        samples.extend(vec![200.0; 10]);
        let trend_map = BTreeMap::from([(
            "slow.er".to_string(),
            trends::summarize(samples, 0.10),
        )]);

        let report = render(&HistoryBuffer::new(10), &trend_map, &BTreeMap::new());
        assert!(report.contains("▼ slow.er degrading"));
    }
}
