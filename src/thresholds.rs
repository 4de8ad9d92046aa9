//! Threshold rules and alert evaluation
//!
//! Rules bind duration and memory limits to families of operations selected
//! by name prefix. Prefixes match whole dot-separated segments, and the
//! longest matching prefix wins, so a broad `extraction` rule can be
//! overridden by a tighter `extraction.files` one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::OperationRecord;

/// Severity of a threshold alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warn,
    Error,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Warn => write!(f, "warn"),
            AlertLevel::Error => write!(f, "error"),
        }
    }
}

/// Which measured quantity crossed a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMetric {
    /// Wall-clock duration in milliseconds
    Duration,
    /// Memory delta in bytes
    Memory,
}

impl fmt::Display for ThresholdMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMetric::Duration => write!(f, "duration"),
            ThresholdMetric::Memory => write!(f, "memory delta"),
        }
    }
}

/// Duration and memory limits for operations under a name prefix.
///
/// All limits are optional; a rule only checks the quantities it sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    /// Dot-separated name prefix this rule applies to
    pub name_prefix: String,
    /// Warn when duration reaches this many milliseconds
    #[serde(default)]
    pub warn_duration_ms: Option<f64>,
    /// Error when duration reaches this many milliseconds
    #[serde(default)]
    pub error_duration_ms: Option<f64>,
    /// Warn when the memory delta reaches this many bytes
    #[serde(default)]
    pub warn_memory_bytes: Option<i64>,
    /// Error when the memory delta reaches this many bytes
    #[serde(default)]
    pub error_memory_bytes: Option<i64>,
}

impl ThresholdRule {
    /// Rule with only duration limits
    pub fn duration(
        prefix: impl Into<String>,
        warn_ms: Option<f64>,
        error_ms: Option<f64>,
    ) -> Self {
        Self {
            name_prefix: prefix.into(),
            warn_duration_ms: warn_ms,
            error_duration_ms: error_ms,
            warn_memory_bytes: None,
            error_memory_bytes: None,
        }
    }

    /// Rule with only memory limits
    pub fn memory(
        prefix: impl Into<String>,
        warn_bytes: Option<i64>,
        error_bytes: Option<i64>,
    ) -> Self {
        Self {
            name_prefix: prefix.into(),
            warn_duration_ms: None,
            error_duration_ms: None,
            warn_memory_bytes: warn_bytes,
            error_memory_bytes: error_bytes,
        }
    }

    /// Whether `name` falls under this rule's prefix.
    ///
    /// Matches whole dot-separated segments: a rule for `extraction` covers
    /// `extraction` and `extraction.files.typescript`, but not `extractionx`.
    pub fn matches(&self, name: &str) -> bool {
        name == self.name_prefix
            || (name.starts_with(&self.name_prefix)
                && name[self.name_prefix.len()..].starts_with('.'))
    }
}

/// Alert produced when a finalized record crosses a configured limit
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdEvent {
    /// Quantity that crossed the limit
    pub metric: ThresholdMetric,
    /// Severity; error limits take precedence over warn limits
    pub level: AlertLevel,
    /// The configured limit that was crossed (ms or bytes)
    pub threshold: f64,
    /// The observed value (ms or bytes)
    pub observed: f64,
    /// The record that triggered the alert
    pub record: OperationRecord,
}

/// The most specific rule for `name`: the longest matching prefix
pub(crate) fn find_rule<'a>(rules: &'a [ThresholdRule], name: &str) -> Option<&'a ThresholdRule> {
    rules
        .iter()
        .filter(|rule| rule.matches(name))
        .max_by_key(|rule| rule.name_prefix.len())
}

/// Evaluate a finalized record against the matched rule.
///
/// Duration and memory are checked independently, so one record can raise
/// two alerts. Each check reports at most one level, preferring error.
pub(crate) fn evaluate(rules: &[ThresholdRule], record: &OperationRecord) -> Vec<ThresholdEvent> {
    let rule = match find_rule(rules, &record.name) {
        Some(rule) => rule,
        None => return Vec::new(),
    };

    let mut events = Vec::new();

    let duration = record.duration();
    if let Some((level, threshold)) =
        pick_level(duration, rule.warn_duration_ms, rule.error_duration_ms)
    {
        events.push(ThresholdEvent {
            metric: ThresholdMetric::Duration,
            level,
            threshold,
            observed: duration,
            record: record.clone(),
        });
    }

    let delta = record.memory.delta_bytes as f64;
    if let Some((level, threshold)) = pick_level(
        delta,
        rule.warn_memory_bytes.map(|v| v as f64),
        rule.error_memory_bytes.map(|v| v as f64),
    ) {
        events.push(ThresholdEvent {
            metric: ThresholdMetric::Memory,
            level,
            threshold,
            observed: delta,
            record: record.clone(),
        });
    }

    events
}

fn pick_level(observed: f64, warn: Option<f64>, error: Option<f64>) -> Option<(AlertLevel, f64)> {
    if let Some(limit) = error {
        if observed >= limit {
            return Some((AlertLevel::Error, limit));
        }
    }
    if let Some(limit) = warn {
        if observed >= limit {
            return Some((AlertLevel::Warn, limit));
        }
    }
    None
}
