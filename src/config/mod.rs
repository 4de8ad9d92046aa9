//! Configuration management for the monitor
//!
//! Every tunable behavior threshold lives here rather than as a hard-coded
//! constant: history retention, trend sample minimums, the classification
//! band, the slow-operation floor, and CI snapshot persistence. A config
//! can come from code (builder methods), from a TOML file, or from the
//! environment; missing fields always fall back to the documented defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::thresholds::ThresholdRule;

/// Tunable monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Maximum finalized records retained before FIFO eviction (minimum 1)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Minimum finalized records per name before a trend is reported
    #[serde(default = "default_trend_min_samples")]
    pub trend_min_samples: usize,

    /// Symmetric relative-change band for trend and baseline classification;
    /// 0.10 means changes within ±10% read as stable/noise
    #[serde(default = "default_trend_band")]
    pub trend_band: f64,

    /// Warn about any operation slower than this many milliseconds, even
    /// when no threshold rule matches it
    #[serde(default = "default_slow_op_floor_ms")]
    pub slow_op_floor_ms: f64,

    /// How many recently finalized records the dashboard carries
    #[serde(default = "default_dashboard_recent")]
    pub dashboard_recent: usize,

    /// Enable CI snapshot persistence
    #[serde(default)]
    pub ci: bool,

    /// Directory CI trend snapshots are written to
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Threshold rules installed at construction
    #[serde(default)]
    pub thresholds: Vec<ThresholdRule>,
}

fn default_history_capacity() -> usize {
    10_000
}

fn default_trend_min_samples() -> usize {
    10
}

fn default_trend_band() -> f64 {
    0.10
}

fn default_slow_op_floor_ms() -> f64 {
    1000.0
}

fn default_dashboard_recent() -> usize {
    2
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("perf-snapshots")
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            trend_min_samples: default_trend_min_samples(),
            trend_band: default_trend_band(),
            slow_op_floor_ms: default_slow_op_floor_ms(),
            dashboard_recent: default_dashboard_recent(),
            ci: false,
            snapshot_dir: default_snapshot_dir(),
            thresholds: Vec::new(),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file. Fields absent from the file keep their
    /// defaults, so a config file only needs to name what it changes.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Defaults adjusted from the environment: the `CI` variable (any
    /// value) enables snapshot persistence
    pub fn from_env() -> Self {
        Self {
            ci: env::var_os("CI").is_some(),
            ..Self::default()
        }
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_trend_min_samples(mut self, min_samples: usize) -> Self {
        self.trend_min_samples = min_samples;
        self
    }

    pub fn with_trend_band(mut self, band: f64) -> Self {
        self.trend_band = band;
        self
    }

    pub fn with_slow_op_floor_ms(mut self, floor_ms: f64) -> Self {
        self.slow_op_floor_ms = floor_ms;
        self
    }

    pub fn with_dashboard_recent(mut self, count: usize) -> Self {
        self.dashboard_recent = count;
        self
    }

    pub fn with_ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    pub fn with_threshold(mut self, rule: ThresholdRule) -> Self {
        self.thresholds.push(rule);
        self
    }
}
