//! Error Types
//!
//! Centralized error handling using thiserror for type-safe errors.
//! Most of the monitor's public surface is infallible by design; the
//! fallible parts are configuration loading and snapshot persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Baseline snapshot errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot '{path}': {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Failed to write snapshot '{path}': {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Malformed snapshot JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration '{path}': {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Result type alias for snapshot operations
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
