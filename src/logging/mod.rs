//! Tracing setup for monitor hosts
//!
//! The monitor emits its diagnostics through `tracing`, so it cooperates
//! with whatever subscriber the host already installs. Hosts that do not
//! have one can call [`init_logging`] once at process start:
//! - Console output, with an `OPMON_LOG` environment override
//! - Optional daily-rolling log file via `tracing-appender`

use std::path::PathBuf;

use tracing::{Level, Subscriber};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level when `OPMON_LOG` is unset
    pub level: Level,
    /// Show timestamps on console output
    pub timestamps: bool,
    /// Show file and line numbers
    pub file_line: bool,
    /// ANSI colors on console output
    pub ansi: bool,
    /// Also write a daily-rolling log file
    pub file_output: bool,
    /// Log file directory; platform data directory when unset
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            timestamps: true,
            file_line: false,
            ansi: true,
            file_output: false,
            file_path: None,
        }
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("opmon")
        .join("logs")
}

/// Install a global tracing subscriber for the host process.
///
/// Returns `true` when this call installed the subscriber, `false` when
/// one was already set (the existing subscriber stays in place; a library
/// must not take over logging the host configured).
///
/// # Environment Variables
/// - `OPMON_LOG`: Override the filter (e.g. "opmon=debug" or
///   "opmon::monitor=trace")
pub fn init_logging(config: &LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_from_env("OPMON_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!("opmon={}", config.level.as_str().to_lowercase()))
    });

    let file = if config.file_output {
        file_layer(config.file_path.clone().unwrap_or_else(default_log_dir))
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer(config))
        .with(file)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            level = %config.level,
            file_output = config.file_output,
            "Logging initialized"
        );
    }
    installed
}

fn console_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(config.file_line)
        .with_line_number(config.file_line)
        .with_ansi(config.ansi);

    if config.timestamps {
        layer.boxed()
    } else {
        layer.without_time().boxed()
    }
}

fn file_layer<S>(log_dir: PathBuf) -> Option<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: failed to create log directory {log_dir:?}: {e}");
        return None;
    }

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "opmon.log");
    let layer = fmt::layer()
        .with_writer(appender)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE);

    Some(layer.boxed())
}

/// Parse log level from string
pub fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
