//! opmon - in-process operation telemetry
//!
//! Times named operations and tracks their performance over time:
//! - Start/end timing with memory deltas and caller metadata
//! - Bounded history with FIFO eviction
//! - Per-name trend statistics (mean, median, p95, p99, direction)
//! - Threshold alerts with dot-segment prefix matching
//! - Baseline comparison for CI regression tracking
//! - Text reports and dashboard projections
//!
//! There is no global monitor. Construct an [`OperationMonitor`] at the
//! composition root and share it with the code being instrumented:
//!
//! ```
//! use opmon::{MonitorConfig, OperationMonitor};
//!
//! let monitor = OperationMonitor::new(MonitorConfig::default());
//!
//! let id = monitor.start_operation("extraction.files");
//! // ... the instrumented work ...
//! let record = monitor.end_operation(&id).expect("operation is in flight");
//! assert!(record.duration_ms.is_some());
//!
//! // Or let a guard pair the calls, including on early returns and panics:
//! {
//!     let _scope = monitor.scope("extraction.symbols");
//!     // ... the instrumented work ...
//! }
//! println!("{}", monitor.generate_report());
//! ```

pub mod baseline;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod logger;
pub mod logging;
pub mod monitor;
pub mod observer;
pub mod record;
pub mod report;
pub mod sampler;
pub mod store;
pub mod thresholds;
pub mod trends;

pub use baseline::{BaselineComparison, BaselineSnapshot, TrendStats};
pub use cache::{CacheStats, CacheStatsProvider};
pub use config::MonitorConfig;
pub use error::{ConfigError, MonitorError, Result, SnapshotError};
pub use history::HistoryBuffer;
pub use logger::{Logger, TracingLogger};
pub use monitor::{OperationMonitor, OperationScope};
pub use observer::MonitorObserver;
pub use record::{Metadata, MemoryUsage, OperationId, OperationRecord, OperationStatus};
pub use report::{DashboardSnapshot, OperationCounts};
pub use sampler::{Clock, MemorySampler, MonotonicClock, TrackedMemory};
pub use store::{DiskStore, FileStore};
pub use thresholds::{AlertLevel, ThresholdEvent, ThresholdMetric, ThresholdRule};
pub use trends::{TrendDirection, TrendSample};
