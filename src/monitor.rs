//! The operation telemetry monitor
//!
//! [`OperationMonitor`] times named operations, retains a bounded history of
//! finalized records, evaluates threshold rules, derives per-name trends,
//! and compares current performance against saved baselines. There is no
//! process-global instance: the host constructs one monitor at its
//! composition root and shares it (typically behind an `Arc`) with the code
//! being instrumented.
//!
//! A single lock covers the in-flight map, the history buffer, and the
//! threshold rules, so a trend computation never observes a half-finalized
//! record. Observer callbacks and cache-provider polls run with no internal
//! lock held; both may call back into the monitor.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::baseline::{self, BaselineComparison, BaselineSnapshot};
use crate::cache::{CacheStats, CacheStatsProvider};
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::history::HistoryBuffer;
use crate::logger::{Logger, TracingLogger};
use crate::observer::MonitorObserver;
use crate::record::{Metadata, OperationId, OperationRecord, OperationStatus};
use crate::report::{self, DashboardSnapshot, OperationCounts};
use crate::sampler::{Clock, MemorySampler, MonotonicClock, TrackedMemory};
use crate::store::{DiskStore, FileStore};
use crate::thresholds::{self, AlertLevel, ThresholdEvent, ThresholdRule};
use crate::trends::{self, TrendSample};

/// Mutable state guarded by the monitor's single lock
struct MonitorState {
    /// Running operations by id
    in_flight: HashMap<OperationId, OperationRecord>,
    /// Finalized records, bounded FIFO
    history: HistoryBuffer,
    /// Threshold rules, config-installed plus runtime additions
    rules: Vec<ThresholdRule>,
}

/// Times named operations and tracks their performance over time
pub struct OperationMonitor {
    state: Mutex<MonitorState>,
    observers: Mutex<Vec<Arc<dyn MonitorObserver>>>,
    cache_providers: Mutex<BTreeMap<String, Arc<dyn CacheStatsProvider>>>,
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    memory: Arc<dyn MemorySampler>,
    logger: Arc<dyn Logger>,
    store: Arc<dyn FileStore>,
}

impl OperationMonitor {
    /// Create a monitor with production collaborators: monotonic clock,
    /// tracked-allocation memory sampler, tracing logger, disk store
    pub fn new(config: MonitorConfig) -> Self {
        let state = MonitorState {
            in_flight: HashMap::new(),
            history: HistoryBuffer::new(config.history_capacity),
            rules: config.thresholds.clone(),
        };
        Self {
            state: Mutex::new(state),
            observers: Mutex::new(Vec::new()),
            cache_providers: Mutex::new(BTreeMap::new()),
            config,
            clock: Arc::new(MonotonicClock::new()),
            memory: Arc::new(TrackedMemory),
            logger: Arc::new(TracingLogger),
            store: Arc::new(DiskStore),
        }
    }

    /// The configuration this monitor was built with
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Replace the diagnostic logger (tests, custom sinks)
    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = logger;
    }

    /// Replace the time source
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    /// Replace the memory sampler
    pub fn set_memory_sampler(&mut self, sampler: Arc<dyn MemorySampler>) {
        self.memory = sampler;
    }

    /// Replace the file store used for baselines and CI snapshots
    pub fn set_file_store(&mut self, store: Arc<dyn FileStore>) {
        self.store = store;
    }

    /// Register an observer for start, end, and threshold events
    pub fn add_observer(&self, observer: Arc<dyn MonitorObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Register a named cache-stats provider, polled by reports and
    /// dashboards. Registering the same name again replaces the provider.
    pub fn register_cache_provider(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn CacheStatsProvider>,
    ) {
        self.cache_providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), provider);
    }

    /// Add a threshold rule at runtime
    pub fn add_threshold_rule(&self, rule: ThresholdRule) {
        self.state().rules.push(rule);
    }

    /// Start timing a named operation.
    ///
    /// Always succeeds. The returned id is valid for exactly one
    /// `end_operation` or `fail_operation` call.
    pub fn start_operation(&self, name: &str) -> OperationId {
        self.start_operation_with(name, Metadata::new())
    }

    /// Start timing with caller metadata attached to the record
    pub fn start_operation_with(&self, name: &str, metadata: Metadata) -> OperationId {
        if name.is_empty() {
            self.logger.warn("Operation started with an empty name");
        }

        let record =
            OperationRecord::begin(name, self.clock.now_ms(), self.memory.current_bytes(), metadata);
        let id = record.id.clone();
        let snapshot = record.clone();

        self.state().in_flight.insert(id.clone(), record);
        tracing::trace!("Operation '{}' started as {}", name, id);

        for observer in self.observers() {
            observer.on_start(&snapshot);
        }
        id
    }

    /// Finalize an operation as completed and return its record.
    ///
    /// An unknown or already-ended id is a no-op: it logs a not-found
    /// warning and returns `None` without touching history.
    pub fn end_operation(&self, id: &str) -> Option<OperationRecord> {
        self.finalize(id, None)
    }

    /// Finalize an operation as failed, recording the error message.
    ///
    /// The failure belongs to the instrumented work, not the monitor; the
    /// record lands in history like any other and its duration counts
    /// toward trends.
    pub fn fail_operation(&self, id: &str, error: impl Into<String>) -> Option<OperationRecord> {
        self.finalize(id, Some(error.into()))
    }

    fn finalize(&self, id: &str, error: Option<String>) -> Option<OperationRecord> {
        let end_ms = self.clock.now_ms();
        let end_bytes = self.memory.current_bytes();

        let finalized = {
            let mut state = self.state();
            match state.in_flight.remove(id) {
                Some(mut record) => {
                    record.finalize(end_ms, end_bytes, error);
                    state.history.push(record.clone());
                    let events = thresholds::evaluate(&state.rules, &record);
                    Some((record, events))
                }
                None => None,
            }
        };

        let (record, events) = match finalized {
            Some(finalized) => finalized,
            None => {
                self.logger
                    .warn(&format!("Operation '{id}' not found (already ended or never started)"));
                return None;
            }
        };

        for event in &events {
            self.route_threshold(event);
        }

        let duration = record.duration();
        if duration > self.config.slow_op_floor_ms {
            self.logger.warn(&format!(
                "Slow operation: '{}' took {:.1}ms",
                record.name, duration
            ));
        }

        tracing::trace!("Operation '{}' finalized in {:.1}ms", record.name, duration);
        for observer in self.observers() {
            observer.on_end(&record);
        }
        Some(record)
    }

    /// Start an operation bound to a guard that ends it when dropped
    pub fn scope(&self, name: &str) -> OperationScope<'_> {
        self.scope_with(name, Metadata::new())
    }

    /// Scoped start with caller metadata
    pub fn scope_with(&self, name: &str, metadata: Metadata) -> OperationScope<'_> {
        let id = self.start_operation_with(name, metadata);
        OperationScope {
            monitor: self,
            id: Some(id),
            error: None,
        }
    }

    /// Run `f` as a measured operation.
    ///
    /// `Ok` finalizes the operation as completed, `Err` as failed with the
    /// error's display text; either way the caller gets `f`'s result back.
    pub fn measure<T, E: fmt::Display>(
        &self,
        name: &str,
        f: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let scope = self.scope(name);
        match f() {
            Ok(value) => {
                drop(scope);
                Ok(value)
            }
            Err(e) => {
                scope.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Current per-name trend statistics over the retained history.
    ///
    /// Names with fewer than `trend_min_samples` finalized records are
    /// omitted.
    pub fn calculate_trends(&self) -> BTreeMap<String, TrendSample> {
        let state = self.state();
        trends::calculate(
            &state.history,
            self.config.trend_min_samples,
            self.config.trend_band,
        )
    }

    /// Poll every registered cache provider for fresh statistics
    pub fn get_cache_stats(&self) -> BTreeMap<String, CacheStats> {
        self.providers()
            .into_iter()
            .map(|(name, provider)| (name, provider.stats()))
            .collect()
    }

    /// Render the human-readable text report
    pub fn generate_report(&self) -> String {
        let cache = self.get_cache_stats();
        let state = self.state();
        let trend_map = trends::calculate(
            &state.history,
            self.config.trend_min_samples,
            self.config.trend_band,
        );
        report::render(&state.history, &trend_map, &cache)
    }

    /// Point-in-time projection for UI polling
    pub fn dashboard_snapshot(&self) -> DashboardSnapshot {
        let cache = self.get_cache_stats();
        let state = self.state();
        let trend_map = trends::calculate(
            &state.history,
            self.config.trend_min_samples,
            self.config.trend_band,
        );

        let completed = state.history.count_status(OperationStatus::Completed);
        let failed = state.history.count_status(OperationStatus::Failed);
        let mut recent: Vec<OperationRecord> = state
            .history
            .recent(self.config.dashboard_recent)
            .into_iter()
            .cloned()
            .collect();
        recent.reverse();

        DashboardSnapshot {
            operations: OperationCounts {
                total: completed + failed,
                running: state.in_flight.len(),
                completed,
                failed,
            },
            recent,
            trends: trend_map.into_iter().collect(),
            cache,
        }
    }

    /// Compare current trends against a baseline snapshot.
    ///
    /// A load failure (missing file, malformed JSON) is logged through the
    /// injected logger and yields an empty comparison; it never propagates
    /// to the caller.
    pub fn compare_with_baseline(&self, path: &Path) -> BaselineComparison {
        let snapshot = match BaselineSnapshot::load(self.store.as_ref(), path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.logger
                    .error(&format!("Failed to load baseline '{}': {e}", path.display()));
                return BaselineComparison::default();
            }
        };

        let current = self.calculate_trends();
        baseline::compare(&current, &snapshot, self.config.trend_band)
    }

    /// Capture current trends as a baseline snapshot at `path`
    pub fn save_baseline(&self, path: &Path) -> Result<()> {
        let snapshot = BaselineSnapshot::from_trends(&self.calculate_trends());
        snapshot.save(self.store.as_ref(), path)?;
        Ok(())
    }

    /// Persist the current trend map for CI regression tracking.
    ///
    /// No-op unless the config's `ci` flag is set. Writes a uniquely named
    /// `perf-<timestamp>.json` plus a `perf-latest.json` alongside it.
    /// Write failures are logged and swallowed; this can never fail the
    /// caller's pipeline.
    pub fn save_ci_snapshot(&self) {
        if !self.config.ci {
            return;
        }

        let snapshot = BaselineSnapshot::from_trends(&self.calculate_trends());
        let dir = &self.config.snapshot_dir;
        if let Err(e) = self.store.ensure_dir(dir) {
            self.logger.error(&format!(
                "Failed to create snapshot directory '{}': {e}",
                dir.display()
            ));
            return;
        }

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        let unique = dir.join(format!("perf-{stamp}.json"));
        let latest = dir.join("perf-latest.json");
        for path in [&unique, &latest] {
            if let Err(e) = snapshot.save(self.store.as_ref(), path) {
                self.logger
                    .error(&format!("Failed to write snapshot '{}': {e}", path.display()));
            }
        }
        tracing::debug!(dir = %dir.display(), "CI snapshot saved");
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the observer list; dispatch happens on the snapshot so
    /// callbacks run without the list lock held
    fn observers(&self) -> Vec<Arc<dyn MonitorObserver>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the provider map, polled without the lock held
    fn providers(&self) -> Vec<(String, Arc<dyn CacheStatsProvider>)> {
        self.cache_providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, provider)| (name.clone(), provider.clone()))
            .collect()
    }

    fn route_threshold(&self, event: &ThresholdEvent) {
        let message = format!(
            "Threshold exceeded ({}): '{}' {} {:.1} over limit {:.1}",
            event.level, event.record.name, event.metric, event.observed, event.threshold
        );
        match event.level {
            AlertLevel::Warn => self.logger.warn(&message),
            AlertLevel::Error => self.logger.error(&message),
        }
        for observer in self.observers() {
            observer.on_threshold(event);
        }
    }
}

impl Default for OperationMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

/// RAII guard that guarantees a started operation gets finalized.
///
/// Dropping the guard ends the operation as completed. [`fail`] ends it as
/// failed with an error message. If the guard drops during a panic unwind,
/// the operation is finalized as failed with a panic marker, so panicking
/// code paths still produce a record instead of leaking a running entry.
///
/// [`fail`]: OperationScope::fail
pub struct OperationScope<'a> {
    monitor: &'a OperationMonitor,
    id: Option<OperationId>,
    error: Option<String>,
}

impl OperationScope<'_> {
    /// Id of the underlying operation
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Finalize the operation as failed with `error`
    pub fn fail(mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }
}

impl Drop for OperationScope<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(error) = self.error.take() {
                self.monitor.fail_operation(&id, error);
            } else if std::thread::panicking() {
                self.monitor.fail_operation(&id, "operation panicked");
            } else {
                self.monitor.end_operation(&id);
            }
        }
    }
}
