//! Integration tests for the monitor's public API: concurrent start/end,
//! eviction at capacity, observer events, scoped timing, and reports.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use opmon::sampler::ManualClock;
use opmon::{
    Metadata, MonitorConfig, MonitorObserver, OperationMonitor, OperationRecord, OperationStatus,
    ThresholdEvent, ThresholdRule,
};

#[test]
fn concurrent_start_end_across_threads() {
    let monitor = Arc::new(OperationMonitor::new(MonitorConfig::default()));
    let threads = 8;
    let ops_per_thread = 50;

    let mut handles = Vec::new();
    for t in 0..threads {
        let monitor = monitor.clone();
        handles.push(thread::spawn(move || {
            let mut ids = Vec::new();
            for i in 0..ops_per_thread {
                let id = monitor.start_operation(&format!("worker.{}.task", t % 4));
                if i % 5 == 0 {
                    monitor.fail_operation(&id, "transient failure");
                } else {
                    monitor.end_operation(&id);
                }
                ids.push(id);
            }
            ids
        }));
    }

    let mut all_ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(all_ids.insert(id), "operation ids must be unique");
        }
    }

    let snapshot = monitor.dashboard_snapshot();
    assert_eq!(snapshot.operations.running, 0);
    assert_eq!(snapshot.operations.total, threads * ops_per_thread);
    assert_eq!(snapshot.operations.failed, threads * (ops_per_thread / 5));
    assert_eq!(
        snapshot.operations.completed + snapshot.operations.failed,
        snapshot.operations.total
    );
}

#[test]
fn eviction_holds_capacity_under_overflow() {
    let monitor = OperationMonitor::new(MonitorConfig::default());
    let capacity = monitor.config().history_capacity;
    let overflow = 50;

    for _ in 0..overflow {
        let id = monitor.start_operation("evicted.batch");
        monitor.end_operation(&id);
    }
    for _ in 0..capacity {
        let id = monitor.start_operation("kept.batch");
        monitor.end_operation(&id);
    }

    let snapshot = monitor.dashboard_snapshot();
    assert_eq!(snapshot.operations.total, capacity);

    // Everything from the first batch was evicted; the retained records are
    // exactly the most recent `capacity` finalizations.
    let trends = monitor.calculate_trends();
    assert!(!trends.contains_key("evicted.batch"));
    assert_eq!(trends["kept.batch"].samples.len(), capacity);
}

struct CollectingObserver {
    starts: AtomicUsize,
    ends: AtomicUsize,
    thresholds: Mutex<Vec<String>>,
}

impl MonitorObserver for CollectingObserver {
    fn on_start(&self, _record: &OperationRecord) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_end(&self, record: &OperationRecord) {
        assert!(record.duration_ms.is_some(), "end events carry finalized records");
        self.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn on_threshold(&self, event: &ThresholdEvent) {
        self.thresholds
            .lock()
            .unwrap()
            .push(format!("{}:{}", event.record.name, event.level));
    }
}

#[test]
fn observers_see_lifecycle_and_threshold_events() {
    let config = MonitorConfig::default()
        .with_threshold(ThresholdRule::duration("slow", Some(100.0), Some(1000.0)));

    let clock = Arc::new(ManualClock::new());
    let mut monitor = OperationMonitor::new(config);
    monitor.set_clock(clock.clone());

    let observer = Arc::new(CollectingObserver {
        starts: AtomicUsize::new(0),
        ends: AtomicUsize::new(0),
        thresholds: Mutex::new(Vec::new()),
    });
    monitor.add_observer(observer.clone());

    let id = monitor.start_operation("fast.op");
    clock.advance(10.0);
    monitor.end_operation(&id);

    let id = monitor.start_operation("slow.op");
    clock.advance(500.0);
    monitor.end_operation(&id);

    assert_eq!(observer.starts.load(Ordering::SeqCst), 2);
    assert_eq!(observer.ends.load(Ordering::SeqCst), 2);
    assert_eq!(*observer.thresholds.lock().unwrap(), vec!["slow.op:warn".to_string()]);
}

#[test]
fn scope_and_measure_pair_start_with_end() {
    let monitor = OperationMonitor::new(MonitorConfig::default());

    {
        let _scope = monitor.scope("scoped.block");
    }

    let parsed: Result<u32, std::num::ParseIntError> =
        monitor.measure("parse.number", || "17".parse());
    assert_eq!(parsed.unwrap(), 17);

    let failed: Result<u32, std::num::ParseIntError> =
        monitor.measure("parse.number", || "seventeen".parse());
    assert!(failed.is_err());

    let snapshot = monitor.dashboard_snapshot();
    assert_eq!(snapshot.operations.total, 3);
    assert_eq!(snapshot.operations.completed, 2);
    assert_eq!(snapshot.operations.failed, 1);

    // The failed measurement recorded the parse error's text.
    assert_eq!(snapshot.recent[0].status, OperationStatus::Failed);
    assert!(snapshot.recent[0].error.is_some());
}

#[test]
fn metadata_flows_to_dashboard_records() {
    let monitor = OperationMonitor::new(MonitorConfig::default());

    let mut metadata = Metadata::new();
    metadata.insert("batch".to_string(), serde_json::json!("nightly"));
    let id = monitor.start_operation_with("extraction.files", metadata);
    monitor.end_operation(&id);

    let snapshot = monitor.dashboard_snapshot();
    assert_eq!(snapshot.recent[0].metadata["batch"], "nightly");
}

#[test]
fn report_reflects_recorded_operations() {
    let clock = Arc::new(ManualClock::new());
    let mut monitor = OperationMonitor::new(MonitorConfig::default());
    monitor.set_clock(clock.clone());

    for _ in 0..12 {
        let id = monitor.start_operation("extraction.files");
        clock.advance(100.0);
        monitor.end_operation(&id);
    }
    let id = monitor.start_operation("outlier.op");
    clock.advance(950.0);
    monitor.end_operation(&id);

    let report = monitor.generate_report();
    assert!(report.contains("Total operations: 13"));
    assert!(report.contains("extraction.files"));
    assert!(report.contains("outlier.op: 950.0ms"));

    let snapshot = monitor.dashboard_snapshot();
    assert_eq!(snapshot.trends.len(), 1);
    assert_eq!(snapshot.trends[0].0, "extraction.files");
    assert_eq!(snapshot.trends[0].1.average, 100.0);
}

#[test]
fn dashboard_serializes_for_ui_polling() {
    let monitor = OperationMonitor::new(MonitorConfig::default());
    let id = monitor.start_operation("render.frame");
    monitor.end_operation(&id);

    let snapshot = monitor.dashboard_snapshot();
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["operations"]["total"], 1);
    assert_eq!(json["operations"]["completed"], 1);
    assert_eq!(json["recent"][0]["name"], "render.frame");
    assert_eq!(json["recent"][0]["status"], "completed");
}
