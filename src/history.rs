//! Bounded operation history
//!
//! Finalized records land in a fixed-capacity buffer in finalization order.
//! Once full, each push evicts the oldest record, so memory stays bounded
//! no matter how long the process runs. Trend analysis, reports, and
//! dashboards all read from this buffer.

use std::collections::{BTreeMap, VecDeque};

use crate::record::{OperationRecord, OperationStatus};

/// Fixed-capacity, insertion-ordered store of finalized records
#[derive(Debug)]
pub struct HistoryBuffer {
    records: VecDeque<OperationRecord>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a buffer retaining at most `capacity` records; a capacity
    /// of 0 is raised to 1, so the most recent record is always kept
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a finalized record, evicting the oldest when full
    pub fn push(&mut self, record: OperationRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over retained records, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter()
    }

    /// The `count` most recently finalized records, oldest first
    pub fn recent(&self, count: usize) -> Vec<&OperationRecord> {
        let start = self.records.len().saturating_sub(count);
        self.records.range(start..).collect()
    }

    /// Durations grouped by exact operation name, each series in
    /// finalization order
    pub fn durations_by_name(&self) -> BTreeMap<String, Vec<f64>> {
        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in &self.records {
            if let Some(duration) = record.duration_ms {
                grouped.entry(record.name.clone()).or_default().push(duration);
            }
        }
        grouped
    }

    /// Number of retained records with the given status
    pub fn count_status(&self, status: OperationStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;

    fn finalized(name: &str, start_ms: f64, duration_ms: f64) -> OperationRecord {
        let mut record = OperationRecord::begin(name, start_ms, 0, Metadata::new());
        record.finalize(start_ms + duration_ms, 0, None);
        record
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut buffer = HistoryBuffer::new(10);
        buffer.push(finalized("a", 0.0, 1.0));
        buffer.push(finalized("b", 1.0, 1.0));
        buffer.push(finalized("c", 2.0, 1.0));

        let names: Vec<&str> = buffer.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_latest_record() {
        let mut buffer = HistoryBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.push(finalized("first", 0.0, 1.0));
        buffer.push(finalized("second", 1.0, 1.0));

        assert_eq!(buffer.len(), 1);
        let names: Vec<&str> = buffer.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["second"]);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut buffer = HistoryBuffer::new(3);
        for i in 0..5 {
            buffer.push(finalized(&format!("op{i}"), i as f64, 1.0));
        }

        assert_eq!(buffer.len(), 3);
        let names: Vec<&str> = buffer.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["op2", "op3", "op4"]);
    }

    #[test]
    fn test_recent_returns_newest_in_order() {
        let mut buffer = HistoryBuffer::new(10);
        for i in 0..5 {
            buffer.push(finalized(&format!("op{i}"), i as f64, 1.0));
        }

        let recent: Vec<&str> = buffer.recent(2).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(recent, vec!["op3", "op4"]);

        // Asking for more than is retained returns everything.
        assert_eq!(buffer.recent(100).len(), 5);
    }

    #[test]
    fn test_durations_grouped_by_name() {
        let mut buffer = HistoryBuffer::new(10);
        buffer.push(finalized("parse", 0.0, 10.0));
        buffer.push(finalized("render", 10.0, 5.0));
        buffer.push(finalized("parse", 20.0, 20.0));

        let grouped = buffer.durations_by_name();
        assert_eq!(grouped["parse"], vec![10.0, 20.0]);
        assert_eq!(grouped["render"], vec![5.0]);
    }

    #[test]
    fn test_running_records_have_no_duration() {
        let mut buffer = HistoryBuffer::new(10);
        buffer.push(OperationRecord::begin("stuck", 0.0, 0, Metadata::new()));
        assert!(buffer.durations_by_name().is_empty());
    }

    #[test]
    fn test_status_counts() {
        let mut buffer = HistoryBuffer::new(10);
        buffer.push(finalized("ok", 0.0, 1.0));
        buffer.push(finalized("ok", 1.0, 1.0));

        let mut failed = OperationRecord::begin("bad", 2.0, 0, Metadata::new());
        failed.finalize(3.0, 0, Some("boom".to_string()));
        buffer.push(failed);

        assert_eq!(buffer.count_status(OperationStatus::Completed), 2);
        assert_eq!(buffer.count_status(OperationStatus::Failed), 1);
        assert_eq!(buffer.count_status(OperationStatus::Running), 0);
    }
}
