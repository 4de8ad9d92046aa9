//! Observer registration for monitor events
//!
//! The monitor announces operation starts, ends, and threshold alerts to
//! registered observers. Dispatch is synchronous and ordered on the thread
//! that triggered the event: `on_start` fires before `start_operation`
//! returns, and for a single finalization `on_threshold` fires before
//! `on_end`. Callbacks run after the monitor's internal lock is released,
//! so an observer may call back into the monitor.

use crate::record::OperationRecord;
use crate::thresholds::ThresholdEvent;

/// Receives monitor lifecycle and alert events.
///
/// Every method has an empty default body; implementors override only the
/// events they care about.
pub trait MonitorObserver: Send + Sync {
    /// An operation entered the running state
    fn on_start(&self, _record: &OperationRecord) {}

    /// An operation was finalized, as completed or failed
    fn on_end(&self, _record: &OperationRecord) {}

    /// A finalized operation crossed a configured threshold
    fn on_threshold(&self, _event: &ThresholdEvent) {}
}
