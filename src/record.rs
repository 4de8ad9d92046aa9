//! Operation records
//!
//! An operation is a named unit of work bounded by a start/end call pair.
//! Each start produces a unique [`OperationRecord`] in the `Running` state;
//! finalization fills in the end timestamp, duration, memory delta, and
//! outcome. Finalized records are immutable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-supplied key-value metadata, carried through to the record unchanged
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Unique operation identifier: `{name}-{start_ms}-{random suffix}`
pub type OperationId = String;

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Started but not yet ended
    Running,
    /// Ended without an error
    Completed,
    /// Ended with an error
    Failed,
}

/// Memory usage sampled at the operation boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Bytes in use when the operation started
    pub start_bytes: u64,
    /// Bytes in use when the operation ended; zero while running
    pub end_bytes: u64,
    /// `end_bytes - start_bytes`; negative when memory was released
    pub delta_bytes: i64,
}

/// A single timed unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Unique id, valid for exactly one finalization
    pub id: OperationId,
    /// Operation name; dot-separated segments by convention
    /// (e.g. `extraction.files.typescript`)
    pub name: String,
    /// Monotonic start timestamp in milliseconds
    pub start_ms: f64,
    /// Monotonic end timestamp in milliseconds; `None` while running
    pub end_ms: Option<f64>,
    /// `end_ms - start_ms`; `None` while running
    pub duration_ms: Option<f64>,
    /// Memory usage across the operation
    pub memory: MemoryUsage,
    /// Lifecycle state
    pub status: OperationStatus,
    /// Error message; present exactly when `status` is `Failed`
    pub error: Option<String>,
    /// Caller-supplied metadata
    pub metadata: Metadata,
}

impl OperationRecord {
    /// Create a running record with a freshly generated id
    pub(crate) fn begin(name: &str, start_ms: f64, start_bytes: u64, metadata: Metadata) -> Self {
        Self {
            id: generate_id(name, start_ms),
            name: name.to_string(),
            start_ms,
            end_ms: None,
            duration_ms: None,
            memory: MemoryUsage {
                start_bytes,
                end_bytes: 0,
                delta_bytes: 0,
            },
            status: OperationStatus::Running,
            error: None,
            metadata,
        }
    }

    /// Fill in the end timestamp, memory delta, and outcome
    pub(crate) fn finalize(&mut self, end_ms: f64, end_bytes: u64, error: Option<String>) {
        self.end_ms = Some(end_ms);
        self.duration_ms = Some(end_ms - self.start_ms);
        self.memory.end_bytes = end_bytes;
        self.memory.delta_bytes = end_bytes as i64 - self.memory.start_bytes as i64;
        self.status = if error.is_some() {
            OperationStatus::Failed
        } else {
            OperationStatus::Completed
        };
        self.error = error;
    }

    /// Duration in milliseconds; zero while still running
    pub fn duration(&self) -> f64 {
        self.duration_ms.unwrap_or(0.0)
    }

    /// Whether the record has been finalized
    pub fn is_finalized(&self) -> bool {
        self.status != OperationStatus::Running
    }
}

/// Generate a process-unique id from the name, the start timestamp, and a
/// random suffix. Two starts of the same name in the same millisecond still
/// get distinct ids.
fn generate_id(name: &str, start_ms: f64) -> OperationId {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", name, start_ms as u64, &uuid[..8])
}
