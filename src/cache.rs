//! Cache statistics providers
//!
//! The monitor does not own any caches. Subsystems that do (parse caches,
//! file caches) register a [`CacheStatsProvider`] under a name, and reports
//! and dashboards poll every registered provider for fresh numbers.

use serde::{Deserialize, Serialize};

/// Point-in-time statistics reported by an external cache
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Hit ratio in the 0.0 to 1.0 range
    pub hit_rate: f64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that missed
    pub misses: u64,
    /// Entries currently held
    pub size: u64,
}

impl CacheStats {
    /// Hit rate as a percentage (0.0 to 100.0)
    pub fn hit_percent(&self) -> f64 {
        self.hit_rate * 100.0
    }
}

/// Source of live cache statistics, registered with the monitor by name
pub trait CacheStatsProvider: Send + Sync {
    /// Current statistics; called on every report or dashboard request
    fn stats(&self) -> CacheStats;
}
