//! Diagnostics Module
//!
//! Point-in-time health snapshot built from store counters and the metadata index.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheStats, EntryInfo, MetadataIndex};

/// Number of entries listed in `recent_entries`
pub const RECENT_ENTRY_LIMIT: usize = 20;

/// Best-effort view of the cache; not transactionally consistent under writes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDiagnosticsSnapshot {
    /// Live entries in the metadata index
    pub total_entries: usize,
    /// Sum of live entries' estimated sizes, in bytes
    pub estimated_memory_usage: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub total_requests: u64,
    /// hits / (hits + misses), 0 before the first request
    pub hit_ratio: f64,
    pub eviction_count: u64,
    /// Capacity units in use according to the store
    pub used_units: u64,
    /// Most recently set entries, newest first
    pub recent_entries: Vec<EntryInfo>,
    pub last_compaction: DateTime<Utc>,
    pub captured_at: DateTime<Utc>,
}

impl CacheDiagnosticsSnapshot {
    /// Sweeps expired records out of `index`, then summarizes what is left.
    pub fn capture(index: &MetadataIndex, stats: &CacheStats, now: DateTime<Utc>) -> Self {
        index.sweep_expired(now);

        let mut active = index.active(now);
        let estimated_memory_usage: u64 = active.iter().map(|info| info.estimated_size).sum();
        let total_entries = active.len();

        active.sort_by(|a, b| b.set_at.cmp(&a.set_at).then_with(|| a.key.cmp(&b.key)));
        active.truncate(RECENT_ENTRY_LIMIT);

        Self {
            total_entries,
            estimated_memory_usage,
            hit_count: stats.hits,
            miss_count: stats.misses,
            total_requests: stats.hits + stats.misses,
            hit_ratio: stats.hit_rate(),
            eviction_count: stats.evictions,
            used_units: stats.used_units,
            recent_entries: active,
            last_compaction: stats.last_compaction_at,
            captured_at: now,
        }
    }
}
