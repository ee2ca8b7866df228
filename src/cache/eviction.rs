//! Eviction Hook Module
//!
//! Notifications raised by the store whenever an entry leaves it.

use std::fmt::{self, Debug};

/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// TTL elapsed; found on read or by a sweep
    Expired,
    /// Dropped by a compaction pass to get back under capacity
    Capacity,
    /// Explicit `remove`
    Removed,
    /// Overwritten by a newer `set` for the same key
    Replaced,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionReason::Expired => "expired",
            EvictionReason::Capacity => "capacity",
            EvictionReason::Removed => "removed",
            EvictionReason::Replaced => "replaced",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvictionEvent {
    pub key: String,
    pub reason: EvictionReason,
    pub value_type: &'static str,
    pub estimated_size_bytes: u64,
}

/// Receives eviction notifications.
///
/// Called while the store is being mutated, so implementations must not call
/// back into the store.
pub trait EvictionListener: Debug + Send + Sync {
    fn on_eviction(&self, event: &EvictionEvent);
}
