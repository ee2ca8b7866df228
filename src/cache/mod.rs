//! Cache Module
//!
//! In-memory caching with per-entry TTL, size-bounded compaction, daily key
//! rotation for static data and a diagnostics view over what is cached.

mod clock;
mod diagnostics;
mod entry;
mod eviction;
mod keys;
mod metadata;
mod order;
mod service;
mod stats;
mod store;
mod value;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use diagnostics::{CacheDiagnosticsSnapshot, RECENT_ENTRY_LIMIT};
pub use entry::CacheEntry;
pub use eviction::{EvictionEvent, EvictionListener, EvictionReason};
pub use keys::{CacheKey, CacheNamespace, KeyPolicy};
pub use metadata::{EntryInfo, MetadataIndex};
pub use order::WriteOrder;
pub use service::CacheService;
pub use stats::CacheStats;
pub use store::{CacheStore, CapacityPolicy};
pub use value::{size_units, CachedValue, Cacheable};
