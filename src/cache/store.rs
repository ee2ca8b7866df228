//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with write-order tracking,
//! TTL expiration and size-bounded compaction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::cache::{
    CacheEntry, CacheStats, Cacheable, CachedValue, Clock, EvictionEvent, EvictionListener,
    EvictionReason, WriteOrder,
};
use crate::config::CacheSettings;
use crate::error::{Result, TransitError};

// == Capacity Policy ==
/// Size limit and how much of it a compaction reclaims.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityPolicy {
    /// Maximum total size in capacity units
    pub size_limit: u64,
    /// Fraction of `size_limit` freed when a compaction triggers
    pub compaction_threshold: f64,
}

impl CapacityPolicy {
    pub fn new(size_limit: u64, compaction_threshold: f64) -> Self {
        Self {
            size_limit,
            compaction_threshold,
        }
    }

    /// Usage a compaction brings the store down to.
    pub fn compaction_target(&self) -> u64 {
        (self.size_limit as f64 * (1.0 - self.compaction_threshold)).floor() as u64
    }

    /// Largest entry, in units, worth caching when it is optional to cache it:
    /// the room one compaction frees.
    pub fn admission_limit(&self) -> u64 {
        self.size_limit.saturating_sub(self.compaction_target()).max(1)
    }
}

impl From<&CacheSettings> for CapacityPolicy {
    fn from(settings: &CacheSettings) -> Self {
        Self::new(settings.cache_size_limit, settings.compaction_threshold)
    }
}

// == Cache Store ==
/// Main cache storage with TTL expiry and capacity-bounded eviction.
///
/// Not synchronized; callers wrap it in a lock.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Write order, oldest at the back
    order: WriteOrder,
    /// Performance statistics
    stats: CacheStats,
    policy: CapacityPolicy,
    /// Sum of `size_units` over all entries
    used_units: u64,
    clock: Arc<dyn Clock>,
    listener: Option<Arc<dyn EvictionListener>>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity policy and clock.
    pub fn new(policy: CapacityPolicy, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            entries: HashMap::new(),
            order: WriteOrder::new(),
            stats: CacheStats::new(now),
            policy,
            used_units: 0,
            clock,
            listener: None,
        }
    }

    /// Registers the hook notified for every entry that leaves the store.
    pub fn with_listener(mut self, listener: Arc<dyn EvictionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    // == Set ==
    /// Stores a value under `key` for `ttl`.
    ///
    /// An existing entry is replaced and its TTL reset. If the write pushes the
    /// store over its size limit, a compaction runs before returning. A value
    /// larger than the whole size limit is rejected up front: the previous
    /// entry for `key` is dropped and every other entry is left alone.
    ///
    /// # Errors
    /// `InvalidArgument` if `ttl` is zero or too large to represent.
    pub fn set(&mut self, key: impl Into<String>, value: CachedValue, ttl: Duration) -> Result<()> {
        let key = key.into();
        let ttl = validate_ttl(&key, ttl)?;
        let now = self.clock.now();

        if let Some(previous) = self.detach(&key) {
            self.notify(&previous, EvictionReason::Replaced);
        }

        let entry = CacheEntry::new(key.clone(), value, now, ttl);
        if entry.size_units() > self.policy.size_limit {
            warn!(
                "Entry {} needs {} units, more than the cache size limit of {}; not retained",
                key,
                entry.size_units(),
                self.policy.size_limit
            );
            self.stats.record_eviction();
            self.notify(&entry, EvictionReason::Capacity);
            return Ok(());
        }

        self.used_units += entry.size_units();
        self.entries.insert(key.clone(), entry);
        self.order.record_write(&key);

        self.enforce_capacity(Some(key.as_str()), now);
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found, not expired and of the requested type.
    /// Expired entries are removed. Every call counts as a hit or a miss.
    pub fn get<T: Cacheable>(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.evict(key, EvictionReason::Expired);
            self.stats.record_miss();
            return None;
        }

        let value = self
            .entries
            .get(key)
            .and_then(|entry| T::from_cached(entry.value.clone()));
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    // == Peek ==
    /// Returns the live entry for `key` without touching the counters.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
    }

    /// True if a live entry exists for `key`. Does not touch the counters.
    pub fn contains_key(&self, key: &str) -> bool {
        self.peek(key).is_some()
    }

    // == Remove ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.detach(key) {
            Some(entry) => {
                self.notify(&entry, EvictionReason::Removed);
                true
            }
            None => false,
        }
    }

    /// Drops every entry without raising notifications.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.used_units = 0;
    }

    // == Compact ==
    /// Sweeps expired entries, then enforces the size limit.
    ///
    /// Returns the number of entries removed.
    pub fn compact(&mut self) -> usize {
        let now = self.clock.now();
        let removed = self.purge_expired(now) + self.enforce_capacity(None, now);
        self.stats.record_compaction(now);
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.used_units = self.used_units;
        stats
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn used_units(&self) -> u64 {
        self.used_units
    }

    // == Length ==
    /// Returns the current number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==
    fn enforce_capacity(&mut self, protect: Option<&str>, now: DateTime<Utc>) -> usize {
        if self.used_units <= self.policy.size_limit {
            return 0;
        }

        let mut removed = self.purge_expired(now);
        let target = self.policy.compaction_target();

        for key in self.order.oldest_first() {
            if self.used_units <= target {
                break;
            }
            if protect == Some(key.as_str()) {
                continue;
            }
            self.evict(&key, EvictionReason::Capacity);
            removed += 1;
        }

        self.stats.record_compaction(now);
        removed
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.evict(&key, EvictionReason::Expired);
        }
        count
    }

    fn evict(&mut self, key: &str, reason: EvictionReason) {
        if let Some(entry) = self.detach(key) {
            self.stats.record_eviction();
            self.notify(&entry, reason);
        }
    }

    fn detach(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.used_units = self.used_units.saturating_sub(entry.size_units());
        Some(entry)
    }

    fn notify(&self, entry: &CacheEntry, reason: EvictionReason) {
        if let Some(listener) = &self.listener {
            listener.on_eviction(&EvictionEvent {
                key: entry.key.clone(),
                reason,
                value_type: entry.value_type,
                estimated_size_bytes: entry.estimated_size_bytes,
            });
        }
    }
}

/// Rejects zero TTLs and converts to a chrono duration.
pub(crate) fn validate_ttl(key: &str, ttl: Duration) -> Result<chrono::Duration> {
    if ttl.is_zero() {
        return Err(TransitError::InvalidArgument(format!(
            "TTL for key '{}' must be positive",
            key
        )));
    }
    chrono::Duration::from_std(ttl).map_err(|_| {
        TransitError::InvalidArgument(format!("TTL for key '{}' is out of range", key))
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingListener {
        events: Mutex<Vec<EvictionEvent>>,
    }

    impl RecordingListener {
        fn reasons(&self) -> Vec<(String, EvictionReason)> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| (e.key.clone(), e.reason))
                .collect()
        }
    }

    impl EvictionListener for RecordingListener {
        fn on_eviction(&self, event: &EvictionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    const TTL: Duration = Duration::from_secs(30);

    fn test_store(size_limit: u64) -> (CacheStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let store = CacheStore::new(CapacityPolicy::new(size_limit, 0.25), Arc::new(clock.clone()));
        (store, clock)
    }

    /// A payload worth exactly `units` capacity units.
    fn sized(units: usize) -> CachedValue {
        CachedValue::Lines(vec![String::new(); units * 10])
    }

    #[test]
    fn test_store_new() {
        let (store, _) = test_store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.used_units(), 0);
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut store, _) = test_store(100);

        store
            .set("key1", CachedValue::Text("value1".to_string()), TTL)
            .unwrap();
        let value: Option<String> = store.get("key1");

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent_counts_miss() {
        let (mut store, _) = test_store(100);

        assert_eq!(store.get::<String>("nonexistent"), None);
        let stats = store.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_store_get_wrong_type_counts_miss() {
        let (mut store, _) = test_store(100);
        store
            .set("key1", CachedValue::Text("value1".to_string()), TTL)
            .unwrap();

        assert_eq!(store.get::<Vec<String>>("key1"), None);
        assert_eq!(store.stats().misses, 1);
        assert!(store.contains_key("key1"));
    }

    #[test]
    fn test_store_zero_ttl_rejected() {
        let (mut store, _) = test_store(100);
        let result = store.set("key1", CachedValue::Text("v".to_string()), Duration::ZERO);
        assert!(matches!(result, Err(TransitError::InvalidArgument(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_remove() {
        let (mut store, _) = test_store(100);

        store.set("key1", CachedValue::Text("v".to_string()), TTL).unwrap();
        assert!(store.remove("key1"));
        assert!(store.is_empty());
        assert_eq!(store.get::<String>("key1"), None);
    }

    #[test]
    fn test_store_remove_nonexistent() {
        let (mut store, _) = test_store(100);
        assert!(!store.remove("nonexistent"));
    }

    #[test]
    fn test_store_overwrite() {
        let (mut store, _) = test_store(100);

        store.set("key1", CachedValue::Text("value1".to_string()), TTL).unwrap();
        store.set("key1", CachedValue::Text("value2".to_string()), TTL).unwrap();

        assert_eq!(store.get::<String>("key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.used_units(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let (mut store, clock) = test_store(100);

        store.set("key1", CachedValue::Text("value1".to_string()), TTL).unwrap();
        assert!(store.get::<String>("key1").is_some());

        clock.advance(Duration::from_secs(31));

        assert_eq!(store.get::<String>("key1"), None);
        assert!(store.is_empty(), "expired entry is purged on read");
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_store_peek_hides_expired_entries() {
        let (mut store, clock) = test_store(100);
        store.set("key1", CachedValue::Text("v".to_string()), TTL).unwrap();

        clock.advance(Duration::from_secs(30));

        assert!(store.peek("key1").is_none());
        assert_eq!(store.len(), 1, "peek does not purge");
        assert_eq!(store.stats().misses, 0);
    }

    #[test]
    fn test_store_compact_purges_expired() {
        let (mut store, clock) = test_store(100);

        store.set("short", CachedValue::Text("v".to_string()), Duration::from_secs(1)).unwrap();
        store.set("long", CachedValue::Text("v".to_string()), Duration::from_secs(10)).unwrap();

        clock.advance(Duration::from_secs(2));

        assert_eq!(store.compact(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains_key("long"));
    }

    #[test]
    fn test_store_capacity_evicts_oldest_writes() {
        let (mut store, _) = test_store(100);

        store.set("a", sized(40), TTL).unwrap();
        store.set("b", sized(40), TTL).unwrap();
        store.set("c", sized(30), TTL).unwrap();

        // 110 units > 100: compaction down to 75 drops "a" only
        assert!(store.used_units() <= 100);
        assert!(!store.contains_key("a"));
        assert!(store.contains_key("b"));
        assert!(store.contains_key("c"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_capacity_prefers_expired_entries() {
        let (mut store, clock) = test_store(100);

        store.set("old-live", sized(40), Duration::from_secs(3600)).unwrap();
        store.set("expiring", sized(40), Duration::from_secs(5)).unwrap();
        clock.advance(Duration::from_secs(10));
        store.set("new", sized(30), TTL).unwrap();

        assert!(store.contains_key("old-live"));
        assert!(store.contains_key("new"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.used_units(), 70);
    }

    #[test]
    fn test_store_reads_do_not_protect_from_eviction() {
        let (mut store, _) = test_store(100);

        store.set("a", sized(40), TTL).unwrap();
        store.set("b", sized(40), TTL).unwrap();
        let _ = store.get::<Vec<String>>("a");
        store.set("c", sized(30), TTL).unwrap();

        assert!(!store.contains_key("a"));
    }

    #[test]
    fn test_store_oversized_entry_not_retained() {
        let (mut store, _) = test_store(100);

        store.set("small", sized(10), TTL).unwrap();
        store.set("huge", sized(150), TTL).unwrap();

        assert!(!store.contains_key("huge"));
        assert!(store.used_units() <= 100);
    }

    #[test]
    fn test_store_oversized_entry_leaves_others_alone() {
        let (mut store, _) = test_store(100);

        for i in 0..5 {
            store
                .set(format!("realtime:vehicle:{}", i), CachedValue::Text("v".to_string()), TTL)
                .unwrap();
        }
        store.set("static:raw:routes", sized(30), TTL).unwrap();
        store.set("huge", sized(200), TTL).unwrap();

        assert!(!store.contains_key("huge"));
        assert_eq!(store.len(), 6);
        assert_eq!(store.used_units(), 35);
        assert!(store.contains_key("static:raw:routes"));
        assert!(store.contains_key("realtime:vehicle:0"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_oversized_replacement_drops_previous_value() {
        let (mut store, _) = test_store(100);

        store.set("shapes", sized(10), TTL).unwrap();
        store.set("other", sized(10), TTL).unwrap();
        store.set("shapes", sized(150), TTL).unwrap();

        assert!(!store.contains_key("shapes"));
        assert!(store.contains_key("other"));
        assert_eq!(store.used_units(), 10);
    }

    #[test]
    fn test_store_listener_sees_every_departure() {
        let listener = Arc::new(RecordingListener::default());
        let (store, clock) = test_store(100);
        let mut store = store.with_listener(listener.clone());

        store.set("replaced", CachedValue::Text("1".to_string()), TTL).unwrap();
        store.set("replaced", CachedValue::Text("2".to_string()), TTL).unwrap();
        store.set("removed", CachedValue::Text("v".to_string()), TTL).unwrap();
        store.remove("removed");
        store.set("expired", CachedValue::Text("v".to_string()), Duration::from_secs(1)).unwrap();
        clock.advance(Duration::from_secs(2));
        store.compact();
        store.set("big-a", sized(60), Duration::from_secs(3600)).unwrap();
        store.set("big-b", sized(60), Duration::from_secs(3600)).unwrap();

        let reasons = listener.reasons();
        assert!(reasons.contains(&("replaced".to_string(), EvictionReason::Replaced)));
        assert!(reasons.contains(&("removed".to_string(), EvictionReason::Removed)));
        assert!(reasons.contains(&("expired".to_string(), EvictionReason::Expired)));
        assert!(reasons.contains(&("replaced".to_string(), EvictionReason::Capacity)));
    }

    #[test]
    fn test_store_compact_records_timestamp() {
        let (mut store, clock) = test_store(100);
        store.set("k", CachedValue::Text("v".to_string()), Duration::from_secs(1)).unwrap();

        clock.advance(Duration::from_secs(5));
        let removed = store.compact();

        assert_eq!(removed, 1);
        assert_eq!(store.stats().last_compaction_at, clock.now());
    }

    #[test]
    fn test_store_clear() {
        let (mut store, _) = test_store(100);
        store.set("a", sized(5), TTL).unwrap();
        store.set("b", sized(5), TTL).unwrap();

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.used_units(), 0);
    }

    #[test]
    fn test_compaction_target() {
        assert_eq!(CapacityPolicy::new(100, 0.25).compaction_target(), 75);
        assert_eq!(CapacityPolicy::new(10, 0.5).compaction_target(), 5);
    }

    #[test]
    fn test_admission_limit_is_compaction_headroom() {
        assert_eq!(CapacityPolicy::new(100, 0.25).admission_limit(), 25);
        assert_eq!(CapacityPolicy::new(10, 0.5).admission_limit(), 5);
        assert_eq!(CapacityPolicy::new(1, 0.0).admission_limit(), 1);
    }
}
