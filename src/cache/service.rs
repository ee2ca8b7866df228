//! Cache Service Module
//!
//! Shared, async front of the cache: a locked [`CacheStore`] plus the metadata
//! index that diagnostics read from, and the get-or-populate pattern built on
//! top of them.
//!
//! `get_or_populate` is not single-flighted. Concurrent misses on the same key
//! each run their populate future and the last `set` wins. Populate futures run
//! with no lock held.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::store::validate_ttl;
use crate::cache::{
    CacheDiagnosticsSnapshot, CacheEntry, CacheStats, CacheStore, Cacheable, CapacityPolicy,
    Clock, EntryInfo, EvictionEvent, EvictionListener, MetadataIndex, SystemClock,
    size_units,
};
use crate::config::CacheSettings;
use crate::error::Result;

// == Metadata Listener ==
/// Keeps the metadata index in step with entries leaving the store.
#[derive(Debug)]
struct MetadataEvictionListener {
    metadata: Arc<MetadataIndex>,
    verbose: bool,
}

impl EvictionListener for MetadataEvictionListener {
    fn on_eviction(&self, event: &EvictionEvent) {
        self.metadata.forget(&event.key);
        if self.verbose {
            debug!(
                "Cache EVICT: {} ({}, {}, {} bytes)",
                event.key, event.reason, event.value_type, event.estimated_size_bytes
            );
        }
    }
}

// == Cache Service ==
#[derive(Debug)]
pub struct CacheService {
    store: RwLock<CacheStore>,
    metadata: Arc<MetadataIndex>,
    clock: Arc<dyn Clock>,
    policy: CapacityPolicy,
    log_operations: bool,
}

impl CacheService {
    // == Constructor ==
    /// Creates a service on the system clock.
    pub fn new(settings: &CacheSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Creates a service reading time from `clock`.
    pub fn with_clock(settings: &CacheSettings, clock: Arc<dyn Clock>) -> Self {
        let metadata = Arc::new(MetadataIndex::new());
        let listener = Arc::new(MetadataEvictionListener {
            metadata: metadata.clone(),
            verbose: settings.log_cache_operations,
        });
        let policy = CapacityPolicy::from(settings);
        let store = CacheStore::new(policy, clock.clone()).with_listener(listener);

        Self {
            store: RwLock::new(store),
            metadata,
            clock,
            policy,
            log_operations: settings.log_cache_operations,
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    // == Get ==
    /// Typed lookup; absent, expired or differently-typed entries are misses.
    pub async fn get<T: Cacheable>(&self, key: &str) -> Option<T> {
        let value = self.store.write().await.get::<T>(key);
        if self.log_operations {
            match value {
                Some(_) => debug!("Cache HIT: {}", key),
                None => debug!("Cache MISS: {}", key),
            }
        }
        value
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` and records its metadata.
    ///
    /// # Errors
    /// `InvalidArgument` when `ttl` is zero.
    pub async fn set<T: Cacheable>(&self, key: &str, value: T, ttl: Duration) -> Result<()> {
        let mut store = self.store.write().await;
        store.set(key, value.into_cached(), ttl)?;

        // A value larger than the size limit is not retained.
        if let Some(entry) = store.peek(key) {
            self.metadata.record(EntryInfo::from(entry));
            self.log_set(entry, ttl);
        }
        Ok(())
    }

    fn log_set(&self, entry: &CacheEntry, ttl: Duration) {
        if self.log_operations {
            debug!(
                "Cache SET: {} ({}, {} bytes, ttl {:?})",
                entry.key, entry.value_type, entry.estimated_size_bytes, ttl
            );
        } else {
            info!("Cached {} for {:?}", entry.key, ttl);
        }
    }

    // == Remove ==
    /// Deletes `key` if present. Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> bool {
        let removed = self.store.write().await.remove(key);
        if self.log_operations {
            debug!("Cache REMOVE: {} (present: {})", key, removed);
        }
        removed
    }

    // == Get Or Populate ==
    /// Returns the cached value for `key`, or runs `populate` and caches its result.
    ///
    /// Populate errors propagate and nothing is cached.
    pub async fn get_or_populate<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        populate: F,
    ) -> Result<T>
    where
        T: Cacheable + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        validate_ttl(key, ttl)?;

        if let Some(value) = self.get::<T>(key).await {
            return Ok(value);
        }

        let value = populate().await?;
        self.set(key, value.clone(), ttl).await?;
        Ok(value)
    }

    /// Like [`get_or_populate`](Self::get_or_populate), but a populated value
    /// bigger than [`CapacityPolicy::admission_limit`] is returned without being
    /// cached, so one bulky payload cannot push everything else out.
    pub async fn get_or_populate_bounded<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        populate: F,
    ) -> Result<T>
    where
        T: Cacheable + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        validate_ttl(key, ttl)?;

        if let Some(value) = self.get::<T>(key).await {
            return Ok(value);
        }

        let value = populate().await?;
        let cached = value.clone().into_cached();
        let units = size_units(cached.estimated_size());
        if units > self.policy.admission_limit() {
            info!(
                "Not caching {}: {} units exceed the admission limit of {}",
                key,
                units,
                self.policy.admission_limit()
            );
            return Ok(value);
        }

        self.set(key, cached, ttl).await?;
        Ok(value)
    }

    /// Like [`get_or_populate`](Self::get_or_populate) for lookups that may find
    /// nothing. An absent result is cached too, so it is not refetched until
    /// `ttl` passes.
    pub async fn get_or_populate_optional<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        populate: F,
    ) -> Result<Option<T>>
    where
        T: Cacheable + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        self.get_or_populate::<Option<T>, _, _>(key, ttl, populate).await
    }

    // == Inspection ==
    /// True if a live entry exists. Leaves hit/miss counters alone.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.store.read().await.contains_key(key)
    }

    /// Clone of the live entry for `key`, without counting a hit or miss.
    pub async fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.store.read().await.peek(key).cloned()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Diagnostics snapshot; sweeps expired metadata first.
    pub async fn diagnostics(&self) -> CacheDiagnosticsSnapshot {
        let stats = self.stats().await;
        CacheDiagnosticsSnapshot::capture(&self.metadata, &stats, self.clock.now())
    }

    // == Maintenance ==
    /// Sweeps expired entries and enforces the size limit. Returns entries removed.
    pub async fn compact(&self) -> usize {
        let removed = self.store.write().await.compact();
        self.metadata.sweep_expired(self.clock.now());
        removed
    }

    /// Drops every entry and all metadata.
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        store.clear();
        self.metadata.clear();
        info!("Cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachedValue, ManualClock};
    use crate::error::TransitError;
    use crate::models::VehiclePositionData;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_service() -> (CacheService, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let service = CacheService::with_clock(&CacheSettings::default(), Arc::new(clock.clone()));
        (service, clock)
    }

    fn vehicle_42() -> VehiclePositionData {
        VehiclePositionData {
            vehicle_id: "42".to_string(),
            latitude: 45.8,
            longitude: 16.0,
            last_update: None,
            speed: None,
            bearing: None,
        }
    }

    #[tokio::test]
    async fn test_vehicle_entry_expires_after_ttl() {
        let (cache, clock) = test_service();
        let key = "realtime:vehicle:42";

        cache.set(key, vehicle_42(), Duration::from_secs(30)).await.unwrap();
        assert_eq!(cache.get::<VehiclePositionData>(key).await, Some(vehicle_42()));

        clock.advance(Duration::from_secs(31));

        assert_eq!(cache.get::<VehiclePositionData>(key).await, None);
        assert!(cache.diagnostics().await.recent_entries.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_populate_calls_populate_once() {
        let (cache, _) = test_service();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let key = "static:routes:2024-01-01";
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["route1".to_string(), "route2".to_string()])
        };

        let first = cache
            .get_or_populate(key, Duration::from_secs(24 * 3600), fetch)
            .await
            .unwrap();
        let second = cache
            .get_or_populate(key, Duration::from_secs(24 * 3600), fetch)
            .await
            .unwrap();

        assert_eq!(first, vec!["route1".to_string(), "route2".to_string()]);
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_populate_skips_values_over_admission_limit() {
        let (cache, _) = test_service();
        cache
            .set("realtime:feed", vec![0u8; 20_000], Duration::from_secs(30))
            .await
            .unwrap();

        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let stops = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["1,Stop,45.8,16.0".to_string(); 2000])
        };
        let ttl = Duration::from_secs(24 * 3600);

        let first = cache
            .get_or_populate_bounded("static:raw:stops:2024-01-01", ttl, stops)
            .await
            .unwrap();
        cache
            .get_or_populate_bounded("static:raw:stops:2024-01-01", ttl, stops)
            .await
            .unwrap();

        assert_eq!(first.len(), 2000);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.get::<Vec<String>>("static:raw:stops:2024-01-01").await.is_none());
        assert_eq!(cache.get::<Vec<u8>>("realtime:feed").await.map(|v| v.len()), Some(20_000));
    }

    #[tokio::test]
    async fn test_bounded_populate_caches_small_values() {
        let (cache, _) = test_service();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let routes = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["1,1,\"1\"".to_string(); 100])
        };
        let ttl = Duration::from_secs(24 * 3600);

        cache.get_or_populate_bounded("static:raw:routes:2024-01-01", ttl, routes).await.unwrap();
        cache.get_or_populate_bounded("static:raw:routes:2024-01-01", ttl, routes).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_populate_does_not_cache_errors() {
        let (cache, _) = test_service();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let failing = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<Vec<String>, _>(TransitError::UpstreamFetch("connection refused".to_string()))
        };

        for _ in 0..2 {
            let result = cache
                .get_or_populate("realtime:all-vehicles", Duration::from_secs(30), failing)
                .await;
            assert!(matches!(result, Err(TransitError::UpstreamFetch(_))));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.contains_key("realtime:all-vehicles").await);
    }

    #[tokio::test]
    async fn test_get_or_populate_rejects_zero_ttl_before_fetching() {
        let (cache, _) = test_service();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result = cache
            .get_or_populate("k", Duration::ZERO, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("v".to_string())
            })
            .await;

        assert!(matches!(result, Err(TransitError::InvalidArgument(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_populate() {
        let (cache, _) = test_service();
        let cache = Arc::new(cache);
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let mut handles = Vec::new();
        for i in 0..2 {
            let cache = cache.clone();
            let calls = calls.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_populate("realtime:all-vehicles", Duration::from_secs(30), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // both callers are past their miss before either sets
                        barrier.wait().await;
                        Ok(vec![format!("caller-{}", i)])
                    })
                    .await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let stored = cache.get::<Vec<String>>("realtime:all-vehicles").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].starts_with("caller-"));
        assert_eq!(cache.diagnostics().await.total_entries, 1);
    }

    #[tokio::test]
    async fn test_get_or_populate_optional_caches_absence() {
        let (cache, _) = test_service();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let populate = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(None::<VehiclePositionData>)
        };

        let first = cache
            .get_or_populate_optional("realtime:enhanced:99", Duration::from_secs(30), populate)
            .await
            .unwrap();
        let second = cache
            .get_or_populate_optional("realtime:enhanced:99", Duration::from_secs(30), populate)
            .await
            .unwrap();

        assert_eq!(first, None);
        assert_eq!(second, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_diagnostics_hit_ratio_and_entries() {
        let (cache, _) = test_service();
        cache.set("a", "1".to_string(), Duration::from_secs(30)).await.unwrap();
        cache.set("b", vec!["x".to_string(); 25], Duration::from_secs(30)).await.unwrap();

        let _ = cache.get::<String>("a").await;
        let _ = cache.get::<String>("a").await;
        let _ = cache.get::<String>("a").await;
        let _ = cache.get::<String>("missing").await;

        let snapshot = cache.diagnostics().await;
        assert_eq!(snapshot.hit_count, 3);
        assert_eq!(snapshot.miss_count, 1);
        assert_eq!(snapshot.hit_ratio, 0.75);
        assert_eq!(snapshot.total_entries, 2);
        assert_eq!(snapshot.estimated_memory_usage, 100 + 2500);
    }

    #[tokio::test]
    async fn test_remove_forgets_metadata() {
        let (cache, _) = test_service();
        cache.set("k", "v".to_string(), Duration::from_secs(30)).await.unwrap();

        assert!(cache.remove("k").await);
        assert!(!cache.remove("k").await);
        assert_eq!(cache.diagnostics().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_capacity_eviction_forgets_metadata() {
        let (cache, _) = test_service();
        for i in 0..6 {
            let value = CachedValue::Lines(vec![String::new(); 200]);
            cache.set(&format!("k{}", i), value, Duration::from_secs(60)).await.unwrap();
        }

        let snapshot = cache.diagnostics().await;
        let stats = cache.stats().await;
        assert!(stats.used_units <= 100);
        assert_eq!(snapshot.total_entries, stats.total_entries);
        assert!(stats.evictions > 0);
    }

    #[tokio::test]
    async fn test_peek_and_contains_do_not_count() {
        let (cache, _) = test_service();
        cache.set("k", "v".to_string(), Duration::from_secs(30)).await.unwrap();

        assert!(cache.contains_key("k").await);
        assert_eq!(cache.peek("k").await.map(|e| e.value_type), Some("text"));
        assert!(cache.peek("nope").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[tokio::test]
    async fn test_compact_and_clear() {
        let (cache, clock) = test_service();
        cache.set("short", "v".to_string(), Duration::from_secs(5)).await.unwrap();
        cache.set("long", "v".to_string(), Duration::from_secs(500)).await.unwrap();

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.compact().await, 1);
        assert_eq!(cache.diagnostics().await.last_compaction, clock.now());

        cache.clear().await;
        assert!(!cache.contains_key("long").await);
        assert_eq!(cache.diagnostics().await.total_entries, 0);
    }
}
