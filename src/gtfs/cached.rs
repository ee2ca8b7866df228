//! Fetch-level cache: raw realtime payloads and raw static file lines.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::cache::{CacheService, KeyPolicy};
use crate::config::CacheSettings;
use crate::error::Result;
use crate::gtfs::{GtfsFetcher, StaticFileKind};

/// Wraps a [`GtfsFetcher`] and serves repeated fetches from the cache.
pub struct CachedGtfsFetcher<F> {
    inner: F,
    cache: Arc<CacheService>,
    keys: KeyPolicy,
    realtime_ttl: Duration,
    static_ttl: Duration,
}

impl<F: GtfsFetcher> CachedGtfsFetcher<F> {
    pub fn new(inner: F, cache: Arc<CacheService>, settings: &CacheSettings) -> Self {
        let keys = KeyPolicy::new(cache.clock());
        Self {
            inner,
            cache,
            keys,
            realtime_ttl: settings.realtime_ttl(),
            static_ttl: settings.static_ttl(),
        }
    }
}

#[async_trait]
impl<F: GtfsFetcher> GtfsFetcher for CachedGtfsFetcher<F> {
    async fn fetch_realtime(&self) -> Result<Vec<u8>> {
        let key = self.keys.realtime_feed();
        let inner = &self.inner;
        self.cache
            .get_or_populate_bounded(&key, self.realtime_ttl, move || async move {
                debug!("Fetching realtime data from source");
                inner.fetch_realtime().await
            })
            .await
    }

    async fn fetch_static_file(&self, kind: StaticFileKind) -> Result<Vec<String>> {
        let key = self.keys.raw_static_file(kind);
        let inner = &self.inner;
        self.cache
            .get_or_populate_bounded(&key, self.static_ttl, move || async move {
                info!("Fetching static data for file {} from source", kind.file_name());
                inner.fetch_static_file(kind).await
            })
            .await
    }
}
