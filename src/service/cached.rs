//! Get-or-populate wrapper over any [`TransitData`].
//!
//! Each query derives its key from [`KeyPolicy`] and goes through
//! [`CacheService::get_or_populate`]. Realtime queries use the short TTL,
//! static and shape queries the long one. Failures are never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheService, KeyPolicy};
use crate::config::CacheSettings;
use crate::error::Result;
use crate::gtfs::StaticFileKind;
use crate::models::{
    EnhancedVehiclePosition, Route, ShapePoint, VehiclePositionData, VehiclePositions,
};
use crate::service::TransitData;

pub struct CachedTransitService<S> {
    inner: S,
    cache: Arc<CacheService>,
    keys: KeyPolicy,
    realtime_ttl: Duration,
    static_ttl: Duration,
}

impl<S: TransitData> CachedTransitService<S> {
    pub fn new(inner: S, cache: Arc<CacheService>, settings: &CacheSettings) -> Self {
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
impl<S: TransitData> TransitData for CachedTransitService<S> {
    async fn all_vehicle_positions(&self) -> Result<VehiclePositions> {
        let inner = &self.inner;
        let key = self.keys.all_vehicles();
        self.cache
            .get_or_populate(&key, self.realtime_ttl, move || async move {
                inner.all_vehicle_positions().await
            })
            .await
    }

    async fn vehicle_positions_by_route(&self, route_id: &str) -> Result<VehiclePositions> {
        let inner = &self.inner;
        let key = self.keys.vehicles_by_route(route_id);
        self.cache
            .get_or_populate(&key, self.realtime_ttl, move || async move {
                inner.vehicle_positions_by_route(route_id).await
            })
            .await
    }

    async fn vehicle_by_id(&self, vehicle_id: &str) -> Result<VehiclePositionData> {
        let inner = &self.inner;
        let key = self.keys.vehicle(vehicle_id);
        self.cache
            .get_or_populate(&key, self.realtime_ttl, move || async move {
                inner.vehicle_by_id(vehicle_id).await
            })
            .await
    }

    async fn enhanced_positions(&self) -> Result<Vec<EnhancedVehiclePosition>> {
        let inner = &self.inner;
        let key = self.keys.enhanced_positions();
        self.cache
            .get_or_populate(&key, self.realtime_ttl, move || async move {
                inner.enhanced_positions().await
            })
            .await
    }

    async fn enhanced_positions_by_route(
        &self,
        route_id: &str,
    ) -> Result<Option<EnhancedVehiclePosition>> {
        let inner = &self.inner;
        let key = self.keys.enhanced_by_route(route_id);
        self.cache
            .get_or_populate_optional(&key, self.realtime_ttl, move || async move {
                inner.enhanced_positions_by_route(route_id).await
            })
            .await
    }

    async fn all_routes(&self) -> Result<Vec<Route>> {
        let inner = &self.inner;
        let key = self.keys.all_routes();
        self.cache
            .get_or_populate(&key, self.static_ttl, move || async move {
                inner.all_routes().await
            })
            .await
    }

    async fn route_info(&self, route_id: &str) -> Result<Option<Route>> {
        let inner = &self.inner;
        let key = self.keys.route_info(route_id);
        self.cache
            .get_or_populate_optional(&key, self.static_ttl, move || async move {
                inner.route_info(route_id).await
            })
            .await
    }

    async fn route_shape(&self, route_id: &str) -> Result<Vec<ShapePoint>> {
        let inner = &self.inner;
        let key = self.keys.route_shape(route_id);
        self.cache
            .get_or_populate(&key, self.static_ttl, move || async move {
                inner.route_shape(route_id).await
            })
            .await
    }

    async fn static_file(&self, kind: StaticFileKind) -> Result<Vec<String>> {
        let inner = &self.inner;
        let key = self.keys.static_file(kind);
        self.cache
            .get_or_populate_bounded(&key, self.static_ttl, move || async move {
                inner.static_file(kind).await
            })
            .await
    }
}
