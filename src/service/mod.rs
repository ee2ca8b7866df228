//! Transit Service Module
//!
//! The query surface the HTTP layer talks to. [`GtfsService`] computes every
//! answer from upstream data; [`CachedTransitService`] wraps any
//! [`TransitData`] and serves answers from the cache.

mod cached;
mod gtfs;

pub use cached::CachedTransitService;
pub use gtfs::GtfsService;

use async_trait::async_trait;

use crate::error::Result;
use crate::gtfs::StaticFileKind;
use crate::models::{EnhancedVehiclePosition, Route, ShapePoint, VehiclePositionData, VehiclePositions};

#[async_trait]
pub trait TransitData: Send + Sync {
    /// Route id to `"lat,lng"` positions for every vehicle in the feed.
    ///
    /// # Errors
    /// `NoDataAvailable` when the feed has no positioned vehicles.
    async fn all_vehicle_positions(&self) -> Result<VehiclePositions>;

    /// Single-entry map for `route_id`; the list is empty if no vehicle serves it.
    async fn vehicle_positions_by_route(&self, route_id: &str) -> Result<VehiclePositions>;

    /// # Errors
    /// `NotFound` when no vehicle in the feed has this id.
    async fn vehicle_by_id(&self, vehicle_id: &str) -> Result<VehiclePositionData>;

    async fn enhanced_positions(&self) -> Result<Vec<EnhancedVehiclePosition>>;

    /// `None` when no vehicle currently serves `route_id`.
    async fn enhanced_positions_by_route(
        &self,
        route_id: &str,
    ) -> Result<Option<EnhancedVehiclePosition>>;

    /// # Errors
    /// `NoDataAvailable` when the routes file is empty.
    async fn all_routes(&self) -> Result<Vec<Route>>;

    /// `None` when the routes file has no such route.
    async fn route_info(&self, route_id: &str) -> Result<Option<Route>>;

    /// # Errors
    /// `NoDataAvailable` when the shapes file is empty.
    async fn route_shape(&self, route_id: &str) -> Result<Vec<ShapePoint>>;

    /// # Errors
    /// `NoDataAvailable` when the file is missing or empty.
    async fn static_file(&self, kind: StaticFileKind) -> Result<Vec<String>>;
}
