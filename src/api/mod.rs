//! API Module
//!
//! HTTP handlers and routing for the transit REST API.
//!
//! # Endpoints
//! - `GET /api/VehiclePosition/CurrentPositions` - Positions grouped by route
//! - `GET /api/VehiclePosition/CurrentPositionsEnhanced` - Positions with route attributes
//! - `GET /api/VehiclePosition/CurrentPositionByRoute?routeId=` - One route's positions
//! - `GET /api/VehiclePosition/CurrentPositionByRouteEnhanced?routeId=` - One enhanced route
//! - `GET /api/VehiclePosition/Vehicle/:vehicle_id` - A single vehicle
//! - `GET /api/Route/AllRoutes` - Every route in the schedule
//! - `GET /api/Route/RouteShape?routeId=` - Shape points of a route
//! - `GET /api/GtfsData/StaticFile/:kind` - Raw rows of a static file
//! - `GET /api/Statistics/health` - Upstream probe
//! - `GET /api/Statistics/cache/config` - Active cache settings
//! - `GET /api/CacheDiagnostics` - Cache snapshot
//! - `GET /api/CacheDiagnostics/check-key/:key` - Look up one key
//! - `POST /api/CacheDiagnostics/test-expiration/:seconds` - Store a short-lived test entry
//! - `GET /health` - Liveness

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
