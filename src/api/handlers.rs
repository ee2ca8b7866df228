//! API Handlers
//!
//! HTTP request handlers for the transit, statistics and diagnostics endpoints.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::cache::{CacheDiagnosticsSnapshot, CacheService, Clock, SystemClock};
use crate::config::{CacheSettings, Config};
use crate::error::{Result, TransitError};
use crate::gtfs::{CachedGtfsFetcher, GtfsFetcher, HttpGtfsFetcher, StaticFileKind};
use crate::models::{
    CacheConfigResponse, EnhancedVehiclePosition, HealthResponse, KeyCheckResponse, Route,
    RouteQuery, ShapePoint, TestExpirationResponse, UpstreamHealthResponse, UpstreamStatus,
    VehiclePositionData, VehiclePositions,
};
use crate::service::{CachedTransitService, GtfsService, TransitData};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached transit queries
    pub transit: Arc<dyn TransitData>,
    pub cache: Arc<CacheService>,
    /// Uncached upstream access, used by the health probe
    pub upstream: Arc<dyn GtfsFetcher>,
    pub settings: CacheSettings,
}

impl AppState {
    /// Wires the fetch-level and service-level caches around `upstream`.
    pub fn new(upstream: Arc<dyn GtfsFetcher>, settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        let cache = Arc::new(CacheService::with_clock(&settings, clock));
        let fetcher = CachedGtfsFetcher::new(upstream.clone(), cache.clone(), &settings);
        let transit = CachedTransitService::new(
            GtfsService::new(Arc::new(fetcher)),
            cache.clone(),
            &settings,
        );

        Self {
            transit: Arc::new(transit),
            cache,
            upstream,
            settings,
        }
    }

    /// Creates a new AppState from configuration, talking to the real upstream.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = HttpGtfsFetcher::new(&config.gtfs)?;
        Ok(Self::new(
            Arc::new(upstream),
            config.cache.clone(),
            Arc::new(SystemClock),
        ))
    }
}

// == Vehicle Positions ==
/// Handler for GET /api/VehiclePosition/CurrentPositions
pub async fn current_positions_handler(
    State(state): State<AppState>,
) -> Result<Json<VehiclePositions>> {
    Ok(Json(state.transit.all_vehicle_positions().await?))
}

/// Handler for GET /api/VehiclePosition/CurrentPositionsEnhanced
pub async fn current_positions_enhanced_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<EnhancedVehiclePosition>>> {
    Ok(Json(state.transit.enhanced_positions().await?))
}

/// Handler for GET /api/VehiclePosition/CurrentPositionByRoute?routeId=
pub async fn position_by_route_handler(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<VehiclePositions>> {
    let route_id = query.validate().map_err(TransitError::InvalidArgument)?;
    Ok(Json(state.transit.vehicle_positions_by_route(route_id).await?))
}

/// Handler for GET /api/VehiclePosition/CurrentPositionByRouteEnhanced?routeId=
///
/// Answers 404 when no vehicle currently serves the route.
pub async fn position_by_route_enhanced_handler(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<EnhancedVehiclePosition>> {
    let route_id = query.validate().map_err(TransitError::InvalidArgument)?;
    state
        .transit
        .enhanced_positions_by_route(route_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            TransitError::NotFound(format!("No vehicles found for route {}", route_id))
        })
}

/// Handler for GET /api/VehiclePosition/Vehicle/:vehicle_id
pub async fn vehicle_handler(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<VehiclePositionData>> {
    Ok(Json(state.transit.vehicle_by_id(&vehicle_id).await?))
}

// == Routes ==
/// Handler for GET /api/Route/AllRoutes
pub async fn all_routes_handler(State(state): State<AppState>) -> Result<Json<Vec<Route>>> {
    Ok(Json(state.transit.all_routes().await?))
}

/// Handler for GET /api/Route/RouteShape?routeId=
pub async fn route_shape_handler(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<Vec<ShapePoint>>> {
    let route_id = query.validate().map_err(TransitError::InvalidArgument)?;
    Ok(Json(state.transit.route_shape(route_id).await?))
}

/// Handler for GET /api/GtfsData/StaticFile/:kind
pub async fn static_file_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<String>>> {
    let kind: StaticFileKind = kind.parse()?;
    Ok(Json(state.transit.static_file(kind).await?))
}

// == Statistics ==
/// Handler for GET /api/Statistics/health
///
/// Probes the upstream realtime feed directly, bypassing the cache. An
/// unhealthy upstream answers 503.
pub async fn upstream_health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<UpstreamHealthResponse>) {
    if !state.settings.enable_health_check {
        return (StatusCode::OK, Json(UpstreamHealthResponse::disabled()));
    }

    let started = Instant::now();
    let outcome = state
        .upstream
        .fetch_realtime()
        .await
        .map(|bytes| bytes.len())
        .map_err(|e| e.to_string());
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let report = UpstreamHealthResponse::from_probe(outcome, elapsed_ms);
    let status = match report.status {
        UpstreamStatus::Unhealthy => {
            warn!("Upstream health check failed: {}", report.description);
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::OK,
    };
    (status, Json(report))
}

/// Handler for GET /api/Statistics/cache/config
pub async fn cache_config_handler(State(state): State<AppState>) -> Json<CacheConfigResponse> {
    Json(CacheConfigResponse::new(state.settings.clone()))
}

// == Cache Diagnostics ==
/// Handler for GET /api/CacheDiagnostics
pub async fn diagnostics_handler(State(state): State<AppState>) -> Json<CacheDiagnosticsSnapshot> {
    Json(state.cache.diagnostics().await)
}

/// Handler for GET /api/CacheDiagnostics/check-key/:key
///
/// Looks the key up without touching hit/miss counters.
pub async fn check_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<KeyCheckResponse> {
    let now = state.cache.clock().now();
    let entry = state.cache.peek(&key).await;
    Json(KeyCheckResponse {
        key,
        exists: entry.is_some(),
        ttl_remaining_seconds: entry.as_ref().map(|e| e.ttl_remaining(now).num_seconds()),
        value: entry.map(|e| e.value),
        checked_at: now,
    })
}

/// Handler for POST /api/CacheDiagnostics/test-expiration/:seconds
///
/// Stores a throwaway JSON value that expires after `seconds`.
pub async fn test_expiration_handler(
    State(state): State<AppState>,
    Path(seconds): Path<u64>,
) -> Result<Json<TestExpirationResponse>> {
    let now = state.cache.clock().now();
    let key = format!("test-expiration-{}", now.format("%H%M%S"));
    let value = json!({
        "message": "Test cache entry",
        "setAt": now.to_rfc3339(),
    });

    state
        .cache
        .set(&key, value, Duration::from_secs(seconds))
        .await?;
    let entry = state
        .cache
        .peek(&key)
        .await
        .ok_or_else(|| TransitError::Internal(format!("test entry {} was not retained", key)))?;
    info!("Set test cache entry {} expiring in {}s", key, seconds);

    Ok(Json(TestExpirationResponse {
        key,
        expiration_seconds: seconds,
        set_at: entry.created_at,
        expires_at: entry.expires_at,
    }))
}

/// Handler for GET /health
///
/// Liveness only; does not touch the upstream.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
