//! API Routes
//!
//! Configures the Axum router with all transit API endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    all_routes_handler, cache_config_handler, check_key_handler, current_positions_enhanced_handler,
    current_positions_handler, diagnostics_handler, health_handler, position_by_route_enhanced_handler,
    position_by_route_handler, route_shape_handler, static_file_handler, test_expiration_handler,
    upstream_health_handler, vehicle_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let vehicles = Router::new()
        .route("/CurrentPositions", get(current_positions_handler))
        .route(
            "/CurrentPositionsEnhanced",
            get(current_positions_enhanced_handler),
        )
        .route("/CurrentPositionByRoute", get(position_by_route_handler))
        .route(
            "/CurrentPositionByRouteEnhanced",
            get(position_by_route_enhanced_handler),
        )
        .route("/Vehicle/:vehicle_id", get(vehicle_handler));

    let routes = Router::new()
        .route("/AllRoutes", get(all_routes_handler))
        .route("/RouteShape", get(route_shape_handler));

    let diagnostics = Router::new()
        .route("/", get(diagnostics_handler))
        .route("/check-key/:key", get(check_key_handler))
        .route("/test-expiration/:seconds", post(test_expiration_handler));

    Router::new()
        .nest("/api/VehiclePosition", vehicles)
        .nest("/api/Route", routes)
        .route("/api/GtfsData/StaticFile/:kind", get(static_file_handler))
        .route("/api/Statistics/health", get(upstream_health_handler))
        .route("/api/Statistics/cache/config", get(cache_config_handler))
        .nest("/api/CacheDiagnostics", diagnostics)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
