//! Request and Response models for the transit API
//!
//! This module defines the transit shapes served to clients and the DTOs
//! used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;
pub mod transit;

// Re-export commonly used types
pub use requests::RouteQuery;
pub use responses::{
    CacheConfigResponse, ErrorResponse, HealthResponse, KeyCheckResponse, TestExpirationResponse,
    UpstreamHealthResponse, UpstreamStatus,
};
pub use transit::{
    EnhancedVehiclePosition, Route, ShapePoint, VehiclePositionData, VehiclePositions,
    DEFAULT_ROUTE_TYPE,
};
