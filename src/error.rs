//! Error types for the transit API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Transit Error Enum ==
/// Unified error type for the cache layer, the upstream fetchers and the API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitError {
    /// Malformed TTL or configuration value outside its documented range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The upstream provider could not be reached or returned garbage
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// The upstream answered, but with nothing the caller can use
    #[error("No data available: {0}")]
    NoDataAvailable(String),

    /// A specific resource (vehicle, route) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for TransitError {
    fn into_response(self) -> Response {
        let status = match &self {
            TransitError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            TransitError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            TransitError::NoDataAvailable(_) => StatusCode::NOT_FOUND,
            TransitError::NotFound(_) => StatusCode::NOT_FOUND,
            TransitError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the transit API.
pub type Result<T> = std::result::Result<T, TransitError>;
