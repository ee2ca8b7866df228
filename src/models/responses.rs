//! Response DTOs for the transit API
//!
//! Defines the structure of outgoing HTTP response bodies that are not
//! transit data themselves.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CachedValue;
use crate::config::CacheSettings;

/// Response body for the liveness endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Outcome of probing the upstream realtime feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpstreamStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Response body for GET /api/Statistics/health
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamHealthResponse {
    pub status: UpstreamStatus,
    pub description: String,
    pub response_time_ms: Option<u64>,
    pub payload_bytes: Option<usize>,
    pub checked_at: DateTime<Utc>,
}

impl UpstreamHealthResponse {
    /// Probe skipped because health checks are turned off.
    pub fn disabled() -> Self {
        Self {
            status: UpstreamStatus::Healthy,
            description: "Health check is disabled".to_string(),
            response_time_ms: None,
            payload_bytes: None,
            checked_at: Utc::now(),
        }
    }

    /// Classifies a finished probe of the realtime feed.
    pub fn from_probe(outcome: Result<usize, String>, response_time_ms: u64) -> Self {
        let (status, description, payload_bytes) = match outcome {
            Ok(0) => (
                UpstreamStatus::Degraded,
                "GTFS realtime API returned empty data".to_string(),
                Some(0),
            ),
            Ok(bytes) => (
                UpstreamStatus::Healthy,
                format!("GTFS realtime API responded in {}ms", response_time_ms),
                Some(bytes),
            ),
            Err(reason) => (
                UpstreamStatus::Unhealthy,
                format!("GTFS realtime API is unavailable: {}", reason),
                None,
            ),
        };

        Self {
            status,
            description,
            response_time_ms: Some(response_time_ms),
            payload_bytes,
            checked_at: Utc::now(),
        }
    }
}

/// Response body for GET /api/Statistics/cache/config
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfigResponse {
    pub configuration: CacheSettings,
    pub timestamp: DateTime<Utc>,
}

impl CacheConfigResponse {
    pub fn new(configuration: CacheSettings) -> Self {
        Self {
            configuration,
            timestamp: Utc::now(),
        }
    }
}

/// Response body for GET /api/CacheDiagnostics/check-key/:key
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCheckResponse {
    pub key: String,
    pub exists: bool,
    pub value: Option<CachedValue>,
    pub ttl_remaining_seconds: Option<i64>,
    pub checked_at: DateTime<Utc>,
}

/// Response body for POST /api/CacheDiagnostics/test-expiration/:seconds
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExpirationResponse {
    pub key: String,
    pub expiration_seconds: u64,
    pub set_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
