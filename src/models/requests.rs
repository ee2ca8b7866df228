//! Request DTOs for the transit API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string for route-scoped endpoints (`?routeId=...`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteQuery {
    #[serde(rename = "routeId", default)]
    pub route_id: Option<String>,
}

impl RouteQuery {
    /// Validates the query and returns the trimmed route id.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<&str, String> {
        match self.route_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err("Route ID cannot be empty".to_string()),
        }
    }
}
