//! Transit data shapes
//!
//! JSON-friendly projections of GTFS static rows and realtime vehicle positions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Route id mapped to the `"lat,lng"` positions of its vehicles.
pub type VehiclePositions = BTreeMap<String, Vec<String>>;

/// Default GTFS route type (bus) when the routes file does not say otherwise.
pub const DEFAULT_ROUTE_TYPE: i32 = 3;

/// One row of `routes.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub route_id: String,
    pub route_short_name: String,
    pub route_long_name: String,
    pub route_type: String,
}

/// One point of a route's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapePoint {
    /// `outbound`, `inbound` or empty when the shape id does not say
    pub direction: String,
    pub latitude: String,
    pub longitude: String,
}

/// Realtime position of a single vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePositionData {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_update: Option<DateTime<Utc>>,
    pub speed: Option<f64>,
    pub bearing: Option<f64>,
}

/// Vehicles of one route, decorated with the route's static attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedVehiclePosition {
    pub route_id: String,
    pub route_short_name: String,
    pub route_long_name: String,
    pub route_type: i32,
    pub vehicles: Vec<VehiclePositionData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_serializes_camel_case() {
        let route = Route {
            route_id: "6".to_string(),
            route_short_name: "6".to_string(),
            route_long_name: "Crnomerec - Sopot".to_string(),
            route_type: "0".to_string(),
        };
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["routeId"], "6");
        assert_eq!(json["routeLongName"], "Crnomerec - Sopot");
    }

    #[test]
    fn test_enhanced_position_serialize() {
        let position = EnhancedVehiclePosition {
            route_id: "109".to_string(),
            route_short_name: "109".to_string(),
            route_long_name: String::new(),
            route_type: DEFAULT_ROUTE_TYPE,
            vehicles: vec![VehiclePositionData {
                vehicle_id: "v1".to_string(),
                latitude: 45.8,
                longitude: 16.0,
                last_update: None,
                speed: Some(8.5),
                bearing: None,
            }],
        };
        let json = serde_json::to_value(&position).unwrap();
        assert_eq!(json["routeType"], 3);
        assert_eq!(json["vehicles"][0]["vehicleId"], "v1");
        assert_eq!(json["vehicles"][0]["speed"], 8.5);
    }
}
