//! Shaping of raw GTFS rows and realtime entities into API models.

use chrono::{DateTime, TimeZone, Utc};

use crate::gtfs::FeedMessage;
use crate::models::{Route, ShapePoint, VehiclePositionData, VehiclePositions, DEFAULT_ROUTE_TYPE};

/// A realtime vehicle together with the route it is serving.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedVehicle {
    pub route_id: String,
    pub data: VehiclePositionData,
}

/// Vehicles in the feed that carry both a trip route and a position.
pub fn routed_vehicles(feed: &FeedMessage) -> Vec<RoutedVehicle> {
    let header_time = feed.header.timestamp;

    feed.entity
        .iter()
        .filter(|entity| !entity.is_deleted.unwrap_or(false))
        .filter_map(|entity| {
            let vehicle = entity.vehicle.as_ref()?;
            let position = vehicle.position.as_ref()?;
            let route_id = vehicle.trip.as_ref()?.route_id.clone()?;

            let vehicle_id = vehicle
                .vehicle
                .as_ref()
                .and_then(|descriptor| descriptor.id.clone())
                .unwrap_or_else(|| entity.id.clone());

            Some(RoutedVehicle {
                route_id,
                data: VehiclePositionData {
                    vehicle_id,
                    latitude: widen(position.latitude),
                    longitude: widen(position.longitude),
                    last_update: vehicle.timestamp.or(header_time).and_then(posix_time),
                    speed: position.speed.map(widen),
                    bearing: position.bearing.map(widen),
                },
            })
        })
        .collect()
}

/// Groups positions by route as `"lat,lng"` strings.
pub fn group_positions(vehicles: &[RoutedVehicle]) -> VehiclePositions {
    let mut positions = VehiclePositions::new();
    for vehicle in vehicles {
        positions
            .entry(vehicle.route_id.clone())
            .or_default()
            .push(format!("{},{}", vehicle.data.latitude, vehicle.data.longitude));
    }
    positions
}

/// f32 to f64 through its shortest decimal form, so 45.8 stays 45.8.
fn widen(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

fn posix_time(seconds: u64) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(seconds).ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// Parses `routes.txt` rows (id, short name, long name and type at columns 0/2/3/5).
pub fn parse_routes(lines: &[String]) -> Vec<Route> {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            let column = |index: usize| parts.get(index).copied().unwrap_or_default();

            Route {
                route_id: column(0).to_string(),
                route_short_name: strip_quotes(column(2)),
                route_long_name: strip_quotes(column(3)),
                route_type: column(5).trim().to_string(),
            }
        })
        .collect()
}

/// Numeric route type, falling back to bus when absent or malformed.
pub fn route_type_code(route: &Route) -> i32 {
    route
        .route_type
        .trim_matches('"')
        .parse()
        .unwrap_or(DEFAULT_ROUTE_TYPE)
}

/// Shape points of `route_id`, read from `shapes.txt` rows whose shape id
/// starts with `<route_id>_`.
pub fn parse_route_shape(lines: &[String], route_id: &str) -> Vec<ShapePoint> {
    let prefix = format!("{}_", route_id);

    lines
        .iter()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            let shape_id = strip_quotes(parts.first()?);
            if !shape_id.starts_with(&prefix) {
                return None;
            }

            Some(ShapePoint {
                direction: direction_of(&shape_id).to_string(),
                latitude: parts.get(1).map_or("0.0", |v| v.trim()).to_string(),
                longitude: parts.get(2).map_or("0.0", |v| v.trim()).to_string(),
            })
        })
        .collect()
}

/// Direction encoded by the character after the first `_` of a shape id.
fn direction_of(shape_id: &str) -> &'static str {
    let code = shape_id
        .split_once('_')
        .and_then(|(_, rest)| rest.chars().next());
    match code {
        Some('1') => "outbound",
        Some('2') => "inbound",
        _ => "",
    }
}

pub fn strip_quotes(value: &str) -> String {
    value.replace('"', "")
}
