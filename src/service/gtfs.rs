//! Uncached transit queries computed straight from the fetcher.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, TransitError};
use crate::gtfs::parse::{self, RoutedVehicle};
use crate::gtfs::{FeedMessage, GtfsFetcher, StaticFileKind};
use crate::models::{
    EnhancedVehiclePosition, Route, ShapePoint, VehiclePositionData, VehiclePositions,
    DEFAULT_ROUTE_TYPE,
};
use crate::service::TransitData;

pub struct GtfsService {
    fetcher: Arc<dyn GtfsFetcher>,
}

impl GtfsService {
    pub fn new(fetcher: Arc<dyn GtfsFetcher>) -> Self {
        Self { fetcher }
    }

    /// Positioned vehicles of the current feed; empty feed is an error.
    async fn vehicles(&self) -> Result<Vec<RoutedVehicle>> {
        let bytes = self.fetcher.fetch_realtime().await?;
        let feed = FeedMessage::from_bytes(&bytes)?;
        let vehicles = parse::routed_vehicles(&feed);

        if vehicles.is_empty() {
            return Err(TransitError::NoDataAvailable(
                "No vehicle positions available in the realtime data".to_string(),
            ));
        }
        debug!("Realtime feed holds {} positioned vehicles", vehicles.len());
        Ok(vehicles)
    }

    async fn lines(&self, kind: StaticFileKind) -> Result<Vec<String>> {
        let lines = self.fetcher.fetch_static_file(kind).await?;
        if lines.is_empty() {
            return Err(TransitError::NoDataAvailable(format!(
                "No data available in the file {}",
                kind.file_name()
            )));
        }
        Ok(lines)
    }
}

/// Decorates one route's vehicles with its static attributes. Unknown routes
/// fall back to the route id as short name and the bus route type.
fn enhance(
    route_id: &str,
    route: Option<&Route>,
    vehicles: Vec<VehiclePositionData>,
) -> EnhancedVehiclePosition {
    match route {
        Some(route) => EnhancedVehiclePosition {
            route_id: route_id.to_string(),
            route_short_name: route.route_short_name.clone(),
            route_long_name: route.route_long_name.clone(),
            route_type: parse::route_type_code(route),
            vehicles,
        },
        None => EnhancedVehiclePosition {
            route_id: route_id.to_string(),
            route_short_name: route_id.to_string(),
            route_long_name: String::new(),
            route_type: DEFAULT_ROUTE_TYPE,
            vehicles,
        },
    }
}

fn group_vehicles(vehicles: Vec<RoutedVehicle>) -> BTreeMap<String, Vec<VehiclePositionData>> {
    let mut grouped: BTreeMap<String, Vec<VehiclePositionData>> = BTreeMap::new();
    for vehicle in vehicles {
        grouped.entry(vehicle.route_id).or_default().push(vehicle.data);
    }
    grouped
}

#[async_trait]
impl TransitData for GtfsService {
    async fn all_vehicle_positions(&self) -> Result<VehiclePositions> {
        let vehicles = self.vehicles().await?;
        Ok(parse::group_positions(&vehicles))
    }

    async fn vehicle_positions_by_route(&self, route_id: &str) -> Result<VehiclePositions> {
        let mut positions = self.all_vehicle_positions().await?;
        let route_positions = positions.remove(route_id).unwrap_or_default();
        Ok(VehiclePositions::from([(route_id.to_string(), route_positions)]))
    }

    async fn vehicle_by_id(&self, vehicle_id: &str) -> Result<VehiclePositionData> {
        self.vehicles()
            .await?
            .into_iter()
            .find(|vehicle| vehicle.data.vehicle_id == vehicle_id)
            .map(|vehicle| vehicle.data)
            .ok_or_else(|| TransitError::NotFound(format!("Vehicle {} not found", vehicle_id)))
    }

    async fn enhanced_positions(&self) -> Result<Vec<EnhancedVehiclePosition>> {
        let vehicles = self.vehicles().await?;
        let routes = self.all_routes().await?;
        let by_id: HashMap<&str, &Route> = routes
            .iter()
            .map(|route| (route.route_id.as_str(), route))
            .collect();

        Ok(group_vehicles(vehicles)
            .into_iter()
            .map(|(route_id, vehicles)| {
                let route = by_id.get(route_id.as_str()).copied();
                enhance(&route_id, route, vehicles)
            })
            .collect())
    }

    async fn enhanced_positions_by_route(
        &self,
        route_id: &str,
    ) -> Result<Option<EnhancedVehiclePosition>> {
        let vehicles: Vec<VehiclePositionData> = self
            .vehicles()
            .await?
            .into_iter()
            .filter(|vehicle| vehicle.route_id == route_id)
            .map(|vehicle| vehicle.data)
            .collect();

        if vehicles.is_empty() {
            return Ok(None);
        }

        let route = self.route_info(route_id).await?;
        Ok(Some(enhance(route_id, route.as_ref(), vehicles)))
    }

    async fn all_routes(&self) -> Result<Vec<Route>> {
        let lines = self.fetcher.fetch_static_file(StaticFileKind::Routes).await?;
        let routes = parse::parse_routes(&lines);
        if routes.is_empty() {
            return Err(TransitError::NoDataAvailable("No route data available".to_string()));
        }
        Ok(routes)
    }

    async fn route_info(&self, route_id: &str) -> Result<Option<Route>> {
        let routes = self.all_routes().await?;
        Ok(routes.into_iter().find(|route| route.route_id == route_id))
    }

    async fn route_shape(&self, route_id: &str) -> Result<Vec<ShapePoint>> {
        let lines = self
            .fetcher
            .fetch_static_file(StaticFileKind::Shapes)
            .await?;
        if lines.is_empty() {
            return Err(TransitError::NoDataAvailable(format!(
                "No shape data available for route {}",
                route_id
            )));
        }
        Ok(parse::parse_route_shape(&lines, route_id))
    }

    async fn static_file(&self, kind: StaticFileKind) -> Result<Vec<String>> {
        self.lines(kind).await
    }
}
