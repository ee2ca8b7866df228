//! Cached Value Module
//!
//! Tagged payload stored in the cache, plus the conversions that let callers
//! work with concrete types instead of the raw enum.

use serde::Serialize;

use crate::models::{EnhancedVehiclePosition, Route, ShapePoint, VehiclePositionData, VehiclePositions};

/// Estimated size of a payload with no better estimate, in bytes
pub const DEFAULT_SIZE_BYTES: u64 = 1000;
/// Estimated cost of one element in a collection, in bytes
pub const COLLECTION_ELEMENT_BYTES: u64 = 100;
/// Floor for string payloads, in bytes
pub const MIN_STRING_BYTES: u64 = 100;
/// Bytes per capacity unit
pub const BYTES_PER_UNIT: u64 = 1000;

// == Cached Value ==
/// Every shape of value the cache can hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CachedValue {
    Text(String),
    Bytes(Vec<u8>),
    Lines(Vec<String>),
    Routes(Vec<Route>),
    Route(Route),
    RouteShape(Vec<ShapePoint>),
    VehiclePositions(VehiclePositions),
    EnhancedPositions(Vec<EnhancedVehiclePosition>),
    EnhancedPosition(EnhancedVehiclePosition),
    Vehicle(VehiclePositionData),
    Json(serde_json::Value),
    /// Result of a lookup that may legitimately find nothing
    Optional(Option<Box<CachedValue>>),
}

impl CachedValue {
    /// Name of the payload kind, reported in diagnostics.
    pub fn type_tag(&self) -> &'static str {
        match self {
            CachedValue::Text(_) => "text",
            CachedValue::Bytes(_) => "bytes",
            CachedValue::Lines(_) => "lines",
            CachedValue::Routes(_) => "routes",
            CachedValue::Route(_) => "route",
            CachedValue::RouteShape(_) => "route_shape",
            CachedValue::VehiclePositions(_) => "vehicle_positions",
            CachedValue::EnhancedPositions(_) => "enhanced_positions",
            CachedValue::EnhancedPosition(_) => "enhanced_position",
            CachedValue::Vehicle(_) => "vehicle",
            CachedValue::Json(_) => "json",
            CachedValue::Optional(_) => "optional",
        }
    }

    /// Rough memory footprint in bytes.
    pub fn estimated_size(&self) -> u64 {
        match self {
            CachedValue::Text(text) => string_size(text.len()),
            CachedValue::Bytes(bytes) => bytes.len() as u64,
            CachedValue::Lines(lines) => collection_size(lines.len()),
            CachedValue::Routes(routes) => collection_size(routes.len()),
            CachedValue::RouteShape(points) => collection_size(points.len()),
            CachedValue::VehiclePositions(positions) => collection_size(positions.len()),
            CachedValue::EnhancedPositions(positions) => collection_size(positions.len()),
            CachedValue::Json(serde_json::Value::Array(items)) => collection_size(items.len()),
            CachedValue::Json(serde_json::Value::String(text)) => string_size(text.len()),
            CachedValue::Optional(Some(inner)) => inner.estimated_size(),
            CachedValue::EnhancedPosition(position) => collection_size(position.vehicles.len()),
            CachedValue::Route(_)
            | CachedValue::Vehicle(_)
            | CachedValue::Json(_)
            | CachedValue::Optional(None) => DEFAULT_SIZE_BYTES,
        }
    }
}

fn collection_size(len: usize) -> u64 {
    (len as u64 * COLLECTION_ELEMENT_BYTES).max(DEFAULT_SIZE_BYTES)
}

fn string_size(len: usize) -> u64 {
    (len as u64 * 2).max(MIN_STRING_BYTES)
}

/// Converts an estimated byte size into capacity units (at least one).
pub fn size_units(estimated_bytes: u64) -> u64 {
    (estimated_bytes / BYTES_PER_UNIT).max(1)
}

// == Cacheable ==
/// Types that can be stored in and read back from the cache.
///
/// `from_cached` returns `None` when the stored payload has another tag.
pub trait Cacheable: Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl Cacheable for CachedValue {
    fn into_cached(self) -> CachedValue {
        self
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        Some(value)
    }
}

macro_rules! impl_cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_cacheable!(String, Text);
impl_cacheable!(Vec<u8>, Bytes);
impl_cacheable!(Vec<String>, Lines);
impl_cacheable!(Vec<Route>, Routes);
impl_cacheable!(Route, Route);
impl_cacheable!(Vec<ShapePoint>, RouteShape);
impl_cacheable!(VehiclePositions, VehiclePositions);
impl_cacheable!(Vec<EnhancedVehiclePosition>, EnhancedPositions);
impl_cacheable!(EnhancedVehiclePosition, EnhancedPosition);
impl_cacheable!(VehiclePositionData, Vehicle);
impl_cacheable!(serde_json::Value, Json);

impl<T: Cacheable> Cacheable for Option<T> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Optional(self.map(|inner| Box::new(inner.into_cached())))
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Optional(None) => Some(None),
            CachedValue::Optional(Some(inner)) => T::from_cached(*inner).map(Some),
            _ => None,
        }
    }
}
