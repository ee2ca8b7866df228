//! Cache Key Policy
//!
//! Deterministic key derivation for every cached query. Realtime keys carry no
//! date and rely on TTL alone; static and shape keys end in the current UTC
//! date, so they roll over at midnight UTC whatever their TTL says.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::cache::Clock;
use crate::gtfs::StaticFileKind;

// == Namespace ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Realtime,
    Static,
    Shape,
}

impl CacheNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Realtime => "realtime",
            CacheNamespace::Static => "static",
            CacheNamespace::Shape => "shape",
        }
    }
}

// == Cache Key ==
/// Structured cache key; `Display` collapses it to the stored string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: CacheNamespace,
    resource: &'static str,
    id: Option<String>,
    date: Option<NaiveDate>,
}

impl CacheKey {
    /// Undated key: `realtime:<resource>[:<id>]`.
    pub fn realtime(resource: &'static str, id: Option<&str>) -> Self {
        Self {
            namespace: CacheNamespace::Realtime,
            resource,
            id: id.map(str::to_string),
            date: None,
        }
    }

    /// Dated key: `<namespace>:<resource>[:<id>]:<YYYY-MM-DD>`.
    pub fn daily(
        namespace: CacheNamespace,
        resource: &'static str,
        id: Option<&str>,
        date: NaiveDate,
    ) -> Self {
        Self {
            namespace,
            resource,
            id: id.map(str::to_string),
            date: Some(date),
        }
    }

    pub fn namespace(&self) -> CacheNamespace {
        self.namespace
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_str(), self.resource)?;
        if let Some(id) = &self.id {
            write!(f, ":{}", escape_segment(id))?;
        }
        if let Some(date) = &self.date {
            write!(f, ":{}", date.format("%Y-%m-%d"))?;
        }
        Ok(())
    }
}

/// Escapes `%` and `:` so identifiers cannot forge extra key segments.
fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['%', ':']) {
        Cow::Owned(segment.replace('%', "%25").replace(':', "%3A"))
    } else {
        Cow::Borrowed(segment)
    }
}

// == Key Policy ==
/// Builds the key for each logical query, stamping dated keys with today's UTC date.
#[derive(Debug, Clone)]
pub struct KeyPolicy {
    clock: Arc<dyn Clock>,
}

impl KeyPolicy {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub fn realtime_feed(&self) -> String {
        CacheKey::realtime("feed", None).to_string()
    }

    pub fn all_vehicles(&self) -> String {
        CacheKey::realtime("all-vehicles", None).to_string()
    }

    pub fn vehicles_by_route(&self, route_id: &str) -> String {
        CacheKey::realtime("route", Some(route_id)).to_string()
    }

    pub fn vehicle(&self, vehicle_id: &str) -> String {
        CacheKey::realtime("vehicle", Some(vehicle_id)).to_string()
    }

    pub fn enhanced_positions(&self) -> String {
        CacheKey::realtime("enhanced", None).to_string()
    }

    pub fn enhanced_by_route(&self, route_id: &str) -> String {
        CacheKey::realtime("enhanced", Some(route_id)).to_string()
    }

    pub fn all_routes(&self) -> String {
        CacheKey::daily(CacheNamespace::Static, "routes", None, self.today()).to_string()
    }

    pub fn route_info(&self, route_id: &str) -> String {
        CacheKey::daily(CacheNamespace::Static, "route-info", Some(route_id), self.today())
            .to_string()
    }

    pub fn route_shape(&self, route_id: &str) -> String {
        CacheKey::daily(CacheNamespace::Shape, "route", Some(route_id), self.today()).to_string()
    }

    pub fn static_file(&self, kind: StaticFileKind) -> String {
        CacheKey::daily(CacheNamespace::Static, "file", Some(kind.slug()), self.today())
            .to_string()
    }

    /// Raw archive lines cached by the fetch layer.
    pub fn raw_static_file(&self, kind: StaticFileKind) -> String {
        CacheKey::daily(CacheNamespace::Static, "raw", Some(kind.slug()), self.today())
            .to_string()
    }
}
