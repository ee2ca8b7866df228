//! Shared test fixtures: an in-memory upstream that counts its fetches.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use prost::Message;
use transit_cache::cache::ManualClock;
use transit_cache::config::CacheSettings;
use transit_cache::gtfs::{
    FeedEntity, FeedHeader, FeedMessage, GtfsFetcher, Position, StaticFileKind, TripDescriptor,
    VehicleDescriptor, VehiclePosition,
};
use transit_cache::{AppState, Result, TransitError};

/// Upstream double serving a fixed realtime feed and static files.
pub struct FakeFetcher {
    pub realtime_calls: AtomicUsize,
    pub static_calls: AtomicUsize,
    failing: AtomicBool,
    feed: Vec<u8>,
    files: HashMap<StaticFileKind, Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        let files = HashMap::from([
            (
                StaticFileKind::Routes,
                vec![
                    "1,1,\"1\",\"Zapadni kolodvor - Borongaj\",,0".to_string(),
                    "6,1,\"6\",\"Crnomerec - Sopot\",,0".to_string(),
                    "109,2,\"109\",\"Dubrava - Kvaternikov trg\",,3".to_string(),
                ],
            ),
            (
                StaticFileKind::Shapes,
                vec![
                    "\"6_1\",45.815,15.935,1".to_string(),
                    "\"6_2\",45.790,15.990,2".to_string(),
                    "\"16_1\",45.700,15.900,1".to_string(),
                ],
            ),
            (
                StaticFileKind::Stops,
                vec!["100,\"Trg bana Jelacica\",45.813,15.977".to_string()],
            ),
        ]);

        Self {
            realtime_calls: AtomicUsize::new(0),
            static_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            feed: feed(&[("42", "6", 45.8, 16.0), ("43", "6", 45.75, 15.5), ("77", "109", 45.5, 16.25)]),
            files,
        }
    }

    /// Makes every subsequent fetch fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn realtime_calls(&self) -> usize {
        self.realtime_calls.load(Ordering::SeqCst)
    }

    pub fn static_calls(&self) -> usize {
        self.static_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransitError::UpstreamFetch("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GtfsFetcher for FakeFetcher {
    async fn fetch_realtime(&self) -> Result<Vec<u8>> {
        self.realtime_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.feed.clone())
    }

    async fn fetch_static_file(&self, kind: StaticFileKind) -> Result<Vec<String>> {
        self.static_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.files.get(&kind).cloned().unwrap_or_default())
    }
}

/// Encodes a feed of `(vehicle id, route id, lat, lng)` vehicles.
pub fn feed(vehicles: &[(&str, &str, f32, f32)]) -> Vec<u8> {
    let entity = vehicles
        .iter()
        .map(|(id, route, latitude, longitude)| FeedEntity {
            id: format!("entity-{}", id),
            is_deleted: None,
            vehicle: Some(VehiclePosition {
                trip: Some(TripDescriptor {
                    trip_id: None,
                    route_id: Some(route.to_string()),
                }),
                position: Some(Position {
                    latitude: *latitude,
                    longitude: *longitude,
                    bearing: None,
                    speed: Some(8.5),
                }),
                timestamp: Some(1_704_110_400),
                vehicle: Some(VehicleDescriptor {
                    id: Some(id.to_string()),
                    label: None,
                }),
            }),
        })
        .collect();

    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1_704_110_400),
        },
        entity,
    }
    .encode_to_vec()
}

/// Clock pinned to 2024-01-01 12:00:00 UTC.
pub fn noon_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
}

/// App state over a fresh fake upstream and a manual clock.
pub fn test_state(settings: CacheSettings) -> (AppState, Arc<FakeFetcher>, ManualClock) {
    let fetcher = Arc::new(FakeFetcher::new());
    let clock = noon_clock();
    let state = AppState::new(fetcher.clone(), settings, Arc::new(clock.clone()));
    (state, fetcher, clock)
}
