//! GTFS Module
//!
//! Upstream access to the realtime feed and the static schedule archive,
//! plus the parsing that turns them into API models.

mod cached;
mod feed;
mod fetcher;
pub mod parse;
mod static_file;

pub use cached::CachedGtfsFetcher;
pub use feed::{
    FeedEntity, FeedHeader, FeedMessage, Position, TripDescriptor, VehicleDescriptor,
    VehiclePosition,
};
pub use fetcher::{read_archive_lines, GtfsFetcher, HttpGtfsFetcher};
pub use static_file::StaticFileKind;
