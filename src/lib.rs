//! Transit Cache - GTFS transit data API with a TTL cache
//!
//! Serves realtime vehicle positions and static schedule data from a GTFS
//! provider, caching realtime answers briefly and static answers under keys
//! that rotate at UTC midnight.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gtfs;
pub mod models;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheService;
pub use config::Config;
pub use error::{Result, TransitError};
pub use tasks::spawn_compaction_task;
