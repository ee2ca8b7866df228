//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Compaction: Sweeps expired entries and enforces the cache size limit

mod compaction;

pub use compaction::spawn_compaction_task;
