//! Entry Metadata Index
//!
//! Explicit record of what was written to the cache and when, kept beside the
//! store so diagnostics never need to look inside it.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::cache::CacheEntry;

/// Diagnostics view of one cached entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub key: String,
    pub set_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub estimated_size: u64,
    pub data_type: String,
}

impl EntryInfo {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl From<&CacheEntry> for EntryInfo {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.clone(),
            set_at: entry.created_at,
            expires_at: entry.expires_at,
            estimated_size: entry.estimated_size_bytes,
            data_type: entry.value_type.to_string(),
        }
    }
}

/// Concurrent key → [`EntryInfo`] index.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    entries: DashMap<String, EntryInfo>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, info: EntryInfo) {
        self.entries.insert(info.key.clone(), info);
    }

    pub fn forget(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drops every record whose expiry has passed. Returns how many went.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, info| !info.is_expired_at(now));
        before.saturating_sub(self.entries.len())
    }

    /// Records that are still live at `now`.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<EntryInfo> {
        self.entries
            .iter()
            .filter(|item| !item.value().is_expired_at(now))
            .map(|item| item.value().clone())
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<EntryInfo> {
        self.entries.get(key).map(|item| item.value().clone())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
