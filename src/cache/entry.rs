//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Utc};

use crate::cache::value::{size_units, CachedValue};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    /// The stored value
    pub value: CachedValue,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// Absolute expiry; entries past this instant are never served
    pub expires_at: DateTime<Utc>,
    /// Size estimate of the payload in bytes
    pub estimated_size_bytes: u64,
    pub value_type: &'static str,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` after `now`.
    pub fn new(
        key: impl Into<String>,
        value: CachedValue,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        let estimated_size_bytes = value.estimated_size();
        let value_type = value.type_tag();
        Self {
            key: key.into(),
            value,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            estimated_size_bytes,
            value_type,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Capacity units charged for this entry.
    pub fn size_units(&self) -> u64 {
        size_units(self.estimated_size_bytes)
    }

    // == Time To Live ==
    /// Returns the remaining TTL at `now`, zero once expired.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            chrono::Duration::zero()
        }
    }
}
