//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.
//! Out-of-range or unparseable values are rejected at startup.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{Result, TransitError};

/// Cache tuning parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    /// TTL for realtime entries, 1-3600 seconds
    pub realtime_ttl_seconds: u64,
    /// TTL for static and shape entries, 1-168 hours
    pub static_ttl_hours: u64,
    /// Store capacity in size units, 10-1000
    pub cache_size_limit: u64,
    /// Fraction of capacity reclaimed by a compaction, 0.1-0.5
    pub compaction_threshold: f64,
    /// Whether the upstream health probe is active
    pub enable_health_check: bool,
    /// Verbose per-operation cache logging
    pub log_cache_operations: bool,
}

impl CacheSettings {
    pub fn realtime_ttl(&self) -> Duration {
        Duration::from_secs(self.realtime_ttl_seconds)
    }

    pub fn static_ttl(&self) -> Duration {
        Duration::from_secs(self.static_ttl_hours * 3600)
    }

    /// Checks every value against its documented range.
    pub fn validate(&self) -> Result<()> {
        check_range("realtimeTtlSeconds", self.realtime_ttl_seconds, 1, 3600)?;
        check_range("staticTtlHours", self.static_ttl_hours, 1, 168)?;
        check_range("cacheSizeLimit", self.cache_size_limit, 10, 1000)?;

        if !(0.1..=0.5).contains(&self.compaction_threshold) {
            return Err(TransitError::InvalidArgument(format!(
                "compactionThreshold must be between 0.1 and 0.5, got {}",
                self.compaction_threshold
            )));
        }

        Ok(())
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            realtime_ttl_seconds: 30,
            static_ttl_hours: 24,
            cache_size_limit: 100,
            compaction_threshold: 0.25,
            enable_health_check: true,
            log_cache_operations: false,
        }
    }
}

/// Upstream GTFS provider location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GtfsSettings {
    pub base_url: String,
    pub realtime_endpoint: String,
    pub static_endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl GtfsSettings {
    pub fn realtime_url(&self) -> String {
        join_url(&self.base_url, &self.realtime_endpoint)
    }

    pub fn static_url(&self) -> String {
        join_url(&self.base_url, &self.static_endpoint)
    }
}

impl Default for GtfsSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            realtime_endpoint: String::new(),
            static_endpoint: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Server configuration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cache: CacheSettings,
    pub gtfs: GtfsSettings,
    /// HTTP server port
    pub server_port: u16,
    /// Run the periodic compaction task
    pub background_compaction: bool,
    /// Interval between background compactions in seconds
    pub compaction_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REALTIME_TTL_SECONDS` (default: 30)
    /// - `STATIC_TTL_HOURS` (default: 24)
    /// - `CACHE_SIZE_LIMIT` (default: 100)
    /// - `COMPACTION_THRESHOLD` (default: 0.25)
    /// - `ENABLE_HEALTH_CHECK` (default: true)
    /// - `LOG_CACHE_OPERATIONS` (default: false)
    /// - `GTFS_BASE_URL`, `GTFS_REALTIME_ENDPOINT`, `GTFS_STATIC_ENDPOINT`
    /// - `UPSTREAM_TIMEOUT_SECS` (default: 30)
    /// - `SERVER_PORT` (default: 3000)
    /// - `BACKGROUND_COMPACTION` (default: false)
    /// - `COMPACTION_INTERVAL_SECS` (default: 3600)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds and validates a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Self {
            cache: CacheSettings {
                realtime_ttl_seconds: parse_var(
                    &lookup,
                    "REALTIME_TTL_SECONDS",
                    defaults.cache.realtime_ttl_seconds,
                )?,
                static_ttl_hours: parse_var(
                    &lookup,
                    "STATIC_TTL_HOURS",
                    defaults.cache.static_ttl_hours,
                )?,
                cache_size_limit: parse_var(
                    &lookup,
                    "CACHE_SIZE_LIMIT",
                    defaults.cache.cache_size_limit,
                )?,
                compaction_threshold: parse_var(
                    &lookup,
                    "COMPACTION_THRESHOLD",
                    defaults.cache.compaction_threshold,
                )?,
                enable_health_check: parse_var(
                    &lookup,
                    "ENABLE_HEALTH_CHECK",
                    defaults.cache.enable_health_check,
                )?,
                log_cache_operations: parse_var(
                    &lookup,
                    "LOG_CACHE_OPERATIONS",
                    defaults.cache.log_cache_operations,
                )?,
            },
            gtfs: GtfsSettings {
                base_url: lookup("GTFS_BASE_URL").unwrap_or(defaults.gtfs.base_url),
                realtime_endpoint: lookup("GTFS_REALTIME_ENDPOINT")
                    .unwrap_or(defaults.gtfs.realtime_endpoint),
                static_endpoint: lookup("GTFS_STATIC_ENDPOINT")
                    .unwrap_or(defaults.gtfs.static_endpoint),
                timeout_secs: parse_var(
                    &lookup,
                    "UPSTREAM_TIMEOUT_SECS",
                    defaults.gtfs.timeout_secs,
                )?,
            },
            server_port: parse_var(&lookup, "SERVER_PORT", defaults.server_port)?,
            background_compaction: parse_var(
                &lookup,
                "BACKGROUND_COMPACTION",
                defaults.background_compaction,
            )?,
            compaction_interval: parse_var(
                &lookup,
                "COMPACTION_INTERVAL_SECS",
                defaults.compaction_interval,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if self.compaction_interval == 0 {
            return Err(TransitError::InvalidArgument(
                "COMPACTION_INTERVAL_SECS must be positive".to_string(),
            ));
        }
        if self.gtfs.timeout_secs == 0 {
            return Err(TransitError::InvalidArgument(
                "UPSTREAM_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            gtfs: GtfsSettings::default(),
            server_port: 3000,
            background_compaction: false,
            compaction_interval: 3600,
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            TransitError::InvalidArgument(format!("{} has an unparseable value '{}'", name, raw))
        }),
        None => Ok(default),
    }
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(TransitError::InvalidArgument(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

fn join_url(base: &str, endpoint: &str) -> String {
    if base.is_empty() {
        return endpoint.to_string();
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
