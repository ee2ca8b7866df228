//! Upstream Fetcher Module
//!
//! HTTP retrieval of the realtime protobuf feed and of files inside the
//! static schedule archive.

use std::io::{BufRead, BufReader, Cursor};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::config::GtfsSettings;
use crate::error::{Result, TransitError};
use crate::gtfs::StaticFileKind;

/// Source of raw GTFS data.
#[async_trait]
pub trait GtfsFetcher: Send + Sync {
    /// Raw realtime feed payload.
    async fn fetch_realtime(&self) -> Result<Vec<u8>>;

    /// Rows of one static file, header line dropped. A file missing from the
    /// archive yields an empty list.
    async fn fetch_static_file(&self, kind: StaticFileKind) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: GtfsFetcher + ?Sized> GtfsFetcher for Arc<T> {
    async fn fetch_realtime(&self) -> Result<Vec<u8>> {
        (**self).fetch_realtime().await
    }

    async fn fetch_static_file(&self, kind: StaticFileKind) -> Result<Vec<String>> {
        (**self).fetch_static_file(kind).await
    }
}

// == HTTP Fetcher ==
pub struct HttpGtfsFetcher {
    http: Client,
    realtime_url: String,
    static_url: String,
}

impl HttpGtfsFetcher {
    pub fn new(settings: &GtfsSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("transit-cache/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .use_rustls_tls()
            .build()
            .map_err(|e| TransitError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            realtime_url: settings.realtime_url(),
            static_url: settings.static_url(),
        })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TransitError::UpstreamFetch(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransitError::UpstreamFetch(format!(
                "{} returned status {}",
                url,
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransitError::UpstreamFetch(format!("failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl GtfsFetcher for HttpGtfsFetcher {
    async fn fetch_realtime(&self) -> Result<Vec<u8>> {
        debug!("Fetching realtime GTFS data");
        let bytes = self.get_bytes(&self.realtime_url).await.inspect_err(|e| {
            error!("Error fetching realtime GTFS data: {}", e);
        })?;
        debug!("Fetched realtime GTFS data ({} bytes)", bytes.len());
        Ok(bytes)
    }

    async fn fetch_static_file(&self, kind: StaticFileKind) -> Result<Vec<String>> {
        debug!("Fetching static GTFS archive for {}", kind.file_name());
        let archive = self.get_bytes(&self.static_url).await.inspect_err(|e| {
            error!("Error fetching static GTFS data: {}", e);
        })?;

        // zip decoding is blocking work
        tokio::task::spawn_blocking(move || read_archive_lines(&archive, kind))
            .await
            .map_err(|e| TransitError::Internal(format!("archive task failed: {}", e)))?
    }
}

/// Reads the lines of `kind` out of a zip archive, skipping the header row.
pub fn read_archive_lines(archive: &[u8], kind: StaticFileKind) -> Result<Vec<String>> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| TransitError::UpstreamFetch(format!("Malformed static archive: {}", e)))?;

    let file_name = kind.file_name();
    let file = match zip.by_name(&file_name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            error!("File {} not found in GTFS static data", file_name);
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(TransitError::UpstreamFetch(format!(
                "Failed to open {}: {}",
                file_name, e
            )))
        }
    };

    BufReader::new(file)
        .lines()
        .skip(1)
        .map(|line| {
            line.map(|l| l.trim_end_matches('\r').to_string())
                .map_err(|e| TransitError::UpstreamFetch(format!("Failed to read {}: {}", file_name, e)))
        })
        .collect()
}
