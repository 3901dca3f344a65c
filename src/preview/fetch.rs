// fetch.rs - Thumbnail Fetch Stage
// Loads the thumbnail of every search record with a bounded number of
// requests in flight, keeping results in input order.
//
// Key Features:
// - ThumbnailFetcher trait so the HTTP client can be swapped for test doubles
// - HTTP(S) sources fetched with reqwest (Referer/User-Agent headers)
// - file:// URIs and bare paths read from disk
// - Per-item failures are logged and kept as markers, never abort the batch
//
// Used by: preview/mod.rs (PreviewService::compose_preview)

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use log::{debug, info, warn};
use reqwest::header::REFERER;

use super::error::{FetchError, PreviewError};
use super::record::{FetchedThumbnail, ThumbnailRecord};
use crate::config::PreviewConfig;

const FILE_SCHEME: &str = "file://";

#[async_trait]
pub trait ThumbnailFetcher: Send + Sync {
    /// Return the raw (still encoded) image bytes of the record's thumbnail
    async fn fetch(&self, record: &ThumbnailRecord) -> Result<Vec<u8>, FetchError>;
}

/// Where a thumbnail lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailSource {
    Remote(String),
    Local(PathBuf),
}

impl ThumbnailSource {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ThumbnailSource::Remote(location.to_string())
        } else if lower.starts_with(FILE_SCHEME) {
            ThumbnailSource::Local(PathBuf::from(&location[FILE_SCHEME.len()..]))
        } else {
            ThumbnailSource::Local(PathBuf::from(location))
        }
    }
}

/// Production fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpThumbnailFetcher {
    client: reqwest::Client,
    referer: Option<String>,
}

impl HttpThumbnailFetcher {
    pub fn new(client: reqwest::Client, referer: Option<String>) -> Self {
        Self { client, referer }
    }

    pub fn from_config(config: &PreviewConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::new(client, config.referer.clone()))
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(url);
        if let Some(referer) = &self.referer {
            request = request.header(REFERER, referer.as_str());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ThumbnailFetcher for HttpThumbnailFetcher {
    async fn fetch(&self, record: &ThumbnailRecord) -> Result<Vec<u8>, FetchError> {
        match ThumbnailSource::parse(&record.thumb_url) {
            ThumbnailSource::Remote(url) => self.fetch_remote(&url).await,
            ThumbnailSource::Local(path) => Ok(tokio::fs::read(&path).await?),
        }
    }
}

/// Fetch all thumbnails with at most `concurrency` requests in flight.
///
/// The returned vector has one slot per input record, in input order. Fails
/// with `EmptyResult` when nothing could be loaded (including empty input).
pub async fn fetch_thumbnails(
    fetcher: &dyn ThumbnailFetcher,
    records: &[ThumbnailRecord],
    concurrency: usize,
) -> Result<Vec<FetchedThumbnail>, PreviewError> {
    let concurrency = concurrency.max(1);
    debug!("Fetching {} thumbnails ({} at a time)", records.len(), concurrency);

    let fetched: Vec<FetchedThumbnail> = stream::iter(records.iter().cloned())
        .map(|record| async move {
            let content = fetcher.fetch(&record).await;
            if let Err(e) = &content {
                warn!("Thumbnail for pid {} failed ({}): {}", record.id, record.thumb_url, e);
            }
            FetchedThumbnail { record, content }
        })
        .buffered(concurrency)
        .collect()
        .await;

    let loaded = fetched.iter().filter(|f| f.is_loaded()).count();
    info!("Loaded {}/{} thumbnails", loaded, fetched.len());

    if loaded == 0 {
        return Err(PreviewError::EmptyResult);
    }
    Ok(fetched)
}
