// preview/mod.rs - Search Preview Module
// Builds the grid preview image for a list of illustration search results.
//
// Pipeline:
// 1. fetch.rs      - load every thumbnail, bounded concurrency, input order kept
// 2. (here)        - drop failed items, bail out early if nothing loaded
// 3. compositor.rs - draw title, thumbnails and captions on a blocking worker
//
// Used by: commands/preview.rs (^preview), main.rs (service construction)

pub mod compositor;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod record;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};

use crate::config::PreviewConfig;
use compositor::GridCompositor;
use error::{CompositionError, PreviewError};
use fetch::{fetch_thumbnails, HttpThumbnailFetcher, ThumbnailFetcher};
use record::{LoadedThumbnail, ThumbnailRecord};

pub struct PreviewService {
    fetcher: Arc<dyn ThumbnailFetcher>,
    compositor: Arc<GridCompositor>,
    concurrency: usize,
    default_columns: u32,
}

impl PreviewService {
    pub fn new(
        fetcher: Arc<dyn ThumbnailFetcher>,
        compositor: Arc<GridCompositor>,
        concurrency: usize,
        default_columns: u32,
    ) -> Self {
        Self {
            fetcher,
            compositor,
            concurrency,
            default_columns,
        }
    }

    /// Wire up the HTTP fetcher and compositor. Fails if the font can't be loaded.
    pub fn from_config(config: &PreviewConfig) -> Result<Self, PreviewError> {
        let compositor = GridCompositor::from_config(config)?;
        let fetcher = HttpThumbnailFetcher::from_config(config).map_err(PreviewError::HttpClient)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(compositor),
            config.fetch_concurrency,
            config.columns,
        ))
    }

    pub fn default_columns(&self) -> u32 {
        self.default_columns
    }

    /// Fetch all thumbnails and compose them into one preview image.
    ///
    /// `columns` falls back to the configured default. Returns the path of
    /// the written JPEG, `EmptyResult` when no thumbnail loaded, `TooLarge`
    /// when the full grid could not be encoded, or the compositor's failure.
    pub async fn compose_preview(
        &self,
        records: &[ThumbnailRecord],
        title: &str,
        columns: Option<u32>,
    ) -> Result<PathBuf, PreviewError> {
        let columns = columns.unwrap_or(self.default_columns);
        if columns == 0 {
            return Err(PreviewError::InvalidColumns);
        }
        // sized for every record loading, the largest grid this call can draw
        if self.compositor.layout().with_columns(columns).encodable_canvas_size(records.len()).is_none() {
            return Err(PreviewError::TooLarge {
                count: records.len(),
                columns,
            });
        }

        let fetched = fetch_thumbnails(self.fetcher.as_ref(), records, self.concurrency).await?;

        let loaded: Vec<LoadedThumbnail> = fetched
            .into_iter()
            .filter_map(|f| match f.content {
                Ok(bytes) => Some(LoadedThumbnail {
                    record: f.record,
                    bytes,
                }),
                Err(_) => None,
            })
            .collect();
        if loaded.is_empty() {
            return Err(PreviewError::EmptyResult);
        }
        debug!("Composing preview '{}' from {} thumbnails", title, loaded.len());

        let compositor = Arc::clone(&self.compositor);
        let title = title.to_string();
        let path = tokio::task::spawn_blocking(move || compositor.compose(&title, &loaded, columns))
            .await
            .map_err(|e| CompositionError::Worker(e.to_string()))??;

        info!("Preview ready: {}", path.display());
        Ok(path)
    }
}
