// error.rs - Preview Error Types
// Typed failures for the fetch stage, the compositor and the orchestrator.
//
// Per-item fetch failures (FetchError) never reach the caller on their own;
// they are logged and the item is dropped from the grid. Everything else
// surfaces as a PreviewError.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a single thumbnail
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to read local thumbnail: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while drawing or saving the composite canvas
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("thumbnail for pid {pid} could not be decoded: {source}")]
    Decode {
        pid: u64,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode preview image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to write preview image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("composition worker stopped unexpectedly: {0}")]
    Worker(String),
    #[error("{cells} thumbnails in {columns} columns do not fit in one image")]
    CanvasTooLarge { cells: usize, columns: u32 },
}

#[derive(Debug, Error)]
pub enum PreviewError {
    /// Every thumbnail failed, or there was nothing to fetch
    #[error("no thumbnails could be loaded")]
    EmptyResult,
    #[error("column count must be at least 1")]
    InvalidColumns,
    /// Grid would exceed the JPEG side limit; checked before any fetch
    #[error("{count} results in {columns} columns make a preview taller or wider than 65535px")]
    TooLarge { count: usize, columns: u32 },
    #[error(transparent)]
    Composition(#[from] CompositionError),
    /// Fixed resource (font) could not be loaded; fatal at startup
    #[error("failed to load asset {path}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
