//! Tileset service abstraction and error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tileset::Tileset;

/// Errors raised by a tileset service.
///
/// Messages never carry credentials; URLs are redacted before they reach
/// an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport-level failure (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The fetched document is not a valid tileset.
    #[error("failed to decode tileset {uri}: {reason}")]
    Decode { uri: String, reason: String },

    /// A local cache file could not be read or written.
    #[error("cache I/O error at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// Required credentials are not configured.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// Cache-only mode was requested and the content is not cached.
    #[error("{0} is not cached and network access is disabled")]
    NotCached(String),

    /// A URI could not be parsed or resolved.
    #[error("invalid URI: {0}")]
    InvalidUri(String),
}

/// A tile content file available on local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// Path of the cached file.
    pub path: PathBuf,
    /// File size in bytes.
    pub bytes: u64,
    /// Whether the file was already cached before the request.
    pub from_cache: bool,
}

/// Remote tileset service consumed by the planner and the downloader.
///
/// Implementations perform the byte transfer and the document decoding.
/// The core never retries; any retry policy lives behind this trait.
pub trait TilesetService: Send + Sync {
    /// Verifies that credentials and settings allow network requests.
    ///
    /// Called before any I/O when network access is allowed.
    fn check_ready(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Fetches and decodes the root tileset document.
    fn fetch_root_tileset(&self) -> Result<Tileset, ProviderError>;

    /// Fetches and decodes a nested tileset document.
    fn fetch_sub_tileset(&self, uri: &str) -> Result<Tileset, ProviderError>;

    /// Asks for the content size without downloading it.
    ///
    /// `Ok(None)` means the server did not report a size.
    fn probe_content_size(&self, uri: &str) -> Result<Option<u64>, ProviderError>;

    /// Makes the content available as a file under `cache_dir`.
    ///
    /// Already-cached files are returned without a network request. With
    /// `allow_network` false an uncached file fails with
    /// [`ProviderError::NotCached`].
    fn fetch_tile_content(
        &self,
        uri: &str,
        cache_dir: &Path,
        allow_network: bool,
    ) -> Result<FetchedContent, ProviderError>;
}
