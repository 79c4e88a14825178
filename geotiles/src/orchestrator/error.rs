//! Fatal operation errors

use thiserror::Error;

use crate::aoi::AoiError;
use crate::download::DownloadError;
use crate::importer::ImportError;
use crate::provider::ProviderError;

/// Conditions that abort an area fetch.
///
/// Everything recoverable is reported through the outcome's diagnostics
/// instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("invalid boundary: {0}")]
    Boundary(#[from] AoiError),

    #[error("tileset service not ready: {0}")]
    Service(#[from] ProviderError),

    #[error("failed to fetch root tileset: {0}")]
    RootTileset(#[source] ProviderError),

    #[error("no usable cached manifest for area {fingerprint} and network access is disabled")]
    OfflineCacheMiss { fingerprint: String },

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Import(#[from] ImportError),
}
