//! Tileset service abstraction
//!
//! This module provides the trait through which the planner and the
//! downloader reach a remote 3D tileset service, an HTTP client
//! abstraction, and the Google Photorealistic 3D Tiles implementation.
//!
//! ```ignore
//! use geotiles::provider::{GoogleTilesService, ReqwestClient};
//!
//! let http_client = ReqwestClient::with_timeout(30)?;
//! let service = GoogleTilesService::new(http_client, api_key);
//! ```

mod google;
mod http;
mod types;

pub use google::{cache_file_name, is_cache_file_name, GoogleTilesService, GOOGLE_TILES_ROOT};
pub use http::{redact_url, HttpClient, ReqwestClient};
pub use types::{FetchedContent, ProviderError, TilesetService};

#[cfg(test)]
pub use http::tests::MockHttpClient;
