//! GeoTiles - area-bounded 3D tiles download and caching
//!
//! Plans the tiles of a remote 3D tileset that cover an area of interest,
//! downloads them within a byte budget into a local cache, and records a
//! manifest so identical later requests are served from disk.
//!
//! # Example
//!
//! ```ignore
//! use geotiles::importer::GlbImporter;
//! use geotiles::orchestrator::{AreaFetcher, FetchRequest};
//! use geotiles::provider::{GoogleTilesService, ReqwestClient};
//!
//! let service = GoogleTilesService::new(ReqwestClient::new()?, api_key);
//! let importer = GlbImporter::new();
//! let request = FetchRequest::new(boundary, cache_dir).with_anchor(anchor);
//! let outcome = AreaFetcher::new(&service, &importer).fetch(&request)?;
//! ```

pub mod aoi;
pub mod cache;
pub mod config;
pub mod download;
pub mod geodesy;
pub mod importer;
pub mod logging;
pub mod manifest;
pub mod orchestrator;
pub mod provider;
pub mod tileset;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
