//! Tile downloader and cache manager
//!
//! Turns a tile plan into local files while respecting a byte budget,
//! tolerating individual fetch failures and reusing the local cache.
//!
//! # Architecture
//!
//! ```text
//! TileDownloader
//!         │
//!         ├── FetchStrategy (trait)
//!         │       ├── SequentialStrategy
//!         │       └── ParallelStrategy
//!         │
//!         ├── DownloadBudget (serialized byte accounting)
//!         │
//!         └── DownloadReport (files, skips, failures)
//! ```

mod budget;
mod cancel;
mod downloader;
mod error;
mod policy;
mod report;
mod strategy;

pub use budget::DownloadBudget;
pub use cancel::CancelToken;
pub use downloader::TileDownloader;
pub use error::DownloadError;
pub use policy::{DownloadPolicy, OverflowPolicy, DEFAULT_PROBE_THRESHOLD};
pub use report::{DownloadReport, DownloadedTile, TileFailure};
pub use strategy::{FetchContext, FetchStrategy, ParallelStrategy, SequentialStrategy, TileOutcome};
