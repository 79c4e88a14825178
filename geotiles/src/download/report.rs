//! Download results.

use std::path::PathBuf;

/// A tile realized as a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedTile {
    pub uri: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub from_cache: bool,
}

/// A tile whose fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFailure {
    pub uri: String,
    pub reason: String,
}

/// Outcome of realizing a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Obtained files in plan order.
    pub files: Vec<DownloadedTile>,
    /// Bytes of all obtained files.
    pub total_bytes: u64,
    /// Tiles dropped because of the byte cap.
    pub skipped_for_cap: usize,
    /// Tiles whose fetch failed.
    pub failed: usize,
    /// Files served from the local cache.
    pub cache_hits: usize,
    /// Earliest failure in plan order.
    pub first_failure: Option<TileFailure>,
    /// Tiles never attempted because of cancellation or a stop on overflow.
    pub not_attempted: usize,
}

impl DownloadReport {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// One-line summary for diagnostics.
    pub fn summary(&self) -> String {
        format!(
            "{} files ({} from cache), {} bytes, {} skipped for budget, {} failed",
            self.files.len(),
            self.cache_hits,
            self.total_bytes,
            self.skipped_for_cap,
            self.failed
        )
    }
}
