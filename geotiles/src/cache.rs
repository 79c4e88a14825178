//! Cache directory inspection and cleanup.
//!
//! Only files this crate writes are counted or deleted: manifests, tile
//! files named by [`cache_file_name`](crate::provider::cache_file_name),
//! files listed in a loadable manifest, and temporaries left by
//! interrupted writes. Anything else in the directory is left alone.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::manifest::{is_manifest_file_name, is_manifest_temp_name, Manifest, ManifestStore};
use crate::provider::is_cache_file_name;

/// Counts of what a cache directory holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub manifests: usize,
    pub tile_files: usize,
    pub bytes: u64,
}

/// Outcome of clearing a cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub files_deleted: usize,
    pub bytes_freed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheFile {
    Manifest,
    Tile,
    Leftover,
}

/// Regular files in `dir` that belong to the cache, with their sizes.
fn owned_files(dir: &Path) -> io::Result<Vec<(PathBuf, CacheFile, u64)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let listed: HashSet<String> = cached_manifests(dir)
        .into_iter()
        .flat_map(|(_, manifest)| manifest.files.into_iter().map(|f| f.name))
        .collect();

    let mut owned = Vec::new();
    for entry in entries {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let kind = if is_manifest_file_name(&name) {
            CacheFile::Manifest
        } else if is_cache_file_name(&name) || listed.contains(&name) {
            CacheFile::Tile
        } else if is_manifest_temp_name(&name) {
            CacheFile::Leftover
        } else {
            debug!(file = %name, "Ignoring file not written by the cache");
            continue;
        };
        owned.push((entry.path(), kind, meta.len()));
    }
    Ok(owned)
}

/// Tallies the cache files in `dir`. A missing directory is empty.
pub fn cache_stats(dir: &Path) -> io::Result<CacheStats> {
    let mut stats = CacheStats::default();
    for (_, kind, len) in owned_files(dir)? {
        stats.bytes += len;
        match kind {
            CacheFile::Manifest => stats.manifests += 1,
            CacheFile::Tile => stats.tile_files += 1,
            CacheFile::Leftover => {}
        }
    }
    Ok(stats)
}

/// Deletes the cache files in `dir`, leaving the directory and any
/// unrelated files in place.
pub fn clear_cache(dir: &Path) -> io::Result<ClearResult> {
    let mut result = ClearResult::default();
    for (path, _, len) in owned_files(dir)? {
        fs::remove_file(&path)?;
        result.files_deleted += 1;
        result.bytes_freed += len;
    }
    Ok(result)
}

/// Loadable manifests in `dir`, paired with their file names.
///
/// Unreadable manifests are skipped.
pub fn cached_manifests(dir: &Path) -> Vec<(String, Manifest)> {
    let store = ManifestStore::new(dir);
    let Ok(paths) = store.list() else {
        return Vec::new();
    };

    paths
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            let manifest = ManifestStore::load_path(&path).ok()??;
            Some((name, manifest))
        })
        .collect()
}
