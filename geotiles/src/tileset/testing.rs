//! Fixture builders and an in-memory tileset service for tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use super::types::{BoundingVolume, Refine, Region, TileContent, TileNode, Tileset};
use super::uri::{is_tileset_document, strip_query};
use crate::provider::{FetchedContent, ProviderError, TilesetService};

/// A region bounding volume from degrees.
pub fn region(west: f64, south: f64, east: f64, north: f64) -> BoundingVolume {
    BoundingVolume::Region(Region::from_degrees(west, south, east, north))
}

fn content(uri: &str) -> TileContent {
    if is_tileset_document(uri) {
        TileContent::External {
            uri: uri.to_string(),
        }
    } else {
        TileContent::Mesh {
            uri: uri.to_string(),
        }
    }
}

/// A childless node with content.
pub fn leaf(volume: BoundingVolume, uri: &str) -> TileNode {
    TileNode {
        bounding_volume: Some(volume),
        geometric_error: 0.0,
        refine: None,
        content: Some(content(uri)),
        children: Vec::new(),
    }
}

/// An interior node.
pub fn node(
    volume: BoundingVolume,
    refine: Option<Refine>,
    uri: Option<&str>,
    children: Vec<TileNode>,
) -> TileNode {
    TileNode {
        bounding_volume: Some(volume),
        geometric_error: 1.0,
        refine,
        content: uri.map(content),
        children,
    }
}

/// A tileset service backed by in-memory documents and tile bodies.
///
/// Unknown tiles answer 404; sizes of known tiles are probe-able. Tiles
/// are written to the given cache directory like a real service would.
#[derive(Default)]
pub struct InMemoryService {
    pub root: Option<Tileset>,
    pub tilesets: HashMap<String, Tileset>,
    pub tiles: HashMap<String, Vec<u8>>,
    /// Whether size probes report a size.
    pub probe_sizes: bool,
    /// Error returned by `check_ready`, if any.
    pub ready_error: Option<ProviderError>,
    pub fetches: Mutex<Vec<String>>,
    pub probes: Mutex<Vec<String>>,
}

impl InMemoryService {
    pub fn with_root(mut self, root: Tileset) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_tileset(mut self, tileset: Tileset) -> Self {
        self.tilesets
            .insert(strip_query(&tileset.uri).to_string(), tileset);
        self
    }

    pub fn with_tile(mut self, uri: &str, size: usize) -> Self {
        self.tiles.insert(uri.to_string(), vec![0u8; size]);
        self
    }

    pub fn with_tile_bytes(mut self, uri: &str, body: Vec<u8>) -> Self {
        self.tiles.insert(uri.to_string(), body);
        self
    }

    pub fn with_ready_error(mut self, error: ProviderError) -> Self {
        self.ready_error = Some(error);
        self
    }

    pub fn with_probes(mut self) -> Self {
        self.probe_sizes = true;
        self
    }

    /// Number of document and tile fetch calls made.
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().len()
    }
}

impl TilesetService for InMemoryService {
    fn check_ready(&self) -> Result<(), ProviderError> {
        match &self.ready_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn fetch_root_tileset(&self) -> Result<Tileset, ProviderError> {
        self.fetches.lock().push("<root>".to_string());
        self.root.clone().ok_or_else(|| ProviderError::Status {
            status: 404,
            url: "<root>".to_string(),
        })
    }

    fn fetch_sub_tileset(&self, uri: &str) -> Result<Tileset, ProviderError> {
        self.fetches.lock().push(uri.to_string());
        self.tilesets
            .get(strip_query(uri))
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                url: uri.to_string(),
            })
    }

    fn probe_content_size(&self, uri: &str) -> Result<Option<u64>, ProviderError> {
        self.probes.lock().push(uri.to_string());
        if !self.probe_sizes {
            return Ok(None);
        }
        Ok(self.tiles.get(uri).map(|body| body.len() as u64))
    }

    fn fetch_tile_content(
        &self,
        uri: &str,
        cache_dir: &Path,
        allow_network: bool,
    ) -> Result<FetchedContent, ProviderError> {
        let path = cache_dir.join(crate::provider::cache_file_name(uri));
        if let Ok(meta) = fs::metadata(&path) {
            return Ok(FetchedContent {
                path,
                bytes: meta.len(),
                from_cache: true,
            });
        }
        if !allow_network {
            return Err(ProviderError::NotCached(uri.to_string()));
        }

        self.fetches.lock().push(uri.to_string());
        let body = self.tiles.get(uri).ok_or_else(|| ProviderError::Status {
            status: 404,
            url: uri.to_string(),
        })?;
        fs::create_dir_all(cache_dir).map_err(|e| ProviderError::Io {
            path: cache_dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(&path, body).map_err(|e| ProviderError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Ok(FetchedContent {
            path,
            bytes: body.len() as u64,
            from_cache: false,
        })
    }
}
