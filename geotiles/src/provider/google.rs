//! Google Photorealistic 3D Tiles service.
//!
//! Uses the Map Tiles API with an API key supplied by the user.
//!
//! # API Endpoints
//!
//! - Root document: `https://tile.googleapis.com/v1/3dtiles/root.json?key={API_KEY}`
//! - Nested documents and mesh tiles are referenced from the root with
//!   paths relative to it, carrying a `session` query parameter that must
//!   be echoed on every later request of the same walk.
//!
//! # Caching
//!
//! Tile content is stored in the caller's cache directory under a name
//! derived from the URI with its credential and session parameters
//! removed, so the same tile maps to the same file across sessions.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use reqwest::Url;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use super::http::{redact_url, HttpClient};
use super::types::{FetchedContent, ProviderError, TilesetService};
use crate::tileset::{decode_tileset, uri, Tileset};

/// Default root document of the Photorealistic 3D Tiles dataset.
pub const GOOGLE_TILES_ROOT: &str = "https://tile.googleapis.com/v1/3dtiles/root.json";

/// Hex digits of the SHA-256 kept in cache file names.
const CACHE_NAME_HEX_LEN: usize = 32;

/// Extension used when a content URI has none.
const DEFAULT_CONTENT_EXTENSION: &str = "glb";

/// Google Photorealistic 3D Tiles service.
///
/// Requires a valid Google Maps Platform API key with the Map Tiles API
/// enabled.
///
/// # Example
///
/// ```no_run
/// use geotiles::provider::{GoogleTilesService, ReqwestClient, TilesetService};
///
/// let client = ReqwestClient::new().unwrap();
/// let service = GoogleTilesService::new(client, "YOUR_API_KEY".to_string());
/// let root = service.fetch_root_tileset().unwrap();
/// ```
pub struct GoogleTilesService<C: HttpClient> {
    http_client: C,
    api_key: String,
    root_url: String,
    session: Mutex<Option<String>>,
}

impl<C: HttpClient> GoogleTilesService<C> {
    /// Creates a service for the default dataset root.
    pub fn new(http_client: C, api_key: String) -> Self {
        Self {
            http_client,
            api_key,
            root_url: GOOGLE_TILES_ROOT.to_string(),
            session: Mutex::new(None),
        }
    }

    /// Overrides the root document URL (e.g. for a proxy or mirror).
    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = root_url.into();
        self
    }

    /// The root document URL.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// The session token learned from the dataset, if any.
    pub fn session(&self) -> Option<String> {
        self.session.lock().clone()
    }

    /// Builds the request URL: resolves against the root, records or
    /// echoes the session token, and appends the API key.
    fn build_url(&self, target: &str) -> Result<String, ProviderError> {
        let resolved = uri::resolve(&self.root_url, target);
        let mut url = Url::parse(&resolved).map_err(|e| ProviderError::InvalidUri(format!("{}: {}", target, e)))?;

        let session = url
            .query_pairs()
            .find(|(k, _)| k == "session")
            .map(|(_, v)| v.into_owned());
        let has_key = url.query_pairs().any(|(k, _)| k == "key");

        match session {
            Some(token) => {
                let mut learned = self.session.lock();
                if learned.as_deref() != Some(token.as_str()) {
                    debug!("Tileset session established");
                    *learned = Some(token);
                }
            }
            None => {
                if let Some(token) = self.session.lock().as_deref() {
                    url.query_pairs_mut().append_pair("session", token);
                }
            }
        }

        if !has_key {
            url.query_pairs_mut().append_pair("key", &self.api_key);
        }

        Ok(url.to_string())
    }

    fn fetch_document(&self, target: &str) -> Result<Tileset, ProviderError> {
        let url = self.build_url(target)?;
        trace!(url = %redact_url(&url), "Fetching tileset document");

        let body = self.http_client.get(&url)?;
        let location = uri::resolve(&self.root_url, target);

        decode_tileset(&location, &body).map_err(|e| ProviderError::Decode {
            uri: redact_url(&location),
            reason: e.to_string(),
        })
    }
}

impl<C: HttpClient> TilesetService for GoogleTilesService<C> {
    fn check_ready(&self) -> Result<(), ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredentials(
                "Google Map Tiles API key is not set. \
                 Set api_key in config.ini or use --api-key"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn fetch_root_tileset(&self) -> Result<Tileset, ProviderError> {
        self.fetch_document(&self.root_url)
    }

    fn fetch_sub_tileset(&self, uri: &str) -> Result<Tileset, ProviderError> {
        self.fetch_document(uri)
    }

    fn probe_content_size(&self, uri: &str) -> Result<Option<u64>, ProviderError> {
        let url = self.build_url(uri)?;
        self.http_client.content_length(&url)
    }

    fn fetch_tile_content(
        &self,
        uri: &str,
        cache_dir: &Path,
        allow_network: bool,
    ) -> Result<FetchedContent, ProviderError> {
        let path = cache_dir.join(cache_file_name(uri));

        if let Ok(metadata) = fs::metadata(&path) {
            if metadata.is_file() {
                trace!(path = %path.display(), "Tile served from cache");
                return Ok(FetchedContent {
                    path,
                    bytes: metadata.len(),
                    from_cache: true,
                });
            }
        }

        if !allow_network {
            return Err(ProviderError::NotCached(redact_url(uri)));
        }

        let url = self.build_url(uri)?;
        let body = self.http_client.get(&url)?;
        write_atomic(&path, &body)?;

        Ok(FetchedContent {
            path,
            bytes: body.len() as u64,
            from_cache: false,
        })
    }
}

/// Deterministic cache file name for a content URI.
///
/// Credentials and the session token are removed before hashing so the
/// name is stable across API keys and sessions.
pub fn cache_file_name(content_uri: &str) -> String {
    let identity = match Url::parse(content_uri) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "key" && k != "session")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.set_query(None);
            if !kept.is_empty() {
                url.query_pairs_mut().extend_pairs(kept);
            }
            url.to_string()
        }
        Err(_) => content_uri.to_string(),
    };

    let digest = format!("{:x}", Sha256::digest(identity.as_bytes()));
    let ext = uri::extension(content_uri).unwrap_or_else(|| DEFAULT_CONTENT_EXTENSION.to_string());
    format!("{}.{}", &digest[..CACHE_NAME_HEX_LEN], ext)
}

/// Whether `name` has the shape produced by [`cache_file_name`].
///
/// Interrupted downloads leave `<digest>.part` behind, which also matches.
pub fn is_cache_file_name(name: &str) -> bool {
    let Some((stem, ext)) = name.split_once('.') else {
        return false;
    };
    stem.len() == CACHE_NAME_HEX_LEN
        && stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && !ext.is_empty()
        && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Writes to a temporary sibling first, then renames into place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ProviderError> {
    let io_err = |p: &Path, e: std::io::Error| ProviderError::Io {
        path: p.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let temp_path: PathBuf = path.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(|e| io_err(&temp_path, e))?;
    file.write_all(data).map_err(|e| io_err(&temp_path, e))?;
    file.sync_all().map_err(|e| io_err(&temp_path, e))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| io_err(path, e))
}
