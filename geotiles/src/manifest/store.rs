//! Manifest persistence in the cache directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{Manifest, ManifestError};

const MANIFEST_PREFIX: &str = "manifest_";
const MANIFEST_EXTENSION: &str = "json";

const TEMP_EXTENSION: &str = "tmp";

/// File name of the manifest for `fingerprint`.
pub fn manifest_file_name(fingerprint: &str) -> String {
    format!(
        "{}{}.{}",
        MANIFEST_PREFIX,
        fingerprint.to_ascii_lowercase(),
        MANIFEST_EXTENSION
    )
}

/// Whether `name` looks like a manifest file name.
pub fn is_manifest_file_name(name: &str) -> bool {
    name.starts_with(MANIFEST_PREFIX) && name.ends_with(&format!(".{}", MANIFEST_EXTENSION))
}

/// Whether `name` is a manifest write left behind by an interrupted save.
pub fn is_manifest_temp_name(name: &str) -> bool {
    name.starts_with(MANIFEST_PREFIX) && name.ends_with(&format!(".{}", TEMP_EXTENSION))
}

/// Manifests stored alongside tile files in one cache directory.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(manifest_file_name(fingerprint))
    }

    /// Loads the manifest for `fingerprint`.
    ///
    /// Returns `Ok(None)` when no manifest exists.
    pub fn load(&self, fingerprint: &str) -> Result<Option<Manifest>, ManifestError> {
        Self::load_path(&self.path_for(fingerprint))
    }

    /// Loads a manifest from an explicit path.
    pub fn load_path(path: &Path) -> Result<Option<Manifest>, ManifestError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ManifestError::Io {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ManifestError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Writes the manifest for `fingerprint`, replacing any previous one.
    pub fn save(&self, fingerprint: &str, manifest: &Manifest) -> Result<PathBuf, ManifestError> {
        let path = self.path_for(fingerprint);
        let io_err = |path: &Path, e: std::io::Error| ManifestError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;

        let json = serde_json::to_string_pretty(manifest).map_err(|e| ManifestError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension(TEMP_EXTENSION);
        fs::write(&temp_path, json).map_err(|e| io_err(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| io_err(&path, e))?;

        debug!(path = %path.display(), files = manifest.files.len(), "Saved manifest");
        Ok(path)
    }

    /// Absolute paths of the files a manifest lists.
    pub fn file_paths(&self, manifest: &Manifest) -> Vec<PathBuf> {
        manifest.files.iter().map(|f| self.dir.join(&f.name)).collect()
    }

    /// Names of listed files that no longer exist.
    pub fn missing_files(&self, manifest: &Manifest) -> Vec<String> {
        manifest
            .files
            .iter()
            .filter(|f| !self.dir.join(&f.name).is_file())
            .map(|f| f.name.clone())
            .collect()
    }

    /// Paths of all manifest files in the directory, sorted.
    pub fn list(&self) -> Result<Vec<PathBuf>, ManifestError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ManifestError::Io {
                    path: self.dir.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_manifest_file_name)
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}
