//! Binary glTF (GLB) header importer.
//!
//! Reads only the JSON chunk of each file: enough to count meshes and
//! materials and to collect the copyright notices used for attribution.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{ImportError, ImportFailure, ImportedFile, ImportedScene, MeshImporter};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;

/// Per-file decode failures.
#[derive(Debug, Error)]
pub enum GlbError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a GLB file")]
    BadMagic,

    #[error("unsupported GLB version {0}")]
    UnsupportedVersion(u32),

    #[error("file truncated")]
    Truncated,

    #[error("first chunk is not JSON")]
    MissingJsonChunk,

    #[error("invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct RawAsset {
    #[serde(default)]
    copyright: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGltf {
    #[serde(default)]
    asset: RawAsset,
    #[serde(default)]
    meshes: Vec<serde_json::Value>,
    #[serde(default)]
    materials: Vec<serde_json::Value>,
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, GlbError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(GlbError::Truncated)
}

fn parse_glb(bytes: &[u8]) -> Result<RawGltf, GlbError> {
    if bytes.len() < HEADER_LEN {
        return Err(GlbError::Truncated);
    }
    if &bytes[..4] != GLB_MAGIC {
        return Err(GlbError::BadMagic);
    }
    let version = read_u32(bytes, 4)?;
    if version != GLB_VERSION {
        return Err(GlbError::UnsupportedVersion(version));
    }

    let chunk_len = read_u32(bytes, HEADER_LEN)? as usize;
    if read_u32(bytes, HEADER_LEN + 4)? != CHUNK_TYPE_JSON {
        return Err(GlbError::MissingJsonChunk);
    }
    let start = HEADER_LEN + CHUNK_HEADER_LEN;
    let json = bytes
        .get(start..start + chunk_len)
        .ok_or(GlbError::Truncated)?;

    Ok(serde_json::from_slice(json)?)
}

/// Reads a single GLB file.
pub fn read_glb(path: &Path) -> Result<ImportedFile, GlbError> {
    let bytes = fs::read(path)?;
    let gltf = parse_glb(&bytes)?;

    Ok(ImportedFile {
        path: path.to_path_buf(),
        meshes: gltf.meshes.len(),
        materials: gltf.materials.len(),
        copyright: gltf.asset.copyright.filter(|c| !c.trim().is_empty()),
    })
}

/// Builds an attribution line from per-file copyright notices.
///
/// Notices are split on `;`, holders ordered by how many files credit
/// them (ties alphabetical) and joined with `"; "`.
pub fn build_attribution<'a>(notices: impl IntoIterator<Item = &'a str>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for notice in notices {
        for holder in notice.split(';').map(str::trim).filter(|h| !h.is_empty()) {
            *counts.entry(holder).or_default() += 1;
        }
    }

    let mut holders: Vec<(&str, usize)> = counts.into_iter().collect();
    holders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    holders
        .into_iter()
        .map(|(holder, _)| holder)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Importer for GLB tile files.
#[derive(Debug, Default)]
pub struct GlbImporter;

impl GlbImporter {
    pub fn new() -> Self {
        Self
    }
}

impl MeshImporter for GlbImporter {
    fn import(&self, files: &[PathBuf]) -> Result<ImportedScene, ImportError> {
        let mut scene = ImportedScene::default();

        for path in files {
            match read_glb(path) {
                Ok(file) => {
                    scene.meshes += file.meshes;
                    scene.materials += file.materials;
                    scene.files.push(file);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable tile file");
                    scene.failures.push(ImportFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if scene.files.is_empty() {
            if let Some(first) = scene.failures.first() {
                return Err(ImportError::NothingImported {
                    count: files.len(),
                    path: first.path.clone(),
                    reason: first.reason.clone(),
                });
            }
        }

        scene.attribution =
            build_attribution(scene.files.iter().filter_map(|f| f.copyright.as_deref()));
        debug!(
            files = scene.files.len(),
            meshes = scene.meshes,
            materials = scene.materials,
            "Imported tile files"
        );
        Ok(scene)
    }
}

/// Builds a minimal GLB container around a JSON document.
#[cfg(any(test, feature = "test-util"))]
pub fn glb_bytes(json: &str) -> Vec<u8> {
    let mut chunk = json.as_bytes().to_vec();
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }
    let total = HEADER_LEN + CHUNK_HEADER_LEN + chunk.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    out.extend_from_slice(&chunk);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_reads_counts_and_copyright() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "a.glb",
            &glb_bytes(r#"{"asset":{"version":"2.0","copyright":"Data SIO;Google"},"meshes":[{},{}],"materials":[{}]}"#),
        );

        let file = read_glb(&path).unwrap();

        assert_eq!(file.meshes, 2);
        assert_eq!(file.materials, 1);
        assert_eq!(file.copyright.as_deref(), Some("Data SIO;Google"));
    }

    #[test]
    fn test_rejects_non_glb() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "bad.glb", b"PK\x03\x04 definitely not gltf");
        assert!(matches!(read_glb(&path), Err(GlbError::BadMagic)));

        let short = write(&temp, "short.glb", b"glTF");
        assert!(matches!(read_glb(&short), Err(GlbError::Truncated)));
    }

    #[test]
    fn test_attribution_ordered_by_frequency() {
        let attribution = build_attribution([
            "Google; Landsat",
            "Google;Airbus",
            "Airbus ; Google",
            "Landsat",
        ]);
        assert_eq!(attribution, "Google; Airbus; Landsat");
        assert_eq!(build_attribution(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_import_tolerates_partial_failure() {
        let temp = TempDir::new().unwrap();
        let good = write(&temp, "good.glb", &glb_bytes(r#"{"asset":{"copyright":"Google"},"meshes":[{}]}"#));
        let bad = write(&temp, "bad.glb", b"garbage-garbage");

        let scene = GlbImporter::new().import(&[good, bad]).unwrap();

        assert_eq!(scene.files.len(), 1);
        assert_eq!(scene.failures.len(), 1);
        assert_eq!(scene.meshes, 1);
        assert_eq!(scene.attribution, "Google");
    }

    #[test]
    fn test_import_fails_when_nothing_readable() {
        let temp = TempDir::new().unwrap();
        let bad = write(&temp, "bad.glb", b"garbage-garbage");

        let err = GlbImporter::new().import(&[bad]).unwrap_err();

        assert!(matches!(err, ImportError::NothingImported { count: 1, .. }));
    }
}
