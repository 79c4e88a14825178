//! Persisted manifest record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geodesy::{GeodeticBox, ModelBox};

/// Schema written by this crate; adds the geodetic box, detail level and
/// vertex fingerprint to the model-box-only version 1.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// First schema version that carries geodetic validation data.
pub const GEODETIC_SCHEMA_VERSION: u32 = 2;

/// Errors reading or writing manifest files.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest I/O error at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("corrupt manifest {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// One cached tile file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the cache directory.
    pub name: String,
    pub size: u64,
}

/// Record of a completed download for one area fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,

    /// Requested maximum depth. Absent in version 1.
    #[serde(default)]
    pub lod: u32,

    pub model_box: ModelBox,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geodetic_box: Option<GeodeticBox>,

    /// Area vertex fingerprint. Absent in version 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoi_hash: Option<String>,

    #[serde(default)]
    pub attribution: String,

    /// RFC 3339 generation time.
    #[serde(default)]
    pub generated_at: String,

    #[serde(default)]
    pub files: Vec<ManifestEntry>,
}

fn legacy_schema_version() -> u32 {
    1
}

impl Manifest {
    /// Creates a current-schema manifest stamped with the local time.
    pub fn new(
        lod: u32,
        model_box: ModelBox,
        geodetic_box: Option<GeodeticBox>,
        aoi_hash: String,
        attribution: String,
        files: Vec<ManifestEntry>,
    ) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            lod,
            model_box,
            geodetic_box,
            aoi_hash: Some(aoi_hash),
            attribution,
            generated_at: chrono::Local::now().to_rfc3339(),
            files,
        }
    }

    /// Total bytes of the listed files.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Whether this manifest carries geodetic validation data.
    pub fn is_geodetic(&self) -> bool {
        self.schema_version >= GEODETIC_SCHEMA_VERSION
    }
}
